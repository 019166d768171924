//! Expiring timers advanced by the simulation clock

use serde::{Deserialize, Serialize};

/// Countdown in milliseconds of simulated time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timer {
    duration_ms: f32,
    remaining_ms: f32,
}

impl Timer {
    pub fn new(duration_ms: f32) -> Self {
        Self {
            duration_ms,
            remaining_ms: duration_ms,
        }
    }

    pub fn remaining(&self) -> f32 {
        self.remaining_ms.max(0.0)
    }

    pub fn elapsed(&self) -> f32 {
        self.duration_ms - self.remaining()
    }

    pub fn is_expired(&self) -> bool {
        self.remaining_ms <= 0.0
    }

    /// Count down by `dt_ms`. Returns true on the call that expires the timer.
    pub fn advance(&mut self, dt_ms: f32) -> bool {
        if self.is_expired() {
            return false;
        }
        self.remaining_ms -= dt_ms;
        self.is_expired()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expires_exactly_at_duration() {
        let mut timer = Timer::new(5000.0);
        for _ in 0..499 {
            assert!(!timer.advance(10.0));
        }
        assert!(!timer.is_expired());
        assert_eq!(timer.remaining(), 10.0);
        assert!(timer.advance(10.0));
        assert!(timer.is_expired());
        // Only reports expiry once
        assert!(!timer.advance(10.0));
    }

    #[test]
    fn test_elapsed() {
        let mut timer = Timer::new(300.0);
        timer.advance(120.0);
        assert_eq!(timer.elapsed(), 120.0);
        timer.advance(500.0);
        assert_eq!(timer.elapsed(), 300.0);
    }
}
