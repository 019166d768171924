//! Frame clock and loop cancellation
//!
//! The host calls into the game once per display frame. The clock turns raw
//! frame timestamps into a smoothed, clamped step size.

use crate::consts::{DELTA_SMOOTHING, INITIAL_SMOOTH_DELTA_MS, MAX_FRAME_DELTA_MS};

/// What the host should do after a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    /// Schedule the next frame
    Continue,
    /// The session ended; stop scheduling
    Stop,
}

/// Exponentially smoothed frame delta
#[derive(Debug, Clone)]
pub struct FrameClock {
    last_frame: Option<f64>,
    smooth_delta: f32,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            last_frame: None,
            smooth_delta: INITIAL_SMOOTH_DELTA_MS,
        }
    }

    /// Feed a frame timestamp (ms), returning the step to simulate (ms)
    ///
    /// The first frame after a reset steps by the initial smoothed delta.
    pub fn tick(&mut self, now: f64) -> f32 {
        let raw = match self.last_frame {
            Some(last) => (now - last).max(0.0) as f32,
            None => INITIAL_SMOOTH_DELTA_MS,
        };
        self.last_frame = Some(now);
        self.smooth_delta = self.smooth_delta * DELTA_SMOOTHING + raw * (1.0 - DELTA_SMOOTHING);
        self.smooth_delta.min(MAX_FRAME_DELTA_MS)
    }

    /// Forget the last timestamp so a resumed loop doesn't see the gap
    pub fn reset(&mut self) {
        self.last_frame = None;
        self.smooth_delta = INITIAL_SMOOTH_DELTA_MS;
    }

    pub fn smooth_delta(&self) -> f32 {
        self.smooth_delta
    }
}

/// Generation counter that keeps at most one frame loop alive
///
/// Each `start` hands out a new generation. A scheduled frame checks
/// `is_current` before running its body, so frames scheduled by a stopped
/// loop fall through without effect.
#[derive(Debug, Clone, Default)]
pub struct LoopGuard {
    generation: u64,
    running: bool,
}

impl LoopGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a new loop, invalidating any previous one
    pub fn start(&mut self) -> u64 {
        self.generation += 1;
        self.running = true;
        self.generation
    }

    /// Cancel the current loop. Idempotent.
    pub fn stop(&mut self) {
        if self.running {
            self.running = false;
            self.generation += 1;
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.running && self.generation == generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoothing_converges() {
        let mut clock = FrameClock::new();
        let mut now = 0.0;
        clock.tick(now);
        for _ in 0..200 {
            now += 33.0;
            clock.tick(now);
        }
        assert!((clock.smooth_delta() - 33.0).abs() < 0.1);
    }

    #[test]
    fn test_large_gap_is_clamped() {
        let mut clock = FrameClock::new();
        clock.tick(0.0);
        // Tab was suspended for ten seconds
        let dt = clock.tick(10_000.0);
        assert_eq!(dt, MAX_FRAME_DELTA_MS);
        // Raw smoothing state keeps the spike; only the used delta is clamped
        assert!(clock.smooth_delta() > MAX_FRAME_DELTA_MS);
    }

    #[test]
    fn test_single_jittery_frame_is_damped() {
        let mut clock = FrameClock::new();
        clock.tick(0.0);
        let dt = clock.tick(30.0);
        assert!(dt < 18.1);
    }

    #[test]
    fn test_guard_invalidates_old_generation() {
        let mut guard = LoopGuard::new();
        let first = guard.start();
        assert!(guard.is_current(first));
        let second = guard.start();
        assert!(!guard.is_current(first));
        assert!(guard.is_current(second));

        guard.stop();
        guard.stop();
        assert!(!guard.is_current(second));
        assert!(!guard.is_running());
    }
}
