//! Collision detection and damage resolution
//!
//! Everything on screen is an axis-aligned box. Boxes are shrunk by a small
//! padding before testing so grazing contact at sprite edges doesn't count.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::event::{Announcement, GameEvent, HapticPattern, SoundCue};
use super::state::GameState;

/// Axis-aligned rectangle, y up
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    /// Rectangle from its bottom-left corner and size
    pub fn new(left: f32, bottom: f32, width: f32, height: f32) -> Self {
        Self {
            min: Vec2::new(left, bottom),
            max: Vec2::new(left + width, bottom + height),
        }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Shrink by `padding` on every side
    pub fn inset(&self, padding: f32) -> Self {
        Self {
            min: self.min + Vec2::splat(padding),
            max: self.max - Vec2::splat(padding),
        }
    }
}

/// Anything that occupies a box in the play area
pub trait Body {
    fn rect(&self) -> Rect;
}

/// Test two boxes for overlap after insetting both by `padding`
///
/// Touching edges count as overlap.
pub fn overlaps(a: &Rect, b: &Rect, padding: f32) -> bool {
    let a = a.inset(padding);
    let b = b.inset(padding);
    !(a.max.x < b.min.x || a.min.x > b.max.x || a.max.y < b.min.y || a.min.y > b.max.y)
}

/// Result of a damage application
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DamageOutcome {
    /// Player was shielded (invulnerable, powered up, or not in play)
    Ignored,
    /// Lives were lost and the invulnerability window started
    Wounded { lives: f32 },
    /// Lives ran out and the run ended
    Fatal,
}

/// Apply damage to the player
///
/// Damage while invulnerable or powered up is dropped, not queued. A hit that
/// leaves lives above zero opens the invulnerability window.
pub fn apply_damage(state: &mut GameState, amount: f32, out: &mut Vec<GameEvent>) -> DamageOutcome {
    if !state.is_running() || state.is_invulnerable() || state.is_powered_up() {
        return DamageOutcome::Ignored;
    }

    let lives = state.lose_lives(amount);
    out.push(GameEvent::Sound(SoundCue::Hit));
    out.push(GameEvent::Haptic(HapticPattern::Collision));
    out.push(GameEvent::Announce(Announcement::Lives {
        lives,
        gained: false,
    }));

    if lives <= 0.0 {
        state.end(out);
        return DamageOutcome::Fatal;
    }

    state.start_invulnerability();
    DamageOutcome::Wounded { lives }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::INVULNERABILITY_DURATION_MS;
    use crate::sim::stage::StageConfig;
    use crate::sim::assets::AssetManifest;
    use crate::sim::state::GamePhase;
    use proptest::prelude::*;

    fn running_state() -> GameState {
        let mut state = GameState::default();
        let config = StageConfig::for_stage(1, &AssetManifest::all());
        assert!(state.begin(&config, &mut Vec::new()));
        state
    }

    #[test]
    fn test_overlap_basic() {
        let a = Rect::new(0.0, 0.0, 80.0, 60.0);
        let b = Rect::new(50.0, 30.0, 80.0, 80.0);
        assert!(overlaps(&a, &b, 4.0));

        let far = Rect::new(200.0, 200.0, 10.0, 10.0);
        assert!(!overlaps(&a, &far, 4.0));
    }

    #[test]
    fn test_padding_ignores_grazing_contact() {
        let a = Rect::new(0.0, 0.0, 80.0, 60.0);
        // Overlaps by 5px horizontally, less than the combined 8px inset
        let b = Rect::new(75.0, 0.0, 80.0, 60.0);
        assert!(overlaps(&a, &b, 0.0));
        assert!(!overlaps(&a, &b, 4.0));
    }

    #[test]
    fn test_damage_opens_invulnerability_window() {
        let mut state = running_state();
        let mut out = Vec::new();
        let outcome = apply_damage(&mut state, 1.0, &mut out);
        assert_eq!(outcome, DamageOutcome::Wounded { lives: 2.0 });
        assert!(state.is_invulnerable());
        assert!(out.contains(&GameEvent::Sound(SoundCue::Hit)));
    }

    #[test]
    fn test_damage_while_invulnerable_is_ignored() {
        let mut state = running_state();
        let mut out = Vec::new();
        apply_damage(&mut state, 1.0, &mut out);
        let lives = state.lives;
        for _ in 0..5 {
            assert_eq!(apply_damage(&mut state, 1.5, &mut out), DamageOutcome::Ignored);
        }
        assert_eq!(state.lives, lives);
    }

    #[test]
    fn test_damage_while_powered_up_is_ignored() {
        let mut state = running_state();
        state.activate_power_up(&mut Vec::new());
        assert_eq!(apply_damage(&mut state, 3.0, &mut Vec::new()), DamageOutcome::Ignored);
        assert_eq!(state.lives, 3.0);
    }

    #[test]
    fn test_fractional_damage() {
        let mut state = running_state();
        apply_damage(&mut state, 1.5, &mut Vec::new());
        assert_eq!(state.lives, 1.5);
    }

    #[test]
    fn test_three_hits_end_the_run() {
        let mut state = running_state();
        let mut out = Vec::new();
        for hit in 1..=3 {
            let outcome = apply_damage(&mut state, 1.0, &mut out);
            if hit < 3 {
                assert!(matches!(outcome, DamageOutcome::Wounded { .. }));
                state.advance_timers(INVULNERABILITY_DURATION_MS);
                assert!(!state.is_invulnerable());
            } else {
                assert_eq!(outcome, DamageOutcome::Fatal);
            }
        }
        assert_eq!(state.phase(), GamePhase::Ended);
        assert!(out.iter().any(|e| matches!(e, GameEvent::GameOver { score: 0 })));
    }

    fn arb_rect() -> impl Strategy<Value = Rect> {
        (-500.0f32..500.0, -500.0f32..500.0, 0.0f32..200.0, 0.0f32..200.0)
            .prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
    }

    proptest! {
        #[test]
        fn prop_overlap_is_symmetric(a in arb_rect(), b in arb_rect(), padding in 0.0f32..10.0) {
            prop_assert_eq!(overlaps(&a, &b, padding), overlaps(&b, &a, padding));
        }
    }
}
