//! Entity records and obstacle behaviors

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{Body, Rect};
use super::event::SoundCue;
use super::pool::PoolKind;
use super::store::EntityStore;
use crate::consts::*;

/// Obstacle tiers, unlocked as stages progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstacleTier {
    Basic,
    Easy,
    Medium,
    Hard,
    Extreme,
    Special,
}

impl ObstacleTier {
    pub const ALL: [ObstacleTier; 6] = [
        ObstacleTier::Basic,
        ObstacleTier::Easy,
        ObstacleTier::Medium,
        ObstacleTier::Hard,
        ObstacleTier::Extreme,
        ObstacleTier::Special,
    ];

    pub fn kinds(&self) -> &'static [ObstacleKind] {
        use ObstacleKind::*;
        match self {
            ObstacleTier::Basic => &[Rock, Trash],
            ObstacleTier::Easy => &[Jellyfish, SmallFish],
            ObstacleTier::Medium => &[Barracuda, Stingray],
            ObstacleTier::Hard => &[Shark, Octopus],
            ObstacleTier::Extreme => &[SeaMonster, GiantSquid],
            ObstacleTier::Special => &[ElectricEel, Submarine],
        }
    }
}

/// Obstacle variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObstacleKind {
    Rock,
    Trash,
    Jellyfish,
    SmallFish,
    Barracuda,
    Stingray,
    Shark,
    Octopus,
    SeaMonster,
    GiantSquid,
    ElectricEel,
    Submarine,
}

impl ObstacleKind {
    /// Image asset key
    pub fn asset_key(&self) -> &'static str {
        match self {
            ObstacleKind::Rock => "rock.png",
            ObstacleKind::Trash => "trash.png",
            ObstacleKind::Jellyfish => "jellyfish.gif",
            ObstacleKind::SmallFish => "small-fish.gif",
            ObstacleKind::Barracuda => "barracuda.gif",
            ObstacleKind::Stingray => "stingray.gif",
            ObstacleKind::Shark => "shark.gif",
            ObstacleKind::Octopus => "octopus.gif",
            ObstacleKind::SeaMonster => "sea-monster.gif",
            ObstacleKind::GiantSquid => "giant-squid.gif",
            ObstacleKind::ElectricEel => "electric-eel.gif",
            ObstacleKind::Submarine => "submarine.gif",
        }
    }

    /// Basic debris tumbles as it drifts
    pub fn spins(&self) -> bool {
        ObstacleTier::Basic.kinds().contains(self)
    }

    /// Behavior descriptor, resolved once at spawn time
    pub fn behavior(&self) -> Behavior {
        match self {
            ObstacleKind::Shark => Behavior {
                speed: 1.5,
                damage: 2.0,
                sound: SoundCue::Hit,
                ability: Some(Ability::Chase {
                    range: 200.0,
                    speed: 1.5,
                }),
            },
            ObstacleKind::Octopus => Behavior {
                speed: 0.8,
                damage: 1.0,
                sound: SoundCue::InkSpray,
                ability: Some(Ability::InkSpray {
                    cooldown_ms: 3000.0,
                    duration_ms: 2000.0,
                }),
            },
            ObstacleKind::ElectricEel => Behavior {
                speed: 1.2,
                damage: 1.5,
                sound: SoundCue::ElectricShock,
                ability: Some(Ability::Shockwave {
                    range: 100.0,
                    cooldown_ms: 2000.0,
                }),
            },
            ObstacleKind::SeaMonster => Behavior {
                speed: 0.7,
                damage: 3.0,
                sound: SoundCue::MonsterRoar,
                ability: Some(Ability::Roar {
                    range: 300.0,
                    cooldown_ms: 5000.0,
                }),
            },
            _ => Behavior::default(),
        }
    }
}

/// Special abilities some obstacles carry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Ability {
    /// Steer toward the player while within range
    Chase { range: f32, speed: f32 },
    /// Leave an ink cloud behind on a cooldown
    InkSpray { cooldown_ms: f32, duration_ms: f32 },
    /// Pulse an electric field when the player is close
    Shockwave { range: f32, cooldown_ms: f32 },
    /// Swell up and roar when the player is within range
    Roar { range: f32, cooldown_ms: f32 },
}

impl Ability {
    pub fn kind(&self) -> AbilityKind {
        match self {
            Ability::Chase { .. } => AbilityKind::Chase,
            Ability::InkSpray { .. } => AbilityKind::InkSpray,
            Ability::Shockwave { .. } => AbilityKind::Shockwave,
            Ability::Roar { .. } => AbilityKind::Roar,
        }
    }

    pub fn cooldown_ms(&self) -> f32 {
        match self {
            Ability::Chase { .. } => 0.0,
            Ability::InkSpray { cooldown_ms, .. }
            | Ability::Shockwave { cooldown_ms, .. }
            | Ability::Roar { cooldown_ms, .. } => *cooldown_ms,
        }
    }
}

/// Ability tag carried by events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbilityKind {
    Chase,
    InkSpray,
    Shockwave,
    Roar,
}

/// How an obstacle moves and hurts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Behavior {
    /// Multiplier on the spawn speed
    pub speed: f32,
    /// Lives removed on contact (may be fractional)
    pub damage: f32,
    /// Sound played on contact
    pub sound: SoundCue,
    pub ability: Option<Ability>,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            speed: 1.0,
            damage: 1.0,
            sound: SoundCue::Hit,
            ability: None,
        }
    }
}

/// Vertical motion layered on top of horizontal travel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MotionPattern {
    Linear,
    Sine { amplitude: f32, frequency: f32 },
    /// Triangle wave between -amplitude and +amplitude
    Zigzag { amplitude: f32, frequency: f32 },
}

impl MotionPattern {
    /// Vertical offset from the baseline at phase `t`
    pub fn offset(&self, t: f32) -> f32 {
        match *self {
            MotionPattern::Linear => 0.0,
            MotionPattern::Sine {
                amplitude,
                frequency,
            } => (t * frequency).sin() * amplitude,
            MotionPattern::Zigzag {
                amplitude,
                frequency,
            } => {
                let phase = (t * frequency).rem_euclid(2.0);
                let tri = if phase < 1.0 { phase } else { 2.0 - phase };
                tri * amplitude * 2.0 - amplitude
            }
        }
    }
}

/// Drifts right to left with a vertical pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub kind: ObstacleKind,
    /// Bottom-left corner
    pub pos: Vec2,
    /// Baseline the motion pattern oscillates around
    pub start_y: f32,
    /// Pixels per 60 Hz frame
    pub speed: f32,
    pub behavior: Behavior,
    /// Motion phase, in seconds since spawn
    pub phase: f32,
    pub pattern: MotionPattern,
    /// Time until the ability may fire again
    pub ability_cooldown_ms: f32,
}

impl Body for Obstacle {
    fn rect(&self) -> Rect {
        Rect::new(self.pos.x, self.pos.y, OBSTACLE_SIZE, OBSTACLE_SIZE)
    }
}

/// Decorative bubble rising from the sea floor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bubble {
    pub pos: Vec2,
    pub speed: f32,
    pub size: f32,
}

impl Body for Bubble {
    fn rect(&self) -> Rect {
        Rect::new(self.pos.x, self.pos.y, self.size, self.size)
    }
}

/// Walks along the sea floor shooting pearls upward
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crab {
    pub pos: Vec2,
    /// +1 walking right, -1 walking left
    pub direction: f32,
    pub speed: f32,
    pub since_last_pearl_ms: f32,
    pub next_pearl_delay_ms: f32,
}

impl Body for Crab {
    fn rect(&self) -> Rect {
        Rect::new(self.pos.x, self.pos.y, CRAB_WIDTH, CRAB_HEIGHT)
    }
}

/// Projectile rising from a crab
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pearl {
    pub pos: Vec2,
    /// Pixels per second
    pub speed: f32,
    pub age_ms: f32,
}

impl Body for Pearl {
    fn rect(&self) -> Rect {
        Rect::new(self.pos.x, self.pos.y, PEARL_SIZE, PEARL_SIZE)
    }
}

/// Pickup drifting right to left: invincibility, or an extra life
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerUp {
    pub pos: Vec2,
    pub speed: f32,
    pub is_life: bool,
}

impl PowerUp {
    pub fn pool_kind(&self) -> PoolKind {
        if self.is_life {
            PoolKind::LifePowerUp
        } else {
            PoolKind::PowerUp
        }
    }
}

impl Body for PowerUp {
    fn rect(&self) -> Rect {
        Rect::new(self.pos.x, self.pos.y, POWER_UP_SIZE, POWER_UP_SIZE)
    }
}

/// All live entities, one store per category
#[derive(Debug, Clone, Default)]
pub struct Entities {
    pub obstacles: EntityStore<Obstacle>,
    pub bubbles: EntityStore<Bubble>,
    pub crabs: EntityStore<Crab>,
    pub pearls: EntityStore<Pearl>,
    pub power_ups: EntityStore<PowerUp>,
}

impl Entities {
    pub fn len(&self) -> usize {
        self.obstacles.len()
            + self.bubbles.len()
            + self.crabs.len()
            + self.pearls.len()
            + self.power_ups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every entity, returning its sprite to the pool
    pub fn clear_into(&mut self, pool: &mut super::pool::ObjectPool) {
        for entry in self.obstacles.clear() {
            pool.release(entry.sprite, PoolKind::Obstacle);
        }
        for entry in self.bubbles.clear() {
            pool.release(entry.sprite, PoolKind::Bubble);
        }
        for entry in self.crabs.clear() {
            pool.release(entry.sprite, PoolKind::Crab);
        }
        for entry in self.pearls.clear() {
            pool.release(entry.sprite, PoolKind::Pearl);
        }
        for entry in self.power_ups.clear() {
            let kind = entry.data.pool_kind();
            pool.release(entry.sprite, kind);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zigzag_is_triangle_wave() {
        let pattern = MotionPattern::Zigzag {
            amplitude: 50.0,
            frequency: 1.0,
        };
        assert_eq!(pattern.offset(0.0), -50.0);
        assert_eq!(pattern.offset(0.5), 0.0);
        assert_eq!(pattern.offset(1.0), 50.0);
        assert_eq!(pattern.offset(1.5), 0.0);
        assert_eq!(pattern.offset(2.0), -50.0);
    }

    #[test]
    fn test_sine_stays_within_amplitude() {
        let pattern = MotionPattern::Sine {
            amplitude: 30.0,
            frequency: 0.02,
        };
        for t in 0..1000 {
            assert!(pattern.offset(t as f32).abs() <= 30.0);
        }
        assert_eq!(MotionPattern::Linear.offset(123.0), 0.0);
    }

    #[test]
    fn test_behavior_table() {
        assert_eq!(ObstacleKind::ElectricEel.behavior().damage, 1.5);
        assert_eq!(ObstacleKind::Shark.behavior().damage, 2.0);
        assert_eq!(ObstacleKind::SeaMonster.behavior().speed, 0.7);
        assert_eq!(ObstacleKind::Rock.behavior(), Behavior::default());
        assert!(ObstacleKind::Trash.spins());
        assert!(!ObstacleKind::Shark.spins());
    }
}
