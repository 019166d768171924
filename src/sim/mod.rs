//! Real-time simulation module
//!
//! All gameplay logic lives here. It stays free of platform dependencies:
//! - Time only advances through injected frame deltas
//! - Seeded RNG only
//! - Side effects leave as `GameEvent`s for the host to dispatch

pub mod assets;
pub mod clock;
pub mod collision;
pub mod entity;
pub mod event;
pub mod game;
pub mod pool;
pub mod spawn;
pub mod stage;
pub mod state;
pub mod store;
pub mod tick;
pub mod timer;

pub use assets::{AssetCatalog, AssetManifest};
pub use clock::{FrameClock, LoopControl, LoopGuard};
pub use collision::{Body, DamageOutcome, Rect, apply_damage, overlaps};
pub use entity::{
    Ability, AbilityKind, Behavior, Bubble, Crab, Entities, MotionPattern, Obstacle, ObstacleKind,
    ObstacleTier, Pearl, PowerUp,
};
pub use event::{Announcement, GameEvent, HapticPattern, MusicCommand, SoundCue};
pub use game::Game;
pub use pool::{ObjectPool, PoolKind, Sprite, SpriteId};
pub use spawn::{SpawnConfig, Spawner};
pub use stage::{
    BACKGROUNDS, Background, StageConfig, StageEffect, StageRules, points_required_for_stage,
};
pub use state::{GamePhase, GameState};
pub use store::{EntityStore, Entry, Step};
pub use tick::TickInput;
pub use timer::Timer;
