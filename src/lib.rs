//! Fish Adventure - an underwater dodge-the-obstacles arcade game
//!
//! Core modules:
//! - `sim`: Real-time simulation (entities, pooling, spawning, stages, collisions)
//! - `platform`: Collaborator interfaces (audio, haptics, announcements, storage)
//! - `persistence`: Snapshot save/load, high score, import/export
//! - `settings`: Player preferences

#[cfg(target_arch = "wasm32")]
pub mod audio;
pub mod persistence;
pub mod platform;
pub mod settings;
pub mod sim;

pub use settings::{Difficulty, QualityPreset, Settings};
pub use sim::{Game, GameEvent, GamePhase, GameState};

/// Game configuration constants
pub mod consts {
    /// Default play area (used until the host reports a real viewport)
    pub const DEFAULT_VIEWPORT_WIDTH: f32 = 1280.0;
    pub const DEFAULT_VIEWPORT_HEIGHT: f32 = 720.0;

    /// Player sprite footprint and starting position
    pub const FISH_WIDTH: f32 = 80.0;
    pub const FISH_HEIGHT: f32 = 60.0;
    pub const FISH_START_LEFT: f32 = 50.0;
    pub const FISH_START_BOTTOM: f32 = 300.0;
    /// Movement per 16.67ms of input at full deflection is speed * sensitivity
    pub const FISH_MOVE_SPEED: f32 = 15.0;
    pub const FISH_POWERED_MOVE_SPEED: f32 = 25.0;
    pub const FISH_SENSITIVITY: f32 = 3.0;
    /// Held movement keys deflect a sixth of the way (about 450 px/s)
    pub const KEYBOARD_DEFLECTION: f32 = 1.0 / 6.0;

    /// Lives
    pub const START_LIVES: f32 = 3.0;
    pub const MAX_LIVES: f32 = 5.0;

    /// Frame clock (milliseconds)
    pub const INITIAL_SMOOTH_DELTA_MS: f32 = 16.67;
    pub const MAX_FRAME_DELTA_MS: f32 = 50.0;
    pub const DELTA_SMOOTHING: f32 = 0.9;
    /// Pixels-per-frame speeds are expressed against a 60 Hz frame
    pub const FRAME_SCALE: f32 = 0.06;
    /// Obstacle motion phase advances in seconds
    pub const MOTION_PHASE_SCALE: f32 = 0.001;

    /// Timed states (milliseconds)
    pub const INVULNERABILITY_DURATION_MS: f32 = 3000.0;
    pub const INVULNERABILITY_BLINK_MS: f32 = 100.0;
    pub const POWER_UP_DURATION_MS: f32 = 5000.0;
    pub const POWER_UP_PULSE_MS: f32 = 2000.0;

    /// Obstacles
    pub const BASE_OBSTACLE_SPEED: f32 = 3.0;
    pub const BASE_OBSTACLE_INTERVAL_MS: f32 = 2000.0;
    pub const OBSTACLE_SIZE: f32 = 80.0;
    pub const OBSTACLE_BASE_SPEED_MIN: f32 = 2.0;
    pub const OBSTACLE_BASE_SPEED_MAX: f32 = 5.0;
    pub const OBSTACLE_SPEED_JITTER: f32 = 0.2;
    pub const OBSTACLE_AMPLITUDE_MIN: f32 = 30.0;
    pub const OBSTACLE_AMPLITUDE_MAX: f32 = 150.0;
    pub const OBSTACLE_FREQUENCY_MIN: f32 = 0.01;
    pub const OBSTACLE_FREQUENCY_MAX: f32 = 0.03;
    pub const OBSTACLE_DESPAWN_X: f32 = -100.0;

    /// Bubbles
    pub const BUBBLE_MIN_SIZE: f32 = 6.0;
    pub const BUBBLE_MAX_SIZE: f32 = 14.0;

    /// Crabs and their pearls
    pub const MAX_CRABS: usize = 3;
    pub const INITIAL_CRABS: usize = 2;
    pub const INITIAL_CRAB_DELAY_MAX_MS: f32 = 2000.0;
    pub const CRAB_SPEED: f32 = 2.0;
    pub const CRAB_WIDTH: f32 = 100.0;
    pub const CRAB_HEIGHT: f32 = 73.0;
    pub const CRAB_DESPAWN_MARGIN: f32 = 150.0;
    pub const PEARL_SIZE: f32 = 12.0;
    /// Pixels per second
    pub const PEARL_SPEED: f32 = 120.0;
    pub const PEARL_MIN_DELAY_MS: f32 = 800.0;
    pub const PEARL_MAX_DELAY_MS: f32 = 2200.0;
    pub const PEARL_FIRE_CHANCE: f64 = 0.95;
    pub const PEARL_MAX_AGE_MS: f32 = 8000.0;

    /// Power-ups
    pub const POWER_UP_SIZE: f32 = 50.0;
    pub const POWER_UP_SPEED: f32 = 2.0;

    /// Collision inset applied to both rectangles
    pub const COLLISION_PADDING: f32 = 4.0;

    /// Object pools
    pub const POOL_SOFT_CAP: usize = 30;
    pub const POOL_TRIM_TARGET: usize = 20;
    pub const POOL_TRIM_INTERVAL_MS: f64 = 30_000.0;
}
