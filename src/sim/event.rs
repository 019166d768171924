//! Outbound game events
//!
//! The simulation never talks to audio, haptics, storage or the screen reader
//! directly. It appends events to an outbox that the host drains once per frame.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::{AbilityKind, ObstacleKind};
use super::stage::Background;

/// Named sound effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundCue {
    Hit,
    PowerUp,
    LifePickup,
    StageUp,
    GameOver,
    Bubble,
    ScorePoint,
    Thunder,
    InkSpray,
    ElectricShock,
    MonsterRoar,
}

impl SoundCue {
    pub fn as_str(&self) -> &'static str {
        match self {
            SoundCue::Hit => "hit",
            SoundCue::PowerUp => "powerUp",
            SoundCue::LifePickup => "lifePickup",
            SoundCue::StageUp => "stageUp",
            SoundCue::GameOver => "gameOver",
            SoundCue::Bubble => "bubble",
            SoundCue::ScorePoint => "scorePoint",
            SoundCue::Thunder => "thunder",
            SoundCue::InkSpray => "inkSpray",
            SoundCue::ElectricShock => "electricShock",
            SoundCue::MonsterRoar => "monsterRoar",
        }
    }

    /// Mix level relative to master volume
    pub fn volume(&self) -> f32 {
        match self {
            SoundCue::Hit => 0.4,
            SoundCue::PowerUp | SoundCue::LifePickup => 0.6,
            SoundCue::StageUp | SoundCue::GameOver => 0.7,
            SoundCue::Bubble => 0.2,
            SoundCue::ScorePoint => 0.3,
            SoundCue::Thunder | SoundCue::ElectricShock => 0.5,
            SoundCue::InkSpray => 0.4,
            SoundCue::MonsterRoar => 0.6,
        }
    }
}

/// Vibration patterns (milliseconds on/off)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HapticPattern {
    Light,
    Medium,
    Heavy,
    Collision,
    PowerUp,
    StageUp,
}

impl HapticPattern {
    pub fn pulses(&self) -> &'static [u32] {
        match self {
            HapticPattern::Light => &[10],
            HapticPattern::Medium => &[20],
            HapticPattern::Heavy => &[30, 10, 30],
            HapticPattern::Collision => &[50, 30, 50],
            HapticPattern::PowerUp => &[15, 10, 15],
            HapticPattern::StageUp => &[20, 20, 40],
        }
    }
}

/// Screen reader announcements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Announcement {
    GameStarted,
    Score(u64),
    Lives { lives: f32, gained: bool },
    Stage(String),
    PowerUp,
    Paused(bool),
    GameOver { score: u64 },
}

impl Announcement {
    pub fn message(&self) -> String {
        match self {
            Announcement::GameStarted => {
                "Game started. Use arrow keys to control your fish and avoid obstacles.".to_string()
            }
            Announcement::Score(score) => format!("Score: {}", score),
            Announcement::Lives { lives, gained } => {
                let lives = lives.max(0.0);
                if *gained {
                    format!("Extra life! Lives: {}", lives)
                } else {
                    format!("Lives remaining: {}", lives)
                }
            }
            Announcement::Stage(name) => format!("Entered new stage: {}", name),
            Announcement::PowerUp => {
                "Power-up activated! You are temporarily invincible.".to_string()
            }
            Announcement::Paused(true) => "Game paused".to_string(),
            Announcement::Paused(false) => "Game resumed".to_string(),
            Announcement::GameOver { score } => {
                format!("Game Over! Final score: {}. Press R to restart.", score)
            }
        }
    }
}

/// Background music commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MusicCommand {
    PlayStage(u32),
    Stop,
}

/// Everything the simulation wants the outside world to know about
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Sound(SoundCue),
    Music(MusicCommand),
    Haptic(HapticPattern),
    Announce(Announcement),
    /// Stage changed (or was set on start); host swaps the background
    StageChanged {
        stage: u32,
        name: String,
        background: Background,
    },
    /// A new best score was reached
    HighScore(u64),
    /// Periodic auto-save point
    SaveRequested,
    /// Run ended; host clears the saved snapshot
    GameOver { score: u64 },
    /// An obstacle used its special ability at a position
    Ability {
        kind: ObstacleKind,
        ability: AbilityKind,
        at: Vec2,
    },
    /// Pool free lists were trimmed
    PoolsTrimmed { discarded: usize },
}
