//! Save/load persistence
//!
//! Features:
//! - Resumable session snapshot, discarded after 24 hours
//! - Best score kept across sessions
//! - Import/export of a single JSON document (see `transfer`)
//!
//! Reads never fail loudly: anything unreadable is treated as "no saved
//! state". Writes that the store drops are reported and otherwise ignored.

pub mod transfer;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::consts::{FISH_START_LEFT, FISH_START_BOTTOM, MAX_LIVES};
use crate::platform::KeyValueStore;
use crate::settings::Difficulty;

pub use transfer::{ExportDocument, export_save, import_save};

/// Storage key for the session snapshot
pub const SNAPSHOT_KEY: &str = "fishAdventure_gameState";
/// Storage key for the best score
pub const HIGH_SCORE_KEY: &str = "highScore";
/// Snapshots older than this are discarded on load
pub const SNAPSHOT_MAX_AGE_MS: f64 = 24.0 * 60.0 * 60.0 * 1000.0;

#[derive(Debug, Clone, PartialEq)]
pub enum PersistenceError {
    /// The store dropped a write (quota, private browsing, no window)
    StorageUnavailable,
    /// Stored JSON did not parse or held impossible values
    Corrupt(String),
    /// Snapshot is older than the staleness window
    Stale { age_ms: f64 },
    /// Import document rejected; nothing was applied
    MalformedImport(String),
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StorageUnavailable => write!(f, "storage unavailable"),
            Self::Corrupt(reason) => write!(f, "corrupt saved data: {}", reason),
            Self::Stale { age_ms } => {
                write!(f, "saved game is stale ({:.1} h old)", age_ms / 3_600_000.0)
            }
            Self::MalformedImport(reason) => write!(f, "malformed import: {}", reason),
        }
    }
}

impl std::error::Error for PersistenceError {}

/// Player position as stored (left/bottom offsets in px)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FishPosition {
    pub left: f32,
    pub bottom: f32,
}

impl Default for FishPosition {
    fn default() -> Self {
        Self {
            left: FISH_START_LEFT,
            bottom: FISH_START_BOTTOM,
        }
    }
}

/// The resumable part of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub score: u64,
    #[serde(default)]
    pub high_score: u64,
    pub lives: f32,
    pub current_stage: u32,
    #[serde(default)]
    pub fish_position: FishPosition,
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Wall-clock save time (ms since the Unix epoch)
    pub timestamp: f64,
    #[serde(default)]
    pub session_id: String,
}

impl GameSnapshot {
    /// Reject values a running session could never have produced
    pub fn validate(&self) -> Result<(), PersistenceError> {
        if !self.lives.is_finite() || self.lives < 0.0 || self.lives > MAX_LIVES {
            return Err(PersistenceError::Corrupt(format!("lives {}", self.lives)));
        }
        if self.current_stage == 0 {
            return Err(PersistenceError::Corrupt("stage 0".to_string()));
        }
        if !self.fish_position.left.is_finite() || !self.fish_position.bottom.is_finite() {
            return Err(PersistenceError::Corrupt("fish position".to_string()));
        }
        if !self.timestamp.is_finite() {
            return Err(PersistenceError::Corrupt("timestamp".to_string()));
        }
        Ok(())
    }

    pub fn age_ms(&self, now_ms: f64) -> f64 {
        (now_ms - self.timestamp).max(0.0)
    }

    pub fn is_stale(&self, now_ms: f64) -> bool {
        self.age_ms(now_ms) > SNAPSHOT_MAX_AGE_MS
    }
}

/// Write the snapshot, replacing any previous one
pub fn save_snapshot(
    store: &mut dyn KeyValueStore,
    snapshot: &GameSnapshot,
) -> Result<(), PersistenceError> {
    let json =
        serde_json::to_string(snapshot).map_err(|e| PersistenceError::Corrupt(e.to_string()))?;
    if store.set(SNAPSHOT_KEY, &json) {
        log::info!(
            "Game saved (stage {}, score {})",
            snapshot.current_stage,
            snapshot.score
        );
        Ok(())
    } else {
        Err(PersistenceError::StorageUnavailable)
    }
}

/// Parse and validate the stored snapshot without touching the store
///
/// `Ok(None)` means nothing is saved.
pub fn read_snapshot(
    store: &dyn KeyValueStore,
    now_ms: f64,
) -> Result<Option<GameSnapshot>, PersistenceError> {
    let Some(json) = store.get(SNAPSHOT_KEY) else {
        return Ok(None);
    };
    let snapshot: GameSnapshot =
        serde_json::from_str(&json).map_err(|e| PersistenceError::Corrupt(e.to_string()))?;
    snapshot.validate()?;
    if snapshot.is_stale(now_ms) {
        return Err(PersistenceError::Stale {
            age_ms: snapshot.age_ms(now_ms),
        });
    }
    Ok(Some(snapshot))
}

/// Load the saved snapshot, clearing it if it is stale or unreadable
pub fn load_snapshot(store: &mut dyn KeyValueStore, now_ms: f64) -> Option<GameSnapshot> {
    match read_snapshot(store, now_ms) {
        Ok(Some(snapshot)) => {
            log::info!("Loaded saved game (stage {})", snapshot.current_stage);
            Some(snapshot)
        }
        Ok(None) => None,
        Err(e) => {
            log::warn!("Discarding saved game: {}", e);
            clear_snapshot(store);
            None
        }
    }
}

pub fn clear_snapshot(store: &mut dyn KeyValueStore) {
    store.remove(SNAPSHOT_KEY);
    log::info!("Saved game cleared");
}

/// Best score on record (0 if missing or unreadable)
pub fn load_high_score(store: &dyn KeyValueStore) -> u64 {
    store
        .get(HIGH_SCORE_KEY)
        .and_then(|raw| raw.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v > 0.0)
        .map(|v| v as u64)
        .unwrap_or(0)
}

/// Record `score` if it beats the stored best
pub fn save_high_score(store: &mut dyn KeyValueStore, score: u64) -> bool {
    if score <= load_high_score(store) {
        return false;
    }
    store.set(HIGH_SCORE_KEY, &score.to_string())
}
