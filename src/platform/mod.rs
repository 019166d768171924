//! Platform abstraction layer
//!
//! The simulation talks to the outside world only through these interfaces:
//! - Asset availability (`AssetCatalog`, defined beside the spawner)
//! - Audio playback
//! - Haptics
//! - Screen reader announcements
//! - Key-value storage (LocalStorage on web)
//! - Wall-clock time
//!
//! Every collaborator is fire-and-forget. Failures are logged and dropped.

mod dispatch;
#[cfg(target_arch = "wasm32")]
pub mod web;

use std::collections::HashMap;

pub use crate::sim::AssetCatalog;
pub use dispatch::{AnnouncementFilter, Platform};

use crate::sim::{HapticPattern, SoundCue};

pub trait AudioSink {
    /// Play a one-shot effect at `gain` (0.0 - 1.0)
    fn play_effect(&mut self, cue: SoundCue, gain: f32);
    fn play_music_for_stage(&mut self, stage: u32, gain: f32);
    fn stop_music(&mut self);
    /// Unlock playback after a user gesture
    fn resume(&mut self) {}
}

pub trait Haptics {
    /// No-op on devices without vibration
    fn vibrate(&mut self, pattern: HapticPattern);
}

pub trait Announcer {
    fn announce(&mut self, message: &str);
}

/// String storage keyed by name
pub trait KeyValueStore {
    /// Read failures look the same as a missing key
    fn get(&self, key: &str) -> Option<String>;
    /// Returns false if the write was dropped
    fn set(&mut self, key: &str, value: &str) -> bool;
    fn remove(&mut self, key: &str);
}

/// Collaborator that does nothing (headless runs, unsupported devices)
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl AudioSink for Silent {
    fn play_effect(&mut self, _cue: SoundCue, _gain: f32) {}
    fn play_music_for_stage(&mut self, _stage: u32, _gain: f32) {}
    fn stop_music(&mut self) {}
}

impl Haptics for Silent {
    fn vibrate(&mut self, _pattern: HapticPattern) {}
}

impl Announcer for Silent {
    fn announce(&mut self, _message: &str) {}
}

/// Announcer that writes to the log
#[derive(Debug, Clone, Default)]
pub struct LogAnnouncer {
    /// Everything announced so far
    pub history: Vec<String>,
}

impl Announcer for LogAnnouncer {
    fn announce(&mut self, message: &str) {
        log::info!("[announce] {}", message);
        self.history.push(message.to_string());
    }
}

/// In-memory storage
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    /// Simulates an exhausted quota: every write is dropped
    pub full: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> bool {
        if self.full {
            log::warn!("Storage full; dropped write to {}", key);
            return false;
        }
        self.entries.insert(key.to_string(), value.to_string());
        true
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// Milliseconds since the Unix epoch
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> f64 {
    js_sys::Date::now()
}

/// Milliseconds since the Unix epoch
#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

/// ISO-8601 UTC timestamp for `ms` since the Unix epoch
#[cfg(target_arch = "wasm32")]
pub fn iso_timestamp(ms: f64) -> String {
    let date = js_sys::Date::new(&wasm_bindgen::JsValue::from_f64(ms));
    String::from(date.to_iso_string())
}

/// ISO-8601 UTC timestamp for `ms` since the Unix epoch
#[cfg(not(target_arch = "wasm32"))]
pub fn iso_timestamp(ms: f64) -> String {
    let total_ms = ms.max(0.0) as i64;
    let days = total_ms.div_euclid(86_400_000);
    let day_ms = total_ms.rem_euclid(86_400_000);
    let (year, month, day) = civil_from_days(days);
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
        year,
        month,
        day,
        day_ms / 3_600_000,
        day_ms / 60_000 % 60,
        day_ms / 1000 % 60,
        day_ms % 1000
    )
}

/// Gregorian date from days since 1970-01-01
#[cfg(not(target_arch = "wasm32"))]
fn civil_from_days(days: i64) -> (i64, i64, i64) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + if month <= 2 { 1 } else { 0 };
    (year, month, day)
}
