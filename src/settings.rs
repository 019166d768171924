//! Game settings and preferences
//!
//! Persisted separately from game snapshots. Saved JSON is merged over the
//! defaults, so settings written by older builds still load.

use serde::{Deserialize, Serialize};

use crate::platform::KeyValueStore;

/// Difficulty level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Multiplier on obstacle speed
    pub fn speed(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.7,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 1.5,
        }
    }

    /// Multiplier on the obstacle spawn interval (larger is slower)
    pub fn interval(&self) -> f32 {
        match self {
            Difficulty::Easy => 1.4,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 0.7,
        }
    }

    /// Lives at the start of a run
    pub fn lives(&self) -> f32 {
        match self {
            Difficulty::Easy => 5.0,
            Difficulty::Normal => 3.0,
            Difficulty::Hard => 2.0,
        }
    }
}

/// Keyboard layout for movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ControlScheme {
    #[default]
    Arrows,
    Wasd,
}

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QualityPreset {
    Low,
    Medium,
    #[default]
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "low",
            QualityPreset::Medium => "medium",
            QualityPreset::High => "high",
        }
    }

    /// Decorative particles per burst
    pub fn particle_count(&self) -> u32 {
        match self {
            QualityPreset::Low => 0,
            QualityPreset::Medium => 5,
            QualityPreset::High => 15,
        }
    }

    /// CSS animation speed factor
    pub fn animation_speed(&self) -> f32 {
        match self {
            QualityPreset::Low => 0.5,
            QualityPreset::Medium => 0.8,
            QualityPreset::High => 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AccessibilitySettings {
    /// Screen reader announcements
    pub announcements: bool,
    pub reduced_motion: bool,
    pub high_contrast: bool,
}

impl Default for AccessibilitySettings {
    fn default() -> Self {
        Self {
            announcements: true,
            reduced_motion: false,
            high_contrast: false,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    // === Audio ===
    pub sound_enabled: bool,
    pub music_enabled: bool,
    /// Master volume (0.0 - 1.0)
    pub volume: f32,

    // === Gameplay ===
    pub difficulty: Difficulty,
    pub control_scheme: ControlScheme,
    /// Write a snapshot at save points
    pub auto_save: bool,

    // === Visual ===
    pub graphics: QualityPreset,
    pub particle_effects: bool,

    pub accessibility: AccessibilitySettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            music_enabled: true,
            volume: 0.7,

            difficulty: Difficulty::Normal,
            control_scheme: ControlScheme::Arrows,
            auto_save: true,

            graphics: QualityPreset::High,
            particle_effects: true,

            accessibility: AccessibilitySettings::default(),
        }
    }
}

impl Settings {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "fishAdventure_settings";

    /// Effective particle count (respects the toggle and reduced motion)
    pub fn particle_count(&self) -> u32 {
        if !self.particle_effects || self.accessibility.reduced_motion {
            0
        } else {
            self.graphics.particle_count()
        }
    }

    /// Volume clamped into range
    pub fn effective_volume(&self) -> f32 {
        self.volume.clamp(0.0, 1.0)
    }

    /// Load settings, falling back to defaults on a missing or unreadable entry
    pub fn load(store: &dyn KeyValueStore) -> Self {
        if let Some(json) = store.get(Self::STORAGE_KEY) {
            match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings");
                    return settings;
                }
                Err(e) => log::warn!("Ignoring unreadable settings: {}", e),
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings. Returns false if the write was dropped.
    pub fn save(&self, store: &mut dyn KeyValueStore) -> bool {
        let Ok(json) = serde_json::to_string(self) else {
            return false;
        };
        let saved = store.set(Self::STORAGE_KEY, &json);
        if saved {
            log::info!("Settings saved");
        }
        saved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MemoryStore;

    #[test]
    fn test_partial_json_merges_over_defaults() {
        let mut store = MemoryStore::default();
        store.set(
            Settings::STORAGE_KEY,
            r#"{"difficulty":"hard","accessibility":{"reducedMotion":true}}"#,
        );
        let settings = Settings::load(&store);
        assert_eq!(settings.difficulty, Difficulty::Hard);
        assert!(settings.accessibility.reduced_motion);
        assert!(settings.accessibility.announcements);
        assert_eq!(settings.volume, 0.7);
        assert_eq!(settings.graphics, QualityPreset::High);
    }

    #[test]
    fn test_corrupt_settings_fall_back_to_defaults() {
        let mut store = MemoryStore::default();
        store.set(Settings::STORAGE_KEY, "{not json");
        assert_eq!(Settings::load(&store), Settings::default());
    }

    #[test]
    fn test_save_then_load() {
        let mut store = MemoryStore::default();
        let mut settings = Settings::default();
        settings.control_scheme = ControlScheme::Wasd;
        settings.sound_enabled = false;
        settings.save(&mut store);
        assert_eq!(Settings::load(&store), settings);
    }

    #[test]
    fn test_lower_presets_animate_slower() {
        assert!(QualityPreset::Low.animation_speed() < QualityPreset::Medium.animation_speed());
        assert_eq!(QualityPreset::High.animation_speed(), 1.0);
    }

    #[test]
    fn test_particle_count_respects_reduced_motion() {
        let mut settings = Settings::default();
        assert_eq!(settings.particle_count(), 15);
        settings.accessibility.reduced_motion = true;
        assert_eq!(settings.particle_count(), 0);
    }

    #[test]
    fn test_difficulty_table() {
        assert_eq!(Difficulty::Easy.lives(), 5.0);
        assert_eq!(Difficulty::Hard.interval(), 0.7);
        assert_eq!(Difficulty::from_str("HARD"), Some(Difficulty::Hard));
        assert_eq!(serde_json::to_string(&Difficulty::Easy).unwrap(), "\"easy\"");
    }
}
