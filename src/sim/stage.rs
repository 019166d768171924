//! Stage progression
//!
//! Stages are derived from cumulative score. Each stage needs geometrically
//! more points than the last and unlocks tougher obstacle sets.

use serde::{Deserialize, Serialize};

use super::assets::AssetCatalog;
use super::entity::{ObstacleKind, ObstacleTier};

const STAGE_NAMES: [&str; 5] = [
    "Calm Waters",
    "Reef Waters",
    "Deep Sea",
    "Storm Waters",
    "The Abyss",
];

const CYCLE_PREFIXES: [&str; 5] = ["", "Greater ", "Extreme ", "Ultimate ", "Infinite "];

/// Background image asset keys, one per stage in a cycle
pub const BACKGROUNDS: [&str; 5] = [
    "calm-waters.png",
    "reef-waters.png",
    "deep-sea.png",
    "storm-waters.png",
    "deep-abyss.png",
];

/// Highest stage whose threshold follows the exponential curve
const MAX_SCALED_STAGE: u32 = 64;
/// Largest integer an f64 holds exactly
const MAX_EXACT_POINTS: f64 = 9_007_199_254_740_992.0;

pub const DEFAULT_GRADIENT: &str = "linear-gradient(to bottom, #006994, #004d6b)";

/// Tunable progression parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageRules {
    /// Points needed for stage 1
    pub base_points: f64,
    /// Growth factor per stage
    pub point_multiplier: f64,
    /// Speed multiplier added per stage
    pub speed_step: f32,
    /// Spawn rate multiplier added per stage
    pub spawn_step: f32,
}

impl Default for StageRules {
    fn default() -> Self {
        Self {
            base_points: 100.0,
            point_multiplier: 1.5,
            speed_step: 0.2,
            spawn_step: 0.2,
        }
    }
}

impl StageRules {
    /// floor(base × multiplier^(stage-1))
    ///
    /// Past stage 64 the threshold keeps growing by the last
    /// scaled step, so it stays exact and strictly increasing.
    pub fn points_required(&self, stage: u32) -> u64 {
        let stage = stage.max(1);
        if stage > MAX_SCALED_STAGE {
            let last = self.scaled_points(MAX_SCALED_STAGE);
            let step = last.saturating_sub(self.scaled_points(MAX_SCALED_STAGE - 1)).max(1);
            let extra = u64::from(stage - MAX_SCALED_STAGE);
            return last.saturating_add(extra.saturating_mul(step));
        }
        self.scaled_points(stage)
    }

    fn scaled_points(&self, stage: u32) -> u64 {
        let exponent = stage.saturating_sub(1) as i32;
        let points = (self.base_points * self.point_multiplier.powi(exponent)).floor();
        if points.is_finite() && points >= 0.0 {
            points.min(MAX_EXACT_POINTS) as u64
        } else {
            0
        }
    }

    pub fn speed_multiplier(&self, stage: u32) -> f32 {
        1.0 + stage.saturating_sub(1) as f32 * self.speed_step
    }

    pub fn spawn_rate_multiplier(&self, stage: u32) -> f32 {
        1.0 + stage.saturating_sub(1) as f32 * self.spawn_step
    }

    /// The stage to move to from `current` at `score`, if any
    ///
    /// Advances by exactly one stage per call.
    pub fn next_stage(&self, current: u32, score: u64) -> Option<u32> {
        let next = current + 1;
        (score >= self.points_required(next)).then_some(next)
    }
}

/// Points needed to reach a stage with the default rules
pub fn points_required_for_stage(stage: u32) -> u64 {
    StageRules::default().points_required(stage)
}

/// Play area background
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Background {
    /// Image asset key
    Image(&'static str),
    /// CSS gradient used when no image is available
    Gradient(&'static str),
}

impl Background {
    /// CSS `background-image` value
    pub fn css(&self) -> String {
        match self {
            Background::Image(key) => format!("url(assets/images/backgrounds/{})", key),
            Background::Gradient(gradient) => gradient.to_string(),
        }
    }
}

/// Visual effects layered over a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageEffect {
    Storm,
    Darkness,
    Boss,
}

impl StageEffect {
    pub fn class_name(&self) -> &'static str {
        match self {
            StageEffect::Storm => "storm",
            StageEffect::Darkness => "darkness",
            StageEffect::Boss => "boss",
        }
    }
}

/// Everything derived from the stage number
#[derive(Debug, Clone, PartialEq)]
pub struct StageConfig {
    pub stage: u32,
    pub name: String,
    pub background: Background,
    /// Obstacle kinds the spawner picks from (never empty)
    pub obstacle_types: Vec<ObstacleKind>,
    pub points_required: u64,
    pub speed_multiplier: f32,
    pub spawn_rate_multiplier: f32,
    pub effects: Vec<StageEffect>,
}

impl StageConfig {
    pub fn for_stage(stage: u32, assets: &dyn AssetCatalog) -> Self {
        Self::with_rules(stage, &StageRules::default(), assets)
    }

    pub fn with_rules(stage: u32, rules: &StageRules, assets: &dyn AssetCatalog) -> Self {
        let stage = stage.max(1);
        Self {
            stage,
            name: stage_name(stage),
            background: background_for_stage(stage, assets),
            obstacle_types: obstacles_for_stage(stage, assets),
            points_required: rules.points_required(stage),
            speed_multiplier: rules.speed_multiplier(stage),
            spawn_rate_multiplier: rules.spawn_rate_multiplier(stage),
            effects: stage_effects(stage),
        }
    }

    pub fn has_effect(&self, effect: StageEffect) -> bool {
        self.effects.contains(&effect)
    }
}

/// Cyclic stage name with an escalating prefix every full cycle
pub fn stage_name(stage: u32) -> String {
    let index = stage.saturating_sub(1) as usize;
    let cycle = index / STAGE_NAMES.len();
    let base = STAGE_NAMES[index % STAGE_NAMES.len()];
    let prefix = CYCLE_PREFIXES[cycle.min(CYCLE_PREFIXES.len() - 1)];
    format!("{}{}", prefix, base)
}

/// The stage's own background, else any loaded one, else the default gradient
pub fn background_for_stage(stage: u32, assets: &dyn AssetCatalog) -> Background {
    let preferred = BACKGROUNDS[stage.saturating_sub(1) as usize % BACKGROUNDS.len()];
    if assets.is_available(preferred) {
        return Background::Image(preferred);
    }
    match BACKGROUNDS.iter().find(|bg| assets.is_available(bg)) {
        Some(bg) => Background::Image(*bg),
        None => Background::Gradient(DEFAULT_GRADIENT),
    }
}

/// Unlocked obstacle kinds with loaded assets
///
/// Falls back to the loaded basic kinds, then to rocks, so the result is
/// never empty.
pub fn obstacles_for_stage(stage: u32, assets: &dyn AssetCatalog) -> Vec<ObstacleKind> {
    let mut tiers = vec![ObstacleTier::Basic];
    if stage >= 2 {
        tiers.push(ObstacleTier::Easy);
    }
    if stage >= 3 {
        tiers.push(ObstacleTier::Medium);
    }
    if stage >= 4 {
        tiers.push(ObstacleTier::Hard);
    }
    if stage >= 5 {
        tiers.push(ObstacleTier::Extreme);
    }
    if stage % 3 == 0 {
        tiers.push(ObstacleTier::Special);
    }

    let available = |kind: &&ObstacleKind| assets.is_available(kind.asset_key());
    let unlocked: Vec<ObstacleKind> = tiers
        .iter()
        .flat_map(|tier| tier.kinds())
        .filter(available)
        .copied()
        .collect();
    if !unlocked.is_empty() {
        return unlocked;
    }

    let basic: Vec<ObstacleKind> = ObstacleTier::Basic
        .kinds()
        .iter()
        .filter(available)
        .copied()
        .collect();
    if !basic.is_empty() {
        return basic;
    }

    log::warn!("No obstacle assets loaded for stage {}; using rocks", stage);
    vec![ObstacleKind::Rock]
}

pub fn stage_effects(stage: u32) -> Vec<StageEffect> {
    let mut effects = Vec::new();
    if stage >= 4 {
        effects.push(StageEffect::Storm);
    }
    if stage >= 5 {
        effects.push(StageEffect::Darkness);
    }
    if stage % 5 == 0 {
        effects.push(StageEffect::Boss);
    }
    effects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::assets::AssetManifest;
    use proptest::prelude::*;

    #[test]
    fn test_points_required() {
        assert_eq!(points_required_for_stage(1), 100);
        assert_eq!(points_required_for_stage(2), 150);
        assert_eq!(points_required_for_stage(3), 225);
        assert_eq!(points_required_for_stage(4), 337);
    }

    #[test]
    fn test_next_stage_advances_once() {
        let rules = StageRules::default();
        assert_eq!(rules.next_stage(1, 149), None);
        assert_eq!(rules.next_stage(1, 150), Some(2));
        assert_eq!(rules.next_stage(2, 150), None);
        assert!((rules.speed_multiplier(2) - 1.2).abs() < 1e-6);
    }

    #[test]
    fn test_stage_names_cycle() {
        assert_eq!(stage_name(1), "Calm Waters");
        assert_eq!(stage_name(5), "The Abyss");
        assert_eq!(stage_name(6), "Greater Calm Waters");
        assert_eq!(stage_name(12), "Extreme Reef Waters");
        assert_eq!(stage_name(100), "Infinite The Abyss");
    }

    #[test]
    fn test_cumulative_unlocks() {
        let all = AssetManifest::all();
        assert_eq!(obstacles_for_stage(1, &all).len(), 2);
        assert_eq!(obstacles_for_stage(2, &all).len(), 4);
        // Stage 3 also unlocks the special set
        let third = obstacles_for_stage(3, &all);
        assert_eq!(third.len(), 8);
        assert!(third.contains(&ObstacleKind::ElectricEel));
        assert_eq!(obstacles_for_stage(5, &all).len(), 10);
        assert_eq!(obstacles_for_stage(6, &all).len(), 12);
    }

    #[test]
    fn test_obstacle_fallbacks() {
        let trash_only = AssetManifest::from_keys(["trash.png", "shark.gif"]);
        assert_eq!(obstacles_for_stage(2, &trash_only), vec![ObstacleKind::Trash]);
        assert_eq!(
            obstacles_for_stage(4, &trash_only),
            vec![ObstacleKind::Trash, ObstacleKind::Shark]
        );
        assert_eq!(obstacles_for_stage(9, &AssetManifest::empty()), vec![ObstacleKind::Rock]);
    }

    #[test]
    fn test_background_fallbacks() {
        let all = AssetManifest::all();
        assert_eq!(background_for_stage(7, &all), Background::Image("reef-waters.png"));

        let some = AssetManifest::from_keys(["deep-sea.png"]);
        assert_eq!(background_for_stage(1, &some), Background::Image("deep-sea.png"));

        assert_eq!(
            background_for_stage(1, &AssetManifest::empty()),
            Background::Gradient(DEFAULT_GRADIENT)
        );
    }

    #[test]
    fn test_effects() {
        assert!(stage_effects(3).is_empty());
        assert_eq!(stage_effects(4), vec![StageEffect::Storm]);
        assert_eq!(
            stage_effects(10),
            vec![StageEffect::Storm, StageEffect::Darkness, StageEffect::Boss]
        );
    }

    #[test]
    fn test_thresholds_past_stage_100_keep_growing() {
        let at_64 = points_required_for_stage(64);
        assert_eq!(at_64, (100.0 * 1.5f64.powi(63)).floor() as u64);
        assert!(points_required_for_stage(100) > at_64);
        assert!(points_required_for_stage(150) > points_required_for_stage(100));
        assert!(points_required_for_stage(1_000) < u64::MAX);
    }

    proptest! {
        #[test]
        fn prop_thresholds_strictly_increase(stage in 1u32..400) {
            prop_assert!(points_required_for_stage(stage + 1) > points_required_for_stage(stage));
        }
    }
}
