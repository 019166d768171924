//! Game state and its transitions
//!
//! Every flag the game loop reads lives here, and all mutation goes through
//! the transition methods so the phase table stays consistent.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Rect;
use super::event::{Announcement, GameEvent, HapticPattern, MusicCommand, SoundCue};
use super::stage::StageConfig;
use super::timer::Timer;
use crate::consts::*;
use crate::settings::Difficulty;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GamePhase {
    /// Waiting for the first start
    #[default]
    Idle,
    /// Active gameplay
    Running,
    /// Game is paused; nothing moves and no timers advance
    Paused,
    /// Lives ran out; terminal until restart
    Ended,
}

/// The session aggregate owned by the game loop
#[derive(Debug, Clone)]
pub struct GameState {
    pub score: u64,
    /// Never decreases
    pub high_score: u64,
    /// Fractional damage is possible
    pub lives: f32,
    pub stage: u32,
    pub difficulty: Difficulty,
    /// Player bottom-left corner, y up
    pub fish: Vec2,
    /// Play area size
    pub viewport: Vec2,
    /// Current obstacle speed (pixels per 60 Hz frame, before per-spawn variation)
    pub obstacle_speed: f32,
    /// Current obstacle spawn interval in milliseconds
    pub obstacle_interval: f32,
    /// Simulated milliseconds since the run began; frozen while paused
    pub elapsed_ms: f64,
    /// Stage baselines the score ramp is bounded against
    stage_speed: f32,
    stage_interval: f32,
    phase: GamePhase,
    invulnerability: Option<Timer>,
    power_up: Option<Timer>,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            score: 0,
            high_score: 0,
            lives: START_LIVES,
            stage: 1,
            difficulty: Difficulty::Normal,
            fish: Vec2::new(FISH_START_LEFT, FISH_START_BOTTOM),
            viewport: Vec2::new(DEFAULT_VIEWPORT_WIDTH, DEFAULT_VIEWPORT_HEIGHT),
            obstacle_speed: BASE_OBSTACLE_SPEED,
            obstacle_interval: BASE_OBSTACLE_INTERVAL_MS,
            elapsed_ms: 0.0,
            stage_speed: BASE_OBSTACLE_SPEED,
            stage_interval: BASE_OBSTACLE_INTERVAL_MS,
            phase: GamePhase::Idle,
            invulnerability: None,
            power_up: None,
        }
    }
}

impl GameState {
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == GamePhase::Running
    }

    pub fn is_game_started(&self) -> bool {
        matches!(self.phase, GamePhase::Running | GamePhase::Paused)
    }

    pub fn is_paused(&self) -> bool {
        self.phase == GamePhase::Paused
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == GamePhase::Ended
    }

    pub fn is_powered_up(&self) -> bool {
        self.power_up.is_some()
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invulnerability.is_some()
    }

    /// Idle → Running. Returns false if the game was not idle.
    pub fn begin(&mut self, config: &StageConfig, out: &mut Vec<GameEvent>) -> bool {
        if self.phase != GamePhase::Idle {
            log::warn!("Ignoring start while {:?}", self.phase);
            return false;
        }

        self.score = 0;
        self.lives = self.difficulty.lives();
        self.fish = Vec2::new(FISH_START_LEFT, FISH_START_BOTTOM);
        self.elapsed_ms = 0.0;
        self.invulnerability = None;
        self.power_up = None;
        self.apply_stage(config);
        self.phase = GamePhase::Running;

        log::info!(
            "Game started on {} with {} lives",
            self.difficulty.as_str(),
            self.lives
        );
        out.push(GameEvent::Announce(Announcement::GameStarted));
        out.push(GameEvent::Music(MusicCommand::PlayStage(self.stage)));
        out.push(GameEvent::StageChanged {
            stage: config.stage,
            name: config.name.clone(),
            background: config.background.clone(),
        });
        true
    }

    /// Back to Idle with a fresh session. High score, difficulty and viewport carry over.
    pub fn reset_to_idle(&mut self) {
        *self = Self {
            high_score: self.high_score,
            difficulty: self.difficulty,
            viewport: self.viewport,
            lives: self.difficulty.lives(),
            ..Self::default()
        };
    }

    /// Running ⇄ Paused. Returns true if the phase changed.
    pub fn toggle_pause(&mut self, out: &mut Vec<GameEvent>) -> bool {
        let paused = match self.phase {
            GamePhase::Running => true,
            GamePhase::Paused => false,
            _ => return false,
        };
        self.phase = if paused {
            GamePhase::Paused
        } else {
            GamePhase::Running
        };
        out.push(GameEvent::Announce(Announcement::Paused(paused)));
        true
    }

    /// Terminal transition to Ended
    pub fn end(&mut self, out: &mut Vec<GameEvent>) {
        if !self.is_game_started() {
            return;
        }
        self.phase = GamePhase::Ended;
        self.invulnerability = None;
        self.power_up = None;

        log::info!("Game over at stage {} with score {}", self.stage, self.score);
        out.push(GameEvent::Music(MusicCommand::Stop));
        out.push(GameEvent::Sound(SoundCue::GameOver));
        out.push(GameEvent::Announce(Announcement::GameOver { score: self.score }));
        out.push(GameEvent::GameOver { score: self.score });
    }

    /// Add points, tracking the high score
    pub fn add_score(&mut self, points: u64, out: &mut Vec<GameEvent>) {
        self.score += points;
        out.push(GameEvent::Sound(SoundCue::ScorePoint));
        out.push(GameEvent::Announce(Announcement::Score(self.score)));
        if self.score > self.high_score {
            self.high_score = self.score;
            out.push(GameEvent::HighScore(self.high_score));
        }
    }

    /// Take on a stage's number and recompute obstacle speed and interval
    pub fn apply_stage(&mut self, config: &StageConfig) {
        self.stage = config.stage;
        self.stage_speed = BASE_OBSTACLE_SPEED * config.speed_multiplier * self.difficulty.speed();
        self.stage_interval = BASE_OBSTACLE_INTERVAL_MS * self.difficulty.interval()
            / config.spawn_rate_multiplier;
        self.obstacle_speed = self.stage_speed;
        self.obstacle_interval = self.stage_interval;
    }

    /// Score ramp: faster, denser obstacles, bounded relative to the stage baseline
    pub fn ramp_difficulty(&mut self) {
        self.obstacle_speed = (self.obstacle_speed + 0.5).min(self.stage_speed * 1.5);
        self.obstacle_interval = (self.obstacle_interval - 100.0).max(self.stage_interval * 0.7);
    }

    /// Change difficulty. Before a run starts this also sets the starting lives.
    pub fn set_difficulty(&mut self, difficulty: Difficulty, config: &StageConfig) {
        self.difficulty = difficulty;
        self.apply_stage(config);
        if !self.is_game_started() && !self.is_game_over() {
            self.lives = difficulty.lives();
        }
    }

    /// Subtract lives, returning what is left. Never drops below zero.
    pub fn lose_lives(&mut self, amount: f32) -> f32 {
        self.lives = (self.lives - amount).max(0.0);
        self.lives
    }

    /// Add one life up to the cap. Returns false if already at the cap.
    pub fn gain_life(&mut self, out: &mut Vec<GameEvent>) -> bool {
        if self.lives >= MAX_LIVES {
            return false;
        }
        self.lives = (self.lives + 1.0).min(MAX_LIVES);
        out.push(GameEvent::Sound(SoundCue::LifePickup));
        out.push(GameEvent::Haptic(HapticPattern::PowerUp));
        out.push(GameEvent::Announce(Announcement::Lives {
            lives: self.lives,
            gained: true,
        }));
        true
    }

    pub fn start_invulnerability(&mut self) {
        self.invulnerability = Some(Timer::new(INVULNERABILITY_DURATION_MS));
    }

    /// Grant invincibility. A pickup while powered up restarts the window.
    pub fn activate_power_up(&mut self, out: &mut Vec<GameEvent>) {
        self.power_up = Some(Timer::new(POWER_UP_DURATION_MS));
        out.push(GameEvent::Sound(SoundCue::PowerUp));
        out.push(GameEvent::Haptic(HapticPattern::PowerUp));
        out.push(GameEvent::Announce(Announcement::PowerUp));
    }

    /// Count down the timed states, clearing those that expire
    pub fn advance_timers(&mut self, dt_ms: f32) {
        if let Some(timer) = &mut self.invulnerability {
            if timer.advance(dt_ms) {
                self.invulnerability = None;
            }
        }
        if let Some(timer) = &mut self.power_up {
            if timer.advance(dt_ms) {
                log::debug!("Power-up expired");
                self.power_up = None;
            }
        }
    }

    /// Seconds of power-up left, rounded up for the HUD
    pub fn power_seconds_left(&self) -> u32 {
        self.power_up
            .map(|t| (t.remaining() / 1000.0).ceil() as u32)
            .unwrap_or(0)
    }

    /// Player opacity: blinks while invulnerable
    pub fn fish_opacity(&self) -> f32 {
        match &self.invulnerability {
            Some(timer) if (timer.elapsed() / INVULNERABILITY_BLINK_MS) as u32 % 2 == 1 => 0.5,
            _ => 1.0,
        }
    }

    /// Glow pulse phase in [0, 1) while powered up
    pub fn power_pulse(&self) -> Option<f32> {
        self.power_up
            .map(|t| (t.elapsed() % POWER_UP_PULSE_MS) / POWER_UP_PULSE_MS)
    }

    /// Upper bound for the player's bottom-left corner
    fn fish_bounds(&self) -> Vec2 {
        (self.viewport - Vec2::new(FISH_WIDTH, FISH_HEIGHT)).max(Vec2::ZERO)
    }

    /// Move the player by `delta`, clamped to the play area
    pub fn move_fish(&mut self, delta: Vec2) {
        self.fish = (self.fish + delta).clamp(Vec2::ZERO, self.fish_bounds());
    }

    /// Resize the play area, pulling the player back inside
    pub fn set_viewport(&mut self, size: Vec2) {
        self.viewport = size.max(Vec2::ZERO);
        self.fish = self.fish.clamp(Vec2::ZERO, self.fish_bounds());
    }

    pub fn fish_rect(&self) -> Rect {
        Rect::new(self.fish.x, self.fish.y, FISH_WIDTH, FISH_HEIGHT)
    }

    /// Overlay a saved session's values on a freshly begun run
    pub(crate) fn restore_fields(
        &mut self,
        score: u64,
        high_score: u64,
        lives: f32,
        fish: Vec2,
        difficulty: Difficulty,
    ) {
        self.score = score;
        self.high_score = self.high_score.max(high_score).max(score);
        self.lives = lives.clamp(0.0, MAX_LIVES);
        self.difficulty = difficulty;
        self.fish = fish.clamp(Vec2::ZERO, self.fish_bounds());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::assets::AssetManifest;

    fn config(stage: u32) -> StageConfig {
        StageConfig::for_stage(stage, &AssetManifest::all())
    }

    #[test]
    fn test_phase_table() {
        let mut state = GameState::default();
        let mut out = Vec::new();
        assert_eq!(state.phase(), GamePhase::Idle);
        assert!(!state.toggle_pause(&mut out));

        assert!(state.begin(&config(1), &mut out));
        assert!(!state.begin(&config(1), &mut out));
        assert!(state.toggle_pause(&mut out));
        assert!(state.is_paused());
        assert!(state.toggle_pause(&mut out));
        assert!(state.is_running());

        state.end(&mut out);
        assert!(state.is_game_over());
        assert!(!state.toggle_pause(&mut out));

        state.reset_to_idle();
        assert_eq!(state.phase(), GamePhase::Idle);
    }

    #[test]
    fn test_high_score_never_decreases() {
        let mut state = GameState::default();
        let mut out = Vec::new();
        state.begin(&config(1), &mut out);
        state.add_score(7, &mut out);
        assert_eq!(state.high_score, 7);
        state.reset_to_idle();
        assert_eq!(state.score, 0);
        assert_eq!(state.high_score, 7);
        state.begin(&config(1), &mut out);
        state.add_score(3, &mut out);
        assert_eq!(state.high_score, 7);
    }

    #[test]
    fn test_life_gain_is_capped() {
        let mut state = GameState::default();
        let mut out = Vec::new();
        state.begin(&config(1), &mut out);
        assert!(state.gain_life(&mut out));
        assert!(state.gain_life(&mut out));
        assert_eq!(state.lives, MAX_LIVES);
        assert!(!state.gain_life(&mut out));
        assert_eq!(state.lives, MAX_LIVES);
    }

    #[test]
    fn test_lives_never_go_negative() {
        let mut state = GameState::default();
        state.begin(&config(1), &mut Vec::new());
        state.lives = 0.5;
        assert_eq!(state.lose_lives(2.0), 0.0);
        assert_eq!(state.lives, 0.0);
    }

    #[test]
    fn test_ramp_is_bounded() {
        let mut state = GameState::default();
        state.begin(&config(1), &mut Vec::new());
        for _ in 0..100 {
            state.ramp_difficulty();
        }
        assert_eq!(state.obstacle_speed, BASE_OBSTACLE_SPEED * 1.5);
        assert_eq!(state.obstacle_interval, BASE_OBSTACLE_INTERVAL_MS * 0.7);
    }

    #[test]
    fn test_stage_two_speed() {
        let mut state = GameState::default();
        state.apply_stage(&config(2));
        assert!((state.obstacle_speed - BASE_OBSTACLE_SPEED * 1.2).abs() < 1e-5);
    }

    #[test]
    fn test_difficulty_sets_lives_before_start_only() {
        let mut state = GameState::default();
        state.set_difficulty(Difficulty::Easy, &config(1));
        assert_eq!(state.lives, 5.0);
        state.begin(&config(1), &mut Vec::new());
        assert_eq!(state.lives, 5.0);
        state.set_difficulty(Difficulty::Hard, &config(1));
        assert_eq!(state.lives, 5.0);
        assert_eq!(state.obstacle_speed, BASE_OBSTACLE_SPEED * 1.5);
    }

    #[test]
    fn test_fish_is_clamped() {
        let mut state = GameState::default();
        state.move_fish(Vec2::new(-500.0, 5000.0));
        assert_eq!(state.fish, Vec2::new(0.0, DEFAULT_VIEWPORT_HEIGHT - FISH_HEIGHT));

        state.set_viewport(Vec2::new(400.0, 300.0));
        assert_eq!(state.fish, Vec2::new(0.0, 300.0 - FISH_HEIGHT));
    }

    #[test]
    fn test_invulnerability_blinks_then_clears() {
        let mut state = GameState::default();
        state.start_invulnerability();
        assert_eq!(state.fish_opacity(), 1.0);
        state.advance_timers(150.0);
        assert_eq!(state.fish_opacity(), 0.5);
        state.advance_timers(INVULNERABILITY_DURATION_MS);
        assert!(!state.is_invulnerable());
        assert_eq!(state.fish_opacity(), 1.0);
    }

    #[test]
    fn test_power_seconds_left() {
        let mut state = GameState::default();
        state.activate_power_up(&mut Vec::new());
        assert_eq!(state.power_seconds_left(), 5);
        state.advance_timers(4100.0);
        assert_eq!(state.power_seconds_left(), 1);
    }
}
