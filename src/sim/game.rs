//! Game session
//!
//! Owns the state aggregate, the entity stores, the pools, the spawner and
//! the seeded RNG. The host drives it one display frame at a time and drains
//! the event outbox afterwards.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::assets::AssetManifest;
use super::clock::{FrameClock, LoopControl};
use super::entity::Entities;
use super::event::GameEvent;
use super::pool::ObjectPool;
use super::spawn::Spawner;
use super::stage::{StageConfig, StageRules};
use super::state::{GamePhase, GameState};
use super::tick::{self, TickInput};
use crate::consts::POOL_TRIM_INTERVAL_MS;
use crate::persistence::{FishPosition, GameSnapshot};
use crate::settings::Difficulty;

/// One play session, from the title screen through any number of restarts
#[derive(Debug, Clone)]
pub struct Game {
    pub state: GameState,
    pub entities: Entities,
    pub pools: ObjectPool,
    pub spawner: Spawner,
    /// Config for the current stage
    pub stage: StageConfig,
    pub rules: StageRules,
    pub(crate) assets: AssetManifest,
    pub(crate) rng: Pcg32,
    pub(crate) events: Vec<GameEvent>,
    clock: FrameClock,
    seed: u64,
    session_id: String,
    /// Wall-clock time of the last pool trim
    last_trim_ms: Option<f64>,
}

impl Game {
    pub fn new(seed: u64, assets: AssetManifest) -> Self {
        let rules = StageRules::default();
        let stage = StageConfig::with_rules(1, &rules, &assets);
        let mut state = GameState::default();
        state.apply_stage(&stage);

        Self {
            state,
            entities: Entities::default(),
            pools: ObjectPool::prefilled(),
            spawner: Spawner::default(),
            stage,
            rules,
            assets,
            rng: Pcg32::seed_from_u64(seed),
            events: Vec::new(),
            clock: FrameClock::new(),
            seed,
            session_id: String::new(),
            last_trim_ms: None,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase()
    }

    pub fn assets(&self) -> &AssetManifest {
        &self.assets
    }

    /// Replace the asset manifest (e.g. once preloading finishes)
    pub fn set_assets(&mut self, assets: AssetManifest) {
        self.assets = assets;
        self.stage = StageConfig::with_rules(self.state.stage, &self.rules, &self.assets);
    }

    /// Idle → Running with a fresh session
    pub fn start(&mut self) -> bool {
        if self.state.phase() != GamePhase::Idle {
            return false;
        }
        self.stage = StageConfig::with_rules(1, &self.rules, &self.assets);
        if !self.state.begin(&self.stage, &mut self.events) {
            return false;
        }
        self.begin_session();
        true
    }

    /// Idle → Running, continuing a saved session
    pub fn resume_from(&mut self, snapshot: &GameSnapshot) -> bool {
        if self.state.phase() != GamePhase::Idle {
            return false;
        }
        self.state.difficulty = snapshot.difficulty;
        self.stage = StageConfig::with_rules(snapshot.current_stage, &self.rules, &self.assets);
        if !self.state.begin(&self.stage, &mut self.events) {
            return false;
        }
        self.state.restore_fields(
            snapshot.score,
            snapshot.high_score,
            snapshot.lives,
            Vec2::new(snapshot.fish_position.left, snapshot.fish_position.bottom),
            snapshot.difficulty,
        );
        self.begin_session();
        log::info!(
            "Resumed at stage {} with score {}",
            self.state.stage,
            self.state.score
        );
        true
    }

    fn begin_session(&mut self) {
        self.spawner.schedule_start(&mut self.rng);
        self.clock.reset();
        self.session_id = format!("{:016x}", self.rng.random::<u64>());
    }

    /// Ended → Idle → Running. Every entity goes back to its pool first.
    pub fn restart(&mut self) -> bool {
        if !self.state.is_game_over() {
            log::warn!("Restart ignored while {:?}", self.state.phase());
            return false;
        }
        self.entities.clear_into(&mut self.pools);
        self.pools.reset();
        self.spawner.clear();
        self.state.reset_to_idle();
        log::info!("Restarting");
        self.start()
    }

    /// Running ⇄ Paused
    pub fn toggle_pause(&mut self) -> bool {
        self.state.toggle_pause(&mut self.events)
    }

    /// Pause if running; used when the page is hidden
    pub fn pause(&mut self) -> bool {
        self.state.is_running() && self.toggle_pause()
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.state.set_difficulty(difficulty, &self.stage);
    }

    pub fn set_viewport(&mut self, size: Vec2) {
        self.state.set_viewport(size);
    }

    /// Run one display frame at wall-clock time `now` (ms)
    pub fn frame(&mut self, now: f64, input: &TickInput) -> LoopControl {
        let dt = self.clock.tick(now);

        match self.last_trim_ms {
            None => self.last_trim_ms = Some(now),
            Some(last) if now - last >= POOL_TRIM_INTERVAL_MS => {
                self.trim_pools();
                self.last_trim_ms = Some(now);
            }
            Some(_) => {}
        }

        self.step(dt, input);

        if self.state.is_game_over() {
            LoopControl::Stop
        } else {
            LoopControl::Continue
        }
    }

    /// Advance the simulation by `dt` ms, bypassing the frame clock
    pub fn step(&mut self, dt: f32, input: &TickInput) {
        tick::step(self, input, dt);
    }

    pub(crate) fn trim_pools(&mut self) {
        let discarded = self.pools.trim();
        if discarded > 0 {
            self.events.push(GameEvent::PoolsTrimmed { discarded });
        }
    }

    /// Events produced since the last drain
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Capture the resumable part of a session in play
    pub fn snapshot(&self, timestamp_ms: f64) -> Option<GameSnapshot> {
        if !self.state.is_game_started() {
            return None;
        }
        Some(GameSnapshot {
            score: self.state.score,
            high_score: self.state.high_score,
            lives: self.state.lives,
            current_stage: self.state.stage,
            fish_position: FishPosition {
                left: self.state.fish.x,
                bottom: self.state.fish.y,
            },
            difficulty: self.state.difficulty,
            timestamp: timestamp_ms,
            session_id: self.session_id.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::sim::entity::MotionPattern;
    use crate::sim::event::{MusicCommand, SoundCue};
    use crate::sim::pool::PoolKind;
    use crate::sim::spawn;

    fn running_game(seed: u64) -> Game {
        let mut game = Game::new(seed, AssetManifest::all());
        assert!(game.start());
        game
    }

    /// Put an unshielded obstacle right on top of the fish
    fn ram_fish(game: &mut Game) {
        spawn::spawn_obstacle(game);
        let fish = game.state.fish;
        let entry = game.entities.obstacles.iter_mut().last().unwrap();
        entry.data.pos = fish;
        entry.data.start_y = fish.y;
        entry.data.pattern = MotionPattern::Linear;
        entry.data.behavior = crate::sim::entity::ObstacleKind::Rock.behavior();
    }

    #[test]
    fn test_start_emits_stage_one() {
        let mut game = running_game(1);
        let events = game.drain_events();
        assert!(events.contains(&GameEvent::Music(MusicCommand::PlayStage(1))));
        assert!(events.iter().any(|e| matches!(e, GameEvent::StageChanged { stage: 1, .. })));
        assert_eq!(game.state.lives, 3.0);
        assert!(!game.session_id().is_empty());
    }

    #[test]
    fn test_stage_one_to_two_at_150() {
        let mut game = running_game(2);
        game.state.score = 149;
        game.drain_events();
        tick::score_point(&mut game);

        assert_eq!(game.state.stage, 2);
        assert!((game.stage.speed_multiplier - 1.2).abs() < 1e-6);
        let changes = game
            .drain_events()
            .iter()
            .filter(|e| matches!(e, GameEvent::StageChanged { .. }))
            .count();
        assert_eq!(changes, 1);

        tick::score_point(&mut game);
        assert_eq!(game.state.stage, 2);
    }

    #[test]
    fn test_lives_exhaustion_ends_run() {
        let mut game = running_game(3);
        for hit in 1..=3 {
            ram_fish(&mut game);
            game.step(16.0, &TickInput::default());
            assert_eq!(game.state.lives, 3.0 - hit as f32);
            if hit < 3 {
                assert!(game.state.is_invulnerable());
                game.state.advance_timers(INVULNERABILITY_DURATION_MS);
            }
        }
        assert_eq!(game.phase(), GamePhase::Ended);
        assert!(game.events().contains(&GameEvent::Sound(SoundCue::GameOver)));
        assert_eq!(game.frame(1000.0, &TickInput::default()), LoopControl::Stop);
    }

    #[test]
    fn test_pause_freezes_everything() {
        let mut game = running_game(4);
        for _ in 0..200 {
            game.step(16.0, &TickInput::default());
        }
        assert!(game.toggle_pause());

        let obstacles: Vec<_> = game.entities.obstacles.iter().map(|e| e.data.pos).collect();
        let bubbles: Vec<_> = game.entities.bubbles.iter().map(|e| e.data.pos).collect();
        let elapsed = game.state.elapsed_ms;
        let fish = game.state.fish;

        let mut now = 0.0;
        for _ in 0..100 {
            now += 16.0;
            assert_eq!(game.frame(now, &TickInput::moving(1.0, 1.0)), LoopControl::Continue);
        }

        let after: Vec<_> = game.entities.obstacles.iter().map(|e| e.data.pos).collect();
        assert_eq!(after, obstacles);
        let after: Vec<_> = game.entities.bubbles.iter().map(|e| e.data.pos).collect();
        assert_eq!(after, bubbles);
        assert_eq!(game.state.elapsed_ms, elapsed);
        assert_eq!(game.state.fish, fish);

        assert!(game.toggle_pause());
        game.step(16.0, &TickInput::moving(1.0, 0.0));
        assert_ne!(game.state.fish, fish);
    }

    #[test]
    fn test_restart_resets_everything() {
        let mut game = running_game(5);
        for _ in 0..300 {
            game.step(16.0, &TickInput::default());
        }
        game.state.add_score(42, &mut Vec::new());
        game.state.lives = 1.0;
        game.state.advance_timers(INVULNERABILITY_DURATION_MS);
        ram_fish(&mut game);
        game.step(16.0, &TickInput::default());
        assert!(game.state.is_game_over());

        assert!(game.restart());
        assert_eq!(game.state.score, 0);
        assert_eq!(game.state.lives, 3.0);
        assert_eq!(game.state.stage, 1);
        assert!(game.state.high_score >= 42);
        assert!(game.entities.is_empty());
        for kind in PoolKind::ALL {
            assert_eq!(game.pools.available(kind), kind.prefill());
        }
        assert!(game.state.is_running());
    }

    #[test]
    fn test_restart_only_from_ended() {
        let mut game = running_game(6);
        assert!(!game.restart());
        assert!(!game.start());
    }

    #[test]
    fn test_power_up_clears_after_exactly_5000ms() {
        let mut game = running_game(7);
        game.state.activate_power_up(&mut Vec::new());
        for _ in 0..499 {
            game.step(10.0, &TickInput::default());
            assert!(game.state.is_powered_up() || game.state.is_game_over());
        }
        assert!(game.state.is_powered_up());
        game.step(10.0, &TickInput::default());
        assert!(!game.state.is_powered_up());
    }

    #[test]
    fn test_at_most_three_crabs() {
        let mut game = running_game(8);
        game.state.activate_power_up(&mut Vec::new());
        for _ in 0..2000 {
            game.step(50.0, &TickInput::default());
            assert!(game.entities.crabs.len() <= MAX_CRABS);
            game.state.activate_power_up(&mut Vec::new());
        }
    }

    #[test]
    fn test_opening_crabs_arrive_within_two_seconds() {
        let mut game = running_game(9);
        game.spawner.config.crab_chance = 0.0;
        for _ in 0..41 {
            game.step(50.0, &TickInput::default());
        }
        assert_eq!(game.entities.crabs.len(), INITIAL_CRABS);
    }

    #[test]
    fn test_same_seed_same_run() {
        let run = |seed| {
            let mut game = running_game(seed);
            game.state.activate_power_up(&mut Vec::new());
            for _ in 0..300 {
                game.step(16.0, &TickInput::default());
            }
            game.entities
                .obstacles
                .iter()
                .map(|e| (e.data.kind, e.data.pos))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(11), run(11));
    }

    #[test]
    fn test_snapshot_and_resume() {
        let mut game = running_game(12);
        game.state.score = 30;
        game.state.lives = 2.0;
        game.state.stage = 2;
        game.state.fish = Vec2::new(200.0, 100.0);
        let snapshot = game.snapshot(1_000.0).unwrap();
        assert_eq!(snapshot.current_stage, 2);

        let mut resumed = Game::new(13, AssetManifest::all());
        assert!(resumed.resume_from(&snapshot));
        assert_eq!(resumed.state.score, 30);
        assert_eq!(resumed.state.lives, 2.0);
        assert_eq!(resumed.state.stage, 2);
        assert_eq!(resumed.state.fish, Vec2::new(200.0, 100.0));
        assert!((resumed.stage.speed_multiplier - 1.2).abs() < 1e-6);

        assert!(Game::new(1, AssetManifest::all()).snapshot(0.0).is_none());
    }

    #[test]
    fn test_pool_trim_runs_on_wall_clock() {
        let mut game = running_game(14);
        let sprites: Vec<_> = (0..28).map(|_| game.pools.acquire(PoolKind::Bubble)).collect();
        for sprite in sprites {
            game.pools.release(sprite, PoolKind::Bubble);
        }
        game.toggle_pause();
        game.frame(0.0, &TickInput::default());
        game.frame(29_000.0, &TickInput::default());
        assert!(game.pools.available(PoolKind::Bubble) > POOL_TRIM_TARGET);
        game.frame(30_000.0, &TickInput::default());
        assert_eq!(game.pools.available(PoolKind::Bubble), POOL_TRIM_TARGET);
    }
}
