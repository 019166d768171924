//! Time-gated entity spawning
//!
//! Each category has its own gate keyed on simulated time, so pausing the
//! game freezes every spawn schedule with it.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::entity::{Bubble, Crab, MotionPattern, Obstacle, ObstacleKind, Pearl, PowerUp};
use super::event::{GameEvent, SoundCue};
use super::game::Game;
use super::pool::{PoolKind, Spin, SpriteId};
use super::stage::StageEffect;
use crate::consts::*;

/// Tunable spawn cadence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnConfig {
    pub bubble_interval_ms: f64,
    pub bubble_chance: f64,
    pub power_up_interval_ms: f64,
    pub power_up_chance: f64,
    pub crab_interval_ms: f64,
    pub crab_chance: f64,
    /// Life pick-ups arrive after a random delay in this range, no draw
    pub life_min_delay_ms: f64,
    pub life_max_delay_ms: f64,
    /// Thunder during storm stages
    pub thunder_interval_ms: f64,
    pub thunder_chance: f64,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            bubble_interval_ms: 500.0,
            bubble_chance: 0.7,
            power_up_interval_ms: 15_000.0,
            power_up_chance: 0.1,
            crab_interval_ms: 3000.0,
            crab_chance: 0.3,
            life_min_delay_ms: 20_000.0,
            life_max_delay_ms: 40_000.0,
            thunder_interval_ms: 8000.0,
            thunder_chance: 0.3,
        }
    }
}

/// Interval-plus-chance gate
///
/// Opens once `interval` has passed since it last opened and a random draw
/// lands under `chance`. A failed draw leaves the gate armed for the next frame.
#[derive(Debug, Clone, Default)]
pub struct SpawnGate {
    last_ms: f64,
}

impl SpawnGate {
    pub fn ready<R: Rng>(&mut self, now: f64, interval_ms: f64, chance: f64, rng: &mut R) -> bool {
        if now - self.last_ms <= interval_ms {
            return false;
        }
        if chance < 1.0 && rng.random::<f64>() >= chance {
            return false;
        }
        self.last_ms = now;
        true
    }

    pub fn reset(&mut self) {
        self.last_ms = 0.0;
    }

    /// Open on the next check regardless of the interval
    pub fn make_due(&mut self) {
        self.last_ms = f64::NEG_INFINITY;
    }
}

/// Spawn schedules for every category
#[derive(Debug, Clone)]
pub struct Spawner {
    pub config: SpawnConfig,
    obstacles: SpawnGate,
    bubbles: SpawnGate,
    power_ups: SpawnGate,
    crabs: SpawnGate,
    thunder: SpawnGate,
    next_life_ms: f64,
    /// Simulated times at which the opening crabs walk in
    pending_crabs: Vec<f64>,
}

impl Default for Spawner {
    fn default() -> Self {
        Self::new(SpawnConfig::default())
    }
}

impl Spawner {
    pub fn new(config: SpawnConfig) -> Self {
        Self {
            config,
            obstacles: SpawnGate::default(),
            bubbles: SpawnGate::default(),
            power_ups: SpawnGate::default(),
            crabs: SpawnGate::default(),
            thunder: SpawnGate::default(),
            next_life_ms: f64::INFINITY,
            pending_crabs: Vec::new(),
        }
    }

    /// Rearm every gate for a run starting at simulated time zero
    pub fn schedule_start<R: Rng>(&mut self, rng: &mut R) {
        for gate in [
            &mut self.obstacles,
            &mut self.bubbles,
            &mut self.power_ups,
            &mut self.crabs,
            &mut self.thunder,
        ] {
            gate.reset();
        }
        // First obstacle enters on the opening frame
        self.obstacles.make_due();
        self.schedule_life(0.0, rng);
        self.pending_crabs = (0..INITIAL_CRABS)
            .map(|_| rng.random::<f64>() * INITIAL_CRAB_DELAY_MAX_MS as f64)
            .collect();
    }

    /// Drop everything scheduled
    pub fn clear(&mut self) {
        self.next_life_ms = f64::INFINITY;
        self.pending_crabs.clear();
    }

    fn schedule_life<R: Rng>(&mut self, now: f64, rng: &mut R) {
        let span = self.config.life_max_delay_ms - self.config.life_min_delay_ms;
        self.next_life_ms = now + self.config.life_min_delay_ms + rng.random::<f64>() * span;
    }

    /// Restart the obstacle interval from `now`
    pub fn restart_obstacles(&mut self, now: f64) {
        self.obstacles.last_ms = now;
    }

    pub fn next_life_ms(&self) -> f64 {
        self.next_life_ms
    }

    pub fn pending_crabs(&self) -> usize {
        self.pending_crabs.len()
    }
}

/// Run every spawn gate once for the current simulated time
pub fn run(game: &mut Game) {
    if !game.state.is_running() {
        return;
    }
    let now = game.state.elapsed_ms;
    let config = game.spawner.config;

    let interval = game.state.obstacle_interval as f64;
    if game.spawner.obstacles.ready(now, interval, 1.0, &mut game.rng) {
        spawn_obstacle(game);
    }

    if game
        .spawner
        .bubbles
        .ready(now, config.bubble_interval_ms, config.bubble_chance, &mut game.rng)
    {
        spawn_bubble(game);
    }

    if game.spawner.power_ups.ready(
        now,
        config.power_up_interval_ms,
        config.power_up_chance,
        &mut game.rng,
    ) {
        spawn_power_up(game, false);
    }

    if now >= game.spawner.next_life_ms {
        spawn_power_up(game, true);
        game.spawner.schedule_life(now, &mut game.rng);
    }

    let due = game.spawner.pending_crabs.iter().filter(|&&at| at <= now).count();
    if due > 0 {
        game.spawner.pending_crabs.retain(|&at| at > now);
        for _ in 0..due {
            if game.entities.crabs.len() < MAX_CRABS {
                spawn_crab(game);
            }
        }
    }

    if game.entities.crabs.len() < MAX_CRABS
        && game
            .spawner
            .crabs
            .ready(now, config.crab_interval_ms, config.crab_chance, &mut game.rng)
    {
        spawn_crab(game);
    }

    if game.stage.has_effect(StageEffect::Storm)
        && game.spawner.thunder.ready(
            now,
            config.thunder_interval_ms,
            config.thunder_chance,
            &mut game.rng,
        )
    {
        game.events.push(GameEvent::Sound(SoundCue::Thunder));
    }
}

/// Uniform draw in [min, max)
fn range<R: Rng>(rng: &mut R, min: f32, max: f32) -> f32 {
    min + rng.random::<f32>() * (max - min)
}

/// Launch an obstacle from the right edge at a random height
pub fn spawn_obstacle(game: &mut Game) -> SpriteId {
    let Game {
        state,
        stage,
        entities,
        pools,
        rng,
        ..
    } = game;

    let kinds = &stage.obstacle_types;
    let kind = kinds
        .get(rng.random_range(0..kinds.len().max(1)))
        .copied()
        .unwrap_or(ObstacleKind::Rock);
    let behavior = kind.behavior();

    let max_y = (state.viewport.y - OBSTACLE_SIZE).max(0.0);
    let y = rng.random::<f32>() * max_y;

    let base = range(rng, OBSTACLE_BASE_SPEED_MIN, OBSTACLE_BASE_SPEED_MAX);
    let jitter = 1.0 + (rng.random::<f32>() - 0.5) * 2.0 * OBSTACLE_SPEED_JITTER;
    let speed = base * state.obstacle_speed / BASE_OBSTACLE_SPEED * jitter * behavior.speed;

    let amplitude = range(rng, OBSTACLE_AMPLITUDE_MIN, OBSTACLE_AMPLITUDE_MAX);
    let frequency = range(rng, OBSTACLE_FREQUENCY_MIN, OBSTACLE_FREQUENCY_MAX);
    let pattern = if rng.random::<f32>() > 0.7 {
        MotionPattern::Zigzag {
            amplitude,
            frequency,
        }
    } else {
        MotionPattern::Sine {
            amplitude,
            frequency,
        }
    };

    let mut sprite = pools.acquire(PoolKind::Obstacle);
    sprite.variant = Some(kind.asset_key());
    sprite.width = OBSTACLE_SIZE;
    sprite.height = OBSTACLE_SIZE;
    if kind.spins() {
        sprite.spin = Some(Spin {
            period_secs: rng.random::<f32>() * 2.0 + 1.0,
            reverse: rng.random_bool(0.5),
        });
    }

    log::debug!("Spawned {:?} at y={:.0} speed={:.2}", kind, y, speed);
    entities.obstacles.insert(
        sprite,
        Obstacle {
            kind,
            pos: Vec2::new(state.viewport.x, y),
            start_y: y,
            speed,
            behavior,
            phase: 0.0,
            pattern,
            ability_cooldown_ms: behavior.ability.map(|a| a.cooldown_ms()).unwrap_or(0.0),
        },
    )
}

/// Release a bubble from the sea floor
pub fn spawn_bubble(game: &mut Game) -> SpriteId {
    let Game {
        state,
        entities,
        pools,
        rng,
        ..
    } = game;

    let size = range(rng, BUBBLE_MIN_SIZE, BUBBLE_MAX_SIZE);
    let x = rng.random::<f32>() * (state.viewport.x - 30.0).max(0.0);
    let speed = rng.random::<f32>() * 10.0 + 5.0;

    let mut sprite = pools.acquire(PoolKind::Bubble);
    sprite.variant = Some("bubble.png");
    sprite.width = size;
    sprite.height = size;
    sprite.opacity = rng.random::<f32>() * 0.4 + 0.4;

    entities.bubbles.insert(
        sprite,
        Bubble {
            pos: Vec2::new(x, 0.0),
            speed,
            size,
        },
    )
}

/// Send a crab walking in from a random side
pub fn spawn_crab(game: &mut Game) -> SpriteId {
    let Game {
        state,
        entities,
        pools,
        rng,
        ..
    } = game;

    let from_left = rng.random_bool(0.5);
    let (x, direction) = if from_left {
        (-100.0, 1.0)
    } else {
        (state.viewport.x, -1.0)
    };

    let mut sprite = pools.acquire(PoolKind::Crab);
    sprite.variant = Some("crab.gif");
    sprite.width = CRAB_WIDTH;
    sprite.height = CRAB_HEIGHT;

    log::debug!("Crab entering from the {}", if from_left { "left" } else { "right" });
    entities.crabs.insert(
        sprite,
        Crab {
            pos: Vec2::new(x, 0.0),
            direction,
            speed: CRAB_SPEED,
            since_last_pearl_ms: 0.0,
            next_pearl_delay_ms: pearl_delay(rng),
        },
    )
}

/// Random wait before a crab's next pearl
pub fn pearl_delay<R: Rng>(rng: &mut R) -> f32 {
    range(rng, PEARL_MIN_DELAY_MS, PEARL_MAX_DELAY_MS)
}

/// Fire a pearl straight up from `x`
pub fn spawn_pearl(game: &mut Game, x: f32) -> SpriteId {
    let mut sprite = game.pools.acquire(PoolKind::Pearl);
    sprite.width = PEARL_SIZE;
    sprite.height = PEARL_SIZE;

    game.entities.pearls.insert(
        sprite,
        Pearl {
            pos: Vec2::new(x, 0.0),
            speed: PEARL_SPEED,
            age_ms: 0.0,
        },
    )
}

/// Float an invincibility star or an extra life in from the right edge
pub fn spawn_power_up(game: &mut Game, is_life: bool) -> SpriteId {
    let Game {
        state,
        entities,
        pools,
        rng,
        ..
    } = game;

    let y = rng.random::<f32>() * (state.viewport.y - POWER_UP_SIZE).max(0.0);
    let data = PowerUp {
        pos: Vec2::new(state.viewport.x, y),
        speed: POWER_UP_SPEED,
        is_life,
    };

    let mut sprite = pools.acquire(data.pool_kind());
    sprite.width = POWER_UP_SIZE;
    sprite.height = POWER_UP_SIZE;

    log::debug!("Spawned {} pick-up", if is_life { "life" } else { "power-up" });
    entities.power_ups.insert(sprite, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::assets::AssetManifest;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_gate_waits_for_interval() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut gate = SpawnGate::default();
        assert!(!gate.ready(500.0, 500.0, 1.0, &mut rng));
        assert!(gate.ready(501.0, 500.0, 1.0, &mut rng));
        assert!(!gate.ready(900.0, 500.0, 1.0, &mut rng));
        assert!(gate.ready(1002.0, 500.0, 1.0, &mut rng));
    }

    #[test]
    fn test_gate_with_zero_chance_never_opens() {
        let mut rng = Pcg32::seed_from_u64(2);
        let mut gate = SpawnGate::default();
        for t in 0..100 {
            assert!(!gate.ready(t as f64 * 1000.0, 10.0, 0.0, &mut rng));
        }
    }

    #[test]
    fn test_schedule_start_queues_two_crabs() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut spawner = Spawner::default();
        spawner.schedule_start(&mut rng);
        assert_eq!(spawner.pending_crabs(), INITIAL_CRABS);
        assert!(spawner.next_life_ms() >= 20_000.0);
        assert!(spawner.next_life_ms() < 40_000.0);
    }

    #[test]
    fn test_first_obstacle_arrives_on_opening_step() {
        let mut game = Game::new(4, AssetManifest::all());
        assert!(game.start());
        assert!(game.entities.obstacles.is_empty());
        game.step(16.0, &crate::sim::TickInput::default());
        assert_eq!(game.entities.obstacles.len(), 1);
        game.step(16.0, &crate::sim::TickInput::default());
        assert_eq!(game.entities.obstacles.len(), 1);
    }

    #[test]
    fn test_spawned_obstacle_uses_stage_kinds() {
        let mut game = Game::new(7, AssetManifest::all());
        game.start();
        for _ in 0..20 {
            spawn_obstacle(&mut game);
        }
        assert_eq!(game.entities.obstacles.len(), 20);
        for entry in game.entities.obstacles.iter() {
            assert!(game.stage.obstacle_types.contains(&entry.data.kind));
            assert!(entry.sprite.visible);
            assert_eq!(entry.data.pos.x, game.state.viewport.x);
            assert!(entry.data.pos.y <= game.state.viewport.y - OBSTACLE_SIZE);
        }
    }

    #[test]
    fn test_missing_assets_fall_back_to_rocks() {
        let mut game = Game::new(7, AssetManifest::empty());
        game.start();
        spawn_obstacle(&mut game);
        let entry = game.entities.obstacles.iter().next().unwrap();
        assert_eq!(entry.data.kind, ObstacleKind::Rock);
        assert_eq!(entry.sprite.variant, Some("rock.png"));
    }

    #[test]
    fn test_life_pick_up_uses_its_own_pool() {
        let mut game = Game::new(7, AssetManifest::all());
        game.start();
        let before = game.pools.available(PoolKind::LifePowerUp);
        spawn_power_up(&mut game, true);
        assert_eq!(game.pools.available(PoolKind::LifePowerUp), before - 1);
        assert_eq!(game.pools.available(PoolKind::PowerUp), PoolKind::PowerUp.prefill());
    }
}
