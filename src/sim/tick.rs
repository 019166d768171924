//! Per-frame simulation step
//!
//! Advances every entity population once, in a fixed order, by the clamped
//! frame delta. Speeds are expressed per 60 Hz frame and scaled by
//! `dt * FRAME_SCALE`.

use glam::Vec2;
use rand::Rng;

use super::collision::{Body, apply_damage, overlaps};
use super::entity::{Ability, Obstacle};
use super::event::{Announcement, GameEvent, HapticPattern, MusicCommand, SoundCue};
use super::game::Game;
use super::pool::PoolKind;
use super::spawn;
use super::stage::StageConfig;
use super::store::Step;
use crate::consts::*;

/// Input for a single frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickInput {
    /// Normalized movement, each axis in [-1, 1], y up
    pub movement: Vec2,
}

impl TickInput {
    pub fn moving(x: f32, y: f32) -> Self {
        Self {
            movement: Vec2::new(x, y),
        }
    }
}

/// Advance the running game by `dt` milliseconds
pub fn step(game: &mut Game, input: &TickInput, dt: f32) {
    if !game.state.is_running() {
        return;
    }
    game.state.elapsed_ms += dt as f64;

    update_obstacles(game, dt);
    update_bubbles(game, dt);
    update_crabs(game, dt);
    update_pearls(game, dt);
    update_power_ups(game, dt);
    update_player(game, input, dt);
    spawn::run(game);
    game.state.advance_timers(dt);

    if game.state.is_game_over() {
        game.trim_pools();
    }
}

/// Move obstacles, run their abilities, resolve hits and score the ones that got away
pub fn update_obstacles(game: &mut Game, dt: f32) {
    let frame = dt * FRAME_SCALE;
    let Game {
        state,
        entities,
        pools,
        events,
        ..
    } = game;

    let fish = state.fish_rect();
    let target = fish.center();
    let viewport = state.viewport;
    let max_y = (viewport.y - OBSTACLE_SIZE).max(0.0);
    let mut escaped = 0;

    let removed = entities.obstacles.sweep(|entry| {
        let obstacle = &mut entry.data;
        obstacle.phase += dt * MOTION_PHASE_SCALE;
        obstacle.pos.x -= obstacle.speed * frame;
        if let Some(ability) = obstacle.behavior.ability {
            use_ability(obstacle, ability, target, viewport, dt, events);
        }
        let y = obstacle.start_y + obstacle.pattern.offset(obstacle.phase);
        obstacle.pos.y = y.clamp(0.0, max_y);

        let exposed = state.is_running() && !state.is_powered_up() && !state.is_invulnerable();
        if exposed && overlaps(&obstacle.rect(), &fish, COLLISION_PADDING) {
            apply_damage(state, obstacle.behavior.damage, events);
            if obstacle.behavior.sound != SoundCue::Hit {
                events.push(GameEvent::Sound(obstacle.behavior.sound));
            }
            return Step::Despawn;
        }

        if obstacle.pos.x < OBSTACLE_DESPAWN_X {
            escaped += 1;
            return Step::Despawn;
        }
        Step::Keep
    });

    for entry in removed {
        pools.release(entry.sprite, PoolKind::Obstacle);
    }
    for _ in 0..escaped {
        if game.state.is_running() {
            score_point(game);
        }
    }
}

/// Tick an obstacle's special ability
fn use_ability(
    obstacle: &mut Obstacle,
    ability: Ability,
    target: Vec2,
    viewport: Vec2,
    dt: f32,
    events: &mut Vec<GameEvent>,
) {
    let center = obstacle.rect().center();
    let distance = center.distance(target);
    obstacle.ability_cooldown_ms = (obstacle.ability_cooldown_ms - dt).max(0.0);

    let triggered = match ability {
        Ability::Chase { range, speed } => {
            if distance < range && distance > f32::EPSILON {
                let dy = (target.y - center.y) / distance;
                obstacle.start_y += dy * speed * dt * FRAME_SCALE;
            }
            false
        }
        Ability::InkSpray { .. } => obstacle.pos.x < viewport.x,
        Ability::Shockwave { range, .. } | Ability::Roar { range, .. } => distance < range,
    };

    if triggered && obstacle.ability_cooldown_ms <= 0.0 {
        obstacle.ability_cooldown_ms = ability.cooldown_ms();
        events.push(GameEvent::Sound(obstacle.behavior.sound));
        events.push(GameEvent::Ability {
            kind: obstacle.kind,
            ability: ability.kind(),
            at: center,
        });
    }
}

pub fn update_bubbles(game: &mut Game, dt: f32) {
    let top = game.state.viewport.y;
    let removed = game.entities.bubbles.sweep(|entry| {
        entry.data.pos.y += entry.data.speed * dt * 0.03;
        if entry.data.pos.y > top {
            Step::Despawn
        } else {
            Step::Keep
        }
    });
    for entry in removed {
        game.pools.release(entry.sprite, PoolKind::Bubble);
    }
}

/// Walk crabs along the floor; each fires pearls on its own cadence
pub fn update_crabs(game: &mut Game, dt: f32) {
    let Game {
        state,
        entities,
        pools,
        rng,
        ..
    } = game;

    let width = state.viewport.x;
    let mut launches = Vec::new();

    let removed = entities.crabs.sweep(|entry| {
        let crab = &mut entry.data;
        crab.pos.x += crab.direction * crab.speed * dt * 0.03;

        crab.since_last_pearl_ms += dt;
        if crab.since_last_pearl_ms > crab.next_pearl_delay_ms {
            if rng.random_bool(PEARL_FIRE_CHANCE) {
                launches.push(crab.pos.x + CRAB_WIDTH / 2.0);
            }
            crab.since_last_pearl_ms = 0.0;
            crab.next_pearl_delay_ms = spawn::pearl_delay(rng);
        }

        if crab.pos.x < -CRAB_DESPAWN_MARGIN || crab.pos.x > width + CRAB_DESPAWN_MARGIN {
            Step::Despawn
        } else {
            Step::Keep
        }
    });

    for entry in removed {
        pools.release(entry.sprite, PoolKind::Crab);
    }
    for x in launches {
        spawn::spawn_pearl(game, x);
    }
}

/// Raise pearls; a pearl that touches the fish costs one life and is consumed
pub fn update_pearls(game: &mut Game, dt: f32) {
    let Game {
        state,
        entities,
        pools,
        events,
        ..
    } = game;

    let fish = state.fish_rect();
    let ceiling = state.viewport.y + 50.0;

    let removed = entities.pearls.sweep(|entry| {
        let pearl = &mut entry.data;
        pearl.pos.y += pearl.speed * dt * 0.001;
        pearl.age_ms += dt;

        if state.is_running() && overlaps(&pearl.rect(), &fish, COLLISION_PADDING) {
            apply_damage(state, 1.0, events);
            return Step::Despawn;
        }
        if pearl.pos.y > ceiling || pearl.age_ms > PEARL_MAX_AGE_MS {
            return Step::Despawn;
        }
        Step::Keep
    });

    for entry in removed {
        pools.release(entry.sprite, PoolKind::Pearl);
    }
}

pub fn update_power_ups(game: &mut Game, dt: f32) {
    let Game {
        state,
        entities,
        pools,
        events,
        ..
    } = game;

    let fish = state.fish_rect();
    let removed = entities.power_ups.sweep(|entry| {
        let power_up = &mut entry.data;
        power_up.pos.x -= power_up.speed * dt * FRAME_SCALE;

        if state.is_running() && overlaps(&power_up.rect(), &fish, COLLISION_PADDING) {
            if power_up.is_life {
                if !state.gain_life(events) {
                    log::debug!("Life pick-up at the cap");
                }
            } else {
                state.activate_power_up(events);
            }
            return Step::Despawn;
        }
        if power_up.pos.x < -POWER_UP_SIZE {
            return Step::Despawn;
        }
        Step::Keep
    });

    for entry in removed {
        let kind = entry.data.pool_kind();
        pools.release(entry.sprite, kind);
    }
}

/// Move the fish from the input vector
pub fn update_player(game: &mut Game, input: &TickInput, dt: f32) {
    if !game.state.is_running() {
        return;
    }
    let speed = if game.state.is_powered_up() {
        FISH_POWERED_MOVE_SPEED
    } else {
        FISH_MOVE_SPEED
    };
    let movement = input.movement.clamp(Vec2::splat(-1.0), Vec2::splat(1.0));
    game.state
        .move_fish(movement * speed * FISH_SENSITIVITY * dt * FRAME_SCALE);
}

/// One point for a dodged obstacle
///
/// Checks for a stage change first, then applies the auto-save and ramp cadences.
pub fn score_point(game: &mut Game) {
    game.state.add_score(1, &mut game.events);
    check_stage(game);

    let score = game.state.score;
    if score % 10 == 0 {
        game.events.push(GameEvent::SaveRequested);
    }
    if score % 5 == 0 {
        game.state.ramp_difficulty();
    }
}

/// Advance one stage if the score crossed the next threshold
pub fn check_stage(game: &mut Game) -> bool {
    let Some(next) = game.rules.next_stage(game.state.stage, game.state.score) else {
        return false;
    };

    game.stage = StageConfig::with_rules(next, &game.rules, &game.assets);
    game.state.apply_stage(&game.stage);
    game.spawner.restart_obstacles(game.state.elapsed_ms);

    log::info!("Stage {} reached: {}", next, game.stage.name);
    let events = &mut game.events;
    events.push(GameEvent::Sound(SoundCue::StageUp));
    events.push(GameEvent::Haptic(HapticPattern::StageUp));
    events.push(GameEvent::Music(MusicCommand::PlayStage(next)));
    events.push(GameEvent::Announce(Announcement::Stage(game.stage.name.clone())));
    events.push(GameEvent::StageChanged {
        stage: next,
        name: game.stage.name.clone(),
        background: game.stage.background.clone(),
    });
    true
}
