//! Audio system using Web Audio API
//!
//! Procedurally generated sound effects and stage drones - no external files needed!

use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

use crate::platform::AudioSink;
use crate::sim::SoundCue;

/// Root notes (Hz) for the per-stage drone; stages past five reuse the last
const STAGE_ROOTS: [f32; 5] = [110.0, 123.47, 98.0, 82.41, 65.41];

/// A running background drone
struct Drone {
    oscillators: Vec<OscillatorNode>,
    gain: GainNode,
}

/// Audio manager for the game
pub struct AudioManager {
    ctx: Option<AudioContext>,
    music: Option<Drone>,
    music_stage: Option<u32>,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioManager {
    pub fn new() -> Self {
        // Try to create audio context (may fail if not in secure context)
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        Self {
            ctx,
            music: None,
            music_stage: None,
        }
    }

    fn context(&self) -> Option<&AudioContext> {
        let ctx = self.ctx.as_ref()?;
        // Browsers keep the context suspended until a user gesture
        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }
        Some(ctx)
    }

    // === Sound generators ===

    /// Create an oscillator with gain envelope
    fn create_osc(
        &self,
        ctx: &AudioContext,
        freq: f32,
        osc_type: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        Some((osc, gain))
    }

    /// One oscillator sweeping `from` -> `to` over `secs`, fading out
    fn sweep(
        &self,
        ctx: &AudioContext,
        osc_type: OscillatorType,
        from: f32,
        to: f32,
        secs: f64,
        vol: f32,
    ) {
        let Some((osc, gain)) = self.create_osc(ctx, from, osc_type) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + secs)
            .ok();
        osc.frequency().set_value_at_time(from, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(to, t + secs)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + secs + 0.05).ok();
    }

    /// Short notes played one after another
    fn arpeggio(
        &self,
        ctx: &AudioContext,
        osc_type: OscillatorType,
        notes: &[f32],
        step: f64,
        vol: f32,
    ) {
        let t = ctx.current_time();
        for (i, &freq) in notes.iter().enumerate() {
            let Some((osc, gain)) = self.create_osc(ctx, freq, osc_type) else {
                continue;
            };
            let start = t + i as f64 * step;
            gain.gain().set_value_at_time(0.0, t).ok();
            gain.gain().set_value_at_time(vol, start).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, start + step * 1.5)
                .ok();
            osc.start_with_when(start).ok();
            osc.stop_with_when(start + step * 1.6).ok();
        }
    }

    /// Hit - dull thump
    fn play_hit(&self, ctx: &AudioContext, vol: f32) {
        self.sweep(ctx, OscillatorType::Sine, 150.0, 60.0, 0.15, vol);
        self.sweep(ctx, OscillatorType::Square, 300.0, 120.0, 0.08, vol * 0.3);
    }

    /// Bubble - quick rising blip
    fn play_bubble(&self, ctx: &AudioContext, vol: f32) {
        self.sweep(ctx, OscillatorType::Sine, 400.0, 1200.0, 0.08, vol);
    }

    /// Score - soft ping
    fn play_score(&self, ctx: &AudioContext, vol: f32) {
        self.sweep(ctx, OscillatorType::Triangle, 880.0, 990.0, 0.1, vol);
    }

    /// Thunder - long rumbling sawtooth
    fn play_thunder(&self, ctx: &AudioContext, vol: f32) {
        self.sweep(ctx, OscillatorType::Sawtooth, 90.0, 25.0, 1.2, vol);
        self.sweep(ctx, OscillatorType::Square, 1500.0, 200.0, 0.1, vol * 0.3);
    }

    /// Electric shock - crackling zap
    fn play_shock(&self, ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = self.create_osc(ctx, 100.0, OscillatorType::Sawtooth) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.2)
            .ok();
        for (i, freq) in [3500.0, 200.0, 4000.0, 150.0, 3000.0, 100.0].iter().enumerate() {
            osc.frequency()
                .set_value_at_time(*freq, t + 0.02 * (i + 1) as f64)
                .ok();
        }
        osc.start().ok();
        osc.stop_with_when(t + 0.22).ok();
    }

    fn play_effect_now(&self, cue: SoundCue, vol: f32) {
        let Some(ctx) = self.context() else { return };
        match cue {
            SoundCue::Hit => self.play_hit(ctx, vol),
            SoundCue::PowerUp => self.arpeggio(
                ctx,
                OscillatorType::Square,
                &[523.25, 659.25, 783.99, 1046.5],
                0.06,
                vol * 0.5,
            ),
            SoundCue::LifePickup => {
                self.arpeggio(ctx, OscillatorType::Sine, &[392.0, 523.25, 659.25], 0.08, vol)
            }
            SoundCue::StageUp => self.arpeggio(
                ctx,
                OscillatorType::Triangle,
                &[261.63, 329.63, 392.0, 523.25, 659.25],
                0.1,
                vol,
            ),
            SoundCue::GameOver => self.arpeggio(
                ctx,
                OscillatorType::Triangle,
                &[392.0, 329.63, 261.63, 196.0],
                0.25,
                vol,
            ),
            SoundCue::Bubble => self.play_bubble(ctx, vol),
            SoundCue::ScorePoint => self.play_score(ctx, vol),
            SoundCue::Thunder => self.play_thunder(ctx, vol),
            SoundCue::InkSpray => {
                self.sweep(ctx, OscillatorType::Sawtooth, 600.0, 80.0, 0.35, vol * 0.5)
            }
            SoundCue::ElectricShock => self.play_shock(ctx, vol * 0.6),
            SoundCue::MonsterRoar => {
                self.sweep(ctx, OscillatorType::Sawtooth, 70.0, 40.0, 1.0, vol);
                self.sweep(ctx, OscillatorType::Square, 140.0, 90.0, 0.8, vol * 0.25);
            }
        }
    }

    /// Root plus fifth, slowly detuned against each other
    fn start_drone(&self, ctx: &AudioContext, stage: u32, vol: f32) -> Option<Drone> {
        let index = (stage.clamp(1, STAGE_ROOTS.len() as u32) - 1) as usize;
        let root = STAGE_ROOTS[index];

        let gain = ctx.create_gain().ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;
        let t = ctx.current_time();
        gain.gain().set_value_at_time(0.0, t).ok();
        gain.gain()
            .linear_ramp_to_value_at_time(vol * 0.08, t + 2.0)
            .ok();

        let mut oscillators = Vec::new();
        for (freq, osc_type) in [
            (root, OscillatorType::Sine),
            (root * 1.5, OscillatorType::Triangle),
            (root * 2.003, OscillatorType::Sine),
        ] {
            let osc = ctx.create_oscillator().ok()?;
            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            osc.start().ok();
            oscillators.push(osc);
        }
        Some(Drone { oscillators, gain })
    }
}

impl AudioSink for AudioManager {
    fn resume(&mut self) {
        if let Some(ctx) = &self.ctx {
            let _ = ctx.resume();
        }
    }

    fn play_effect(&mut self, cue: SoundCue, gain: f32) {
        if gain > 0.0 {
            self.play_effect_now(cue, gain);
        }
    }

    fn play_music_for_stage(&mut self, stage: u32, gain: f32) {
        if self.music.is_some() && self.music_stage == Some(stage.min(STAGE_ROOTS.len() as u32)) {
            return;
        }
        self.stop_music();
        let Some(ctx) = self.context() else { return };
        match self.start_drone(ctx, stage, gain) {
            Some(drone) => {
                self.music = Some(drone);
                self.music_stage = Some(stage.min(STAGE_ROOTS.len() as u32));
            }
            None => log::warn!("Background music failed to start"),
        }
    }

    fn stop_music(&mut self) {
        if let Some(drone) = self.music.take() {
            for osc in &drone.oscillators {
                osc.stop().ok();
            }
            drone.gain.disconnect().ok();
        }
        self.music_stage = None;
    }
}
