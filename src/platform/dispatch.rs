//! Routes drained game events to the platform collaborators

use super::{Announcer, AudioSink, Haptics, KeyValueStore, LogAnnouncer, Silent};
use crate::persistence::{self, PersistenceError};
use crate::settings::Settings;
use crate::sim::{Announcement, Game, GameEvent, MusicCommand};

/// Keeps score announcements from flooding the screen reader
///
/// A score is announced on every multiple of ten, or when it jumped by more
/// than one since the last score seen.
#[derive(Debug, Clone, Default)]
pub struct AnnouncementFilter {
    last_score: u64,
}

impl AnnouncementFilter {
    pub fn admit(&mut self, announcement: &Announcement) -> bool {
        match announcement {
            Announcement::Score(score) => {
                let jump = score.saturating_sub(self.last_score);
                self.last_score = *score;
                score % 10 == 0 || jump > 1
            }
            Announcement::GameStarted => {
                self.last_score = 0;
                true
            }
            _ => true,
        }
    }
}

/// The collaborators a host wires into a session, gated by player settings
pub struct Platform {
    pub settings: Settings,
    audio: Box<dyn AudioSink>,
    haptics: Box<dyn Haptics>,
    announcer: Box<dyn Announcer>,
    store: Box<dyn KeyValueStore>,
    filter: AnnouncementFilter,
}

impl Platform {
    pub fn new(
        settings: Settings,
        audio: Box<dyn AudioSink>,
        haptics: Box<dyn Haptics>,
        announcer: Box<dyn Announcer>,
        store: Box<dyn KeyValueStore>,
    ) -> Self {
        Self {
            settings,
            audio,
            haptics,
            announcer,
            store,
            filter: AnnouncementFilter::default(),
        }
    }

    /// No audio or haptics; announcements go to the log
    pub fn headless(store: Box<dyn KeyValueStore>) -> Self {
        let settings = Settings::load(store.as_ref());
        Self::new(
            settings,
            Box::new(Silent),
            Box::new(Silent),
            Box::new(LogAnnouncer::default()),
            store,
        )
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub fn store_mut(&mut self) -> &mut dyn KeyValueStore {
        self.store.as_mut()
    }

    /// Replace and persist the settings
    pub fn apply_settings(&mut self, settings: Settings) {
        if !settings.music_enabled {
            self.audio.stop_music();
        }
        self.settings = settings;
        if !self.settings.save(self.store.as_mut()) {
            log::warn!("Settings not persisted");
        }
    }

    /// Call from an input handler so later sounds can start
    pub fn unlock_audio(&mut self) {
        if self.settings.sound_enabled || self.settings.music_enabled {
            self.audio.resume();
        }
    }

    /// Saved game and settings as one JSON document
    pub fn export_save(&self, now_ms: f64) -> Result<String, PersistenceError> {
        persistence::export_save(self.store.as_ref(), &self.settings, now_ms)
    }

    /// Apply an exported document; imported settings take effect at once
    pub fn import_save(&mut self, json: &str) -> Result<(), PersistenceError> {
        if let Some(settings) = persistence::import_save(self.store.as_mut(), json)? {
            if !settings.music_enabled {
                self.audio.stop_music();
            }
            self.settings = settings;
        }
        Ok(())
    }

    /// Write a snapshot of the session if one is in play
    pub fn save_game(&mut self, game: &Game, now_ms: f64) -> bool {
        let Some(snapshot) = game.snapshot(now_ms) else {
            return false;
        };
        match persistence::save_snapshot(self.store.as_mut(), &snapshot) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Save dropped: {}", e);
                false
            }
        }
    }

    /// Handle one frame's worth of events
    ///
    /// Visual events (stage backdrop, ability effects) are left to the host.
    pub fn dispatch(&mut self, game: &Game, events: &[GameEvent], now_ms: f64) {
        for event in events {
            match event {
                GameEvent::Sound(cue) => {
                    if self.settings.sound_enabled {
                        let gain = cue.volume() * self.settings.effective_volume();
                        self.audio.play_effect(*cue, gain);
                    }
                }
                GameEvent::Music(MusicCommand::PlayStage(stage)) => {
                    if self.settings.music_enabled {
                        let gain = self.settings.effective_volume();
                        self.audio.play_music_for_stage(*stage, gain);
                    }
                }
                GameEvent::Music(MusicCommand::Stop) => self.audio.stop_music(),
                GameEvent::Haptic(pattern) => self.haptics.vibrate(*pattern),
                GameEvent::Announce(announcement) => {
                    let admitted = self.filter.admit(announcement);
                    if admitted && self.settings.accessibility.announcements {
                        self.announcer.announce(&announcement.message());
                    }
                }
                GameEvent::HighScore(score) => {
                    persistence::save_high_score(self.store.as_mut(), *score);
                }
                GameEvent::SaveRequested => {
                    if self.settings.auto_save {
                        self.save_game(game, now_ms);
                    }
                }
                GameEvent::GameOver { score } => {
                    persistence::save_high_score(self.store.as_mut(), *score);
                    persistence::clear_snapshot(self.store.as_mut());
                }
                GameEvent::StageChanged { stage, name, .. } => {
                    log::debug!("Stage {} ({})", stage, name);
                }
                GameEvent::Ability { kind, ability, .. } => {
                    log::debug!("{:?} used {:?}", kind, ability);
                }
                GameEvent::PoolsTrimmed { .. } => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::persistence::SNAPSHOT_KEY;
    use crate::platform::MemoryStore;
    use crate::sim::{AssetManifest, HapticPattern, SoundCue};

    type Log = Rc<RefCell<Vec<String>>>;

    struct Recorder(Log);

    impl AudioSink for Recorder {
        fn play_effect(&mut self, cue: SoundCue, _gain: f32) {
            self.0.borrow_mut().push(format!("sfx:{}", cue.as_str()));
        }
        fn play_music_for_stage(&mut self, stage: u32, _gain: f32) {
            self.0.borrow_mut().push(format!("music:{}", stage));
        }
        fn stop_music(&mut self) {
            self.0.borrow_mut().push("music:stop".to_string());
        }
        fn resume(&mut self) {
            self.0.borrow_mut().push("audio:resume".to_string());
        }
    }

    impl Haptics for Recorder {
        fn vibrate(&mut self, pattern: HapticPattern) {
            self.0.borrow_mut().push(format!("haptic:{:?}", pattern));
        }
    }

    impl Announcer for Recorder {
        fn announce(&mut self, message: &str) {
            self.0.borrow_mut().push(format!("say:{}", message));
        }
    }

    fn platform(settings: Settings) -> (Platform, Log) {
        let log: Log = Rc::default();
        let platform = Platform::new(
            settings,
            Box::new(Recorder(log.clone())),
            Box::new(Recorder(log.clone())),
            Box::new(Recorder(log.clone())),
            Box::new(MemoryStore::new()),
        );
        (platform, log)
    }

    #[test]
    fn test_score_announcement_filter() {
        let mut filter = AnnouncementFilter::default();
        let admitted: Vec<u64> = (1..=12)
            .filter(|s| filter.admit(&Announcement::Score(*s)))
            .collect();
        assert_eq!(admitted, vec![10]);
        // Restored sessions jump straight to their score
        assert!(filter.admit(&Announcement::Score(37)));
        assert!(!filter.admit(&Announcement::Score(38)));
    }

    #[test]
    fn test_disabled_sound_is_gated() {
        let mut settings = Settings::default();
        settings.sound_enabled = false;
        let (mut platform, log) = platform(settings);
        let game = Game::new(1, AssetManifest::all());
        platform.dispatch(
            &game,
            &[
                GameEvent::Sound(SoundCue::Hit),
                GameEvent::Music(MusicCommand::PlayStage(1)),
                GameEvent::Haptic(HapticPattern::Collision),
            ],
            0.0,
        );
        assert_eq!(*log.borrow(), vec!["music:1", "haptic:Collision"]);
    }

    #[test]
    fn test_announcements_can_be_turned_off() {
        let mut settings = Settings::default();
        settings.accessibility.announcements = false;
        let (mut platform, log) = platform(settings);
        let game = Game::new(1, AssetManifest::all());
        platform.dispatch(&game, &[GameEvent::Announce(Announcement::Paused(true))], 0.0);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_save_request_writes_snapshot_and_game_over_clears_it() {
        let (mut platform, _log) = platform(Settings::default());
        let mut game = Game::new(3, AssetManifest::all());
        game.start();
        game.drain_events();

        platform.dispatch(&game, &[GameEvent::SaveRequested], 10.0);
        assert!(platform.store().get(SNAPSHOT_KEY).is_some());

        platform.dispatch(&game, &[GameEvent::GameOver { score: 12 }], 20.0);
        assert!(platform.store().get(SNAPSHOT_KEY).is_none());
        assert_eq!(persistence::load_high_score(platform.store()), 12);
    }

    #[test]
    fn test_auto_save_off_skips_snapshot() {
        let mut settings = Settings::default();
        settings.auto_save = false;
        let (mut platform, _log) = platform(settings);
        let mut game = Game::new(3, AssetManifest::all());
        game.start();
        platform.dispatch(&game, &[GameEvent::SaveRequested], 10.0);
        assert!(platform.store().get(SNAPSHOT_KEY).is_none());
        // An explicit save still goes through
        assert!(platform.save_game(&game, 10.0));
    }

    #[test]
    fn test_nothing_to_save_before_start() {
        let (mut platform, _log) = platform(Settings::default());
        let game = Game::new(3, AssetManifest::all());
        assert!(!platform.save_game(&game, 0.0));
    }

    #[test]
    fn test_unlock_audio_resumes_unless_muted() {
        let (mut audible, log) = platform(Settings::default());
        audible.unlock_audio();
        assert_eq!(*log.borrow(), vec!["audio:resume"]);

        let mut muted = Settings::default();
        muted.sound_enabled = false;
        muted.music_enabled = false;
        let (mut silent, log) = platform(muted);
        silent.unlock_audio();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_import_applies_settings_to_the_session() {
        let (mut source, _log) = platform(Settings::default());
        let mut game = Game::new(3, AssetManifest::all());
        game.start();
        assert!(source.save_game(&game, 10.0));
        let mut quiet = Settings::default();
        quiet.music_enabled = false;
        source.apply_settings(quiet.clone());
        let json = source.export_save(20.0).unwrap();

        let (mut target, log) = platform(Settings::default());
        target.import_save(&json).unwrap();
        assert_eq!(target.settings, quiet);
        assert_eq!(*log.borrow(), vec!["music:stop"]);
        assert!(target.store().get(SNAPSHOT_KEY).is_some());

        assert!(target.import_save("{").is_err());
        assert_eq!(target.settings, quiet);
    }
}
