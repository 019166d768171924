//! Fish Adventure entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::collections::{HashMap, HashSet};
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlElement, HtmlImageElement, KeyboardEvent, TouchEvent};

    use fish_adventure::audio::AudioManager;
    use fish_adventure::consts::*;
    use fish_adventure::persistence::{self, GameSnapshot};
    use fish_adventure::platform::web::{LiveRegion, LocalStore, Vibration, is_touch_device};
    use fish_adventure::platform::{self, Platform};
    use fish_adventure::settings::{ControlScheme, Difficulty, Settings};
    use fish_adventure::sim::{
        AbilityKind, AssetManifest, BACKGROUNDS, Body, EntityStore, Game, GameEvent,
        GamePhase, LoopControl, LoopGuard, ObstacleTier, Rect, Sprite, SpriteId, TickInput,
    };

    /// Touch drag distance (px) that counts as full deflection
    const TOUCH_RANGE: f32 = 60.0;
    /// Lifetime of ability effect overlays
    const EFFECT_MS: i32 = 1000;

    thread_local! {
        /// The running page, for the exported save functions
        static APP: RefCell<Option<Rc<RefCell<App>>>> = const { RefCell::new(None) };
    }

    /// Saved game and settings as JSON, for a download link
    #[wasm_bindgen(js_name = exportSave)]
    pub fn export_save() -> Option<String> {
        let app = APP.with(|slot| slot.borrow().clone())?;
        let a = app.borrow();
        match a.platform.export_save(platform::now_ms()) {
            Ok(json) => Some(json),
            Err(e) => {
                log::warn!("Export failed: {}", e);
                None
            }
        }
    }

    /// Apply a document produced by `exportSave`. Returns false if rejected.
    #[wasm_bindgen(js_name = importSave)]
    pub fn import_save(json: &str) -> bool {
        let Some(app) = APP.with(|slot| slot.borrow().clone()) else {
            return false;
        };
        app.borrow_mut().import_save(json)
    }

    /// DOM element mirroring one pooled sprite
    struct SpriteEl {
        el: HtmlElement,
        variant: Option<&'static str>,
    }

    /// DOM rendering of the play area
    struct View {
        document: Document,
        container: HtmlElement,
        fish: Option<HtmlElement>,
        hud: Option<HtmlElement>,
        overlay: Option<HtmlElement>,
        sprites: HashMap<SpriteId, SpriteEl>,
        /// Spin rate factor from the graphics preset
        animation_speed: f32,
        /// 0 when effects are off or motion is reduced
        particles: u32,
    }

    impl View {
        fn new(document: Document) -> Option<Self> {
            let container = match by_id(&document, "game-container") {
                Some(el) => el,
                None => {
                    let el = create(&document, "game-container")?;
                    el.set_id("game-container");
                    document.body()?.append_child(&el).ok()?;
                    el
                }
            };
            let fish = by_id(&document, "fish").or_else(|| {
                let el = create(&document, "fish")?;
                el.set_id("fish");
                container.append_child(&el).ok()?;
                Some(el)
            });
            Some(Self {
                hud: by_id(&document, "hud"),
                overlay: by_id(&document, "overlay"),
                document,
                container,
                fish,
                sprites: HashMap::new(),
                animation_speed: 1.0,
                particles: 0,
            })
        }

        fn apply_settings(&mut self, settings: &Settings) {
            self.animation_speed = settings.graphics.animation_speed();
            self.particles = settings.particle_count();
            if settings.accessibility.reduced_motion {
                self.animation_speed = 0.0;
            }
        }

        fn viewport(&self) -> Vec2 {
            Vec2::new(
                self.container.client_width() as f32,
                self.container.client_height() as f32,
            )
        }

        /// Backdrop and effect classes for the current stage
        fn show_stage(&self, game: &Game) {
            let style = self.container.style();
            let _ = style.set_property("background-image", &game.stage.background.css());
            let mut classes = vec!["game-container"];
            classes.extend(game.stage.effects.iter().map(|e| e.class_name()));
            self.container.set_class_name(&classes.join(" "));
        }

        fn show_overlay(&self, text: Option<&str>) {
            if let Some(el) = &self.overlay {
                el.set_text_content(text);
                el.set_class_name(if text.is_some() { "" } else { "hidden" });
            }
        }

        fn apply_events(&mut self, events: &[GameEvent], game: &Game) {
            for event in events {
                match event {
                    GameEvent::StageChanged { .. } => self.show_stage(game),
                    GameEvent::Ability { ability, at, .. } => self.ability_effect(*ability, *at),
                    GameEvent::PoolsTrimmed { .. } => self.prune(game),
                    GameEvent::GameOver { score } => self.show_overlay(Some(&format!(
                        "Game Over! Final score: {}. Press R to restart.",
                        score
                    ))),
                    _ => {}
                }
            }
        }

        fn ability_effect(&self, ability: AbilityKind, at: Vec2) {
            let class = match ability {
                AbilityKind::Chase => return,
                AbilityKind::InkSpray => "ink-cloud",
                AbilityKind::Shockwave => "shockwave",
                AbilityKind::Roar => "roar-wave",
            };
            if self.particles == 0 {
                return;
            }
            let Some(el) = create(&self.document, class) else {
                return;
            };
            let style = el.style();
            let _ = style.set_property("--particles", &self.particles.to_string());
            let _ = style.set_property("left", &format!("{:.0}px", at.x));
            let _ = style.set_property("bottom", &format!("{:.0}px", at.y));
            if self.container.append_child(&el).is_err() {
                return;
            }
            let remove = Closure::once(move || el.remove());
            if let Some(window) = web_sys::window() {
                let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
                    remove.as_ref().unchecked_ref(),
                    EFFECT_MS,
                );
            }
            remove.forget();
        }

        fn place(&mut self, sprite: &Sprite, rect: Rect) {
            if !self.sprites.contains_key(&sprite.id) {
                let Some(el) = create(&self.document, sprite.kind.class_name()) else {
                    return;
                };
                if self.container.append_child(&el).is_err() {
                    return;
                }
                self.sprites.insert(sprite.id, SpriteEl { el, variant: None });
            }
            let Some(entry) = self.sprites.get_mut(&sprite.id) else {
                return;
            };
            let style = entry.el.style();
            if entry.variant != sprite.variant {
                let image = match sprite.variant {
                    Some(key) => format!("url(assets/images/{})", key),
                    None => "none".to_string(),
                };
                let _ = style.set_property("background-image", &image);
                let animation = match sprite.spin {
                    Some(spin) if self.animation_speed > 0.0 => format!(
                        "spin {:.2}s linear infinite{}",
                        spin.period_secs / self.animation_speed,
                        if spin.reverse { " reverse" } else { "" }
                    ),
                    _ => "none".to_string(),
                };
                let _ = style.set_property("animation", &animation);
                entry.variant = sprite.variant;
            }
            let display = if sprite.visible { "block" } else { "none" };
            let _ = style.set_property("display", display);
            let _ = style.set_property("left", &format!("{:.1}px", rect.min.x));
            let _ = style.set_property("bottom", &format!("{:.1}px", rect.min.y));
            let _ = style.set_property("width", &format!("{:.0}px", rect.width()));
            let _ = style.set_property("height", &format!("{:.0}px", rect.height()));
            let _ = style.set_property("opacity", &sprite.opacity.to_string());
        }

        fn place_all<R: Body>(&mut self, store: &EntityStore<R>, live: &mut HashSet<SpriteId>) {
            for entry in store.iter() {
                self.place(&entry.sprite, entry.data.rect());
                live.insert(entry.sprite.id);
            }
        }

        fn live_ids(&mut self, game: &Game) -> HashSet<SpriteId> {
            let mut live = HashSet::new();
            let entities = &game.entities;
            self.place_all(&entities.obstacles, &mut live);
            self.place_all(&entities.bubbles, &mut live);
            self.place_all(&entities.crabs, &mut live);
            self.place_all(&entities.pearls, &mut live);
            self.place_all(&entities.power_ups, &mut live);
            live
        }

        fn sync(&mut self, game: &Game) {
            let live = self.live_ids(game);
            for (id, entry) in &self.sprites {
                if !live.contains(id) {
                    let _ = entry.el.style().set_property("display", "none");
                }
            }

            if let Some(fish) = &self.fish {
                let state = &game.state;
                let style = fish.style();
                let _ = style.set_property("left", &format!("{:.1}px", state.fish.x));
                let _ = style.set_property("bottom", &format!("{:.1}px", state.fish.y));
                let _ = style.set_property("opacity", &state.fish_opacity().to_string());
                let scale = state.power_pulse().unwrap_or(1.0);
                let _ = style.set_property("transform", &format!("scale({:.3})", scale));
            }
        }

        /// Drop elements whose sprites were discarded by a pool trim
        fn prune(&mut self, game: &Game) {
            let live = self.live_ids(game);
            self.sprites.retain(|id, entry| {
                let keep = live.contains(id);
                if !keep {
                    entry.el.remove();
                }
                keep
            });
        }

        fn update_hud(&self, game: &Game) {
            let Some(hud) = &self.hud else { return };
            let state = &game.state;
            let mut text = format!(
                "Score: {}  High: {}  Lives: {}  Stage {}: {}",
                state.score,
                state.high_score,
                state.lives.max(0.0),
                state.stage,
                game.stage.name
            );
            if state.is_powered_up() {
                text.push_str(&format!("  Power: {}s", state.power_seconds_left()));
            }
            hud.set_text_content(Some(&text));
        }
    }

    fn by_id(document: &Document, id: &str) -> Option<HtmlElement> {
        document.get_element_by_id(id)?.dyn_into().ok()
    }

    fn create(document: &Document, class: &str) -> Option<HtmlElement> {
        let el: HtmlElement = document.create_element("div").ok()?.dyn_into().ok()?;
        el.set_class_name(class);
        Some(el)
    }

    /// Everything the page keeps alive between frames
    struct App {
        game: Game,
        platform: Platform,
        view: View,
        guard: LoopGuard,
        held: HashSet<String>,
        touch_origin: Option<Vec2>,
        touch_vector: Vec2,
        saved: Option<GameSnapshot>,
    }

    impl App {
        fn input(&self) -> TickInput {
            let (up, down, left, right) = match self.platform.settings.control_scheme {
                ControlScheme::Arrows => ("ArrowUp", "ArrowDown", "ArrowLeft", "ArrowRight"),
                ControlScheme::Wasd => ("w", "s", "a", "d"),
            };
            let held = |key: &str| self.held.contains(key);
            let mut keys = Vec2::ZERO;
            if held(left) {
                keys.x -= 1.0;
            }
            if held(right) {
                keys.x += 1.0;
            }
            if held(up) {
                keys.y += 1.0;
            }
            if held(down) {
                keys.y -= 1.0;
            }
            let movement = keys * KEYBOARD_DEFLECTION + self.touch_vector;
            TickInput {
                movement: movement.clamp(Vec2::splat(-1.0), Vec2::ONE),
            }
        }

        fn run_frame(&mut self, time: f64) -> LoopControl {
            let input = self.input();
            let control = self.game.frame(time, &input);
            self.flush_events();
            self.view.sync(&self.game);
            self.view.update_hud(&self.game);
            control
        }

        fn flush_events(&mut self) {
            let events = self.game.drain_events();
            self.platform
                .dispatch(&self.game, &events, platform::now_ms());
            self.view.apply_events(&events, &self.game);
        }

        fn begin(&mut self, snapshot: Option<GameSnapshot>) -> bool {
            let started = match snapshot {
                Some(snapshot) => self.game.resume_from(&snapshot),
                None => {
                    persistence::clear_snapshot(self.platform.store_mut());
                    self.game.start()
                }
            };
            if started {
                self.saved = None;
                self.view.show_overlay(None);
                self.flush_events();
            }
            started
        }

        fn set_difficulty(&mut self, difficulty: Difficulty) {
            self.game.set_difficulty(difficulty);
            let mut settings = self.platform.settings.clone();
            settings.difficulty = difficulty;
            self.platform.apply_settings(settings);
        }

        fn show_prompt(&self) {
            let prompt = match &self.saved {
                Some(save) => format!(
                    "Saved game found (stage {}, score {}). Press C to continue or Space for a new game.",
                    save.current_stage, save.score
                ),
                None => "Press Space to start".to_string(),
            };
            self.view.show_overlay(Some(&prompt));
        }

        fn import_save(&mut self, json: &str) -> bool {
            if let Err(e) = self.platform.import_save(json) {
                log::warn!("Import rejected: {}", e);
                return false;
            }
            self.view.apply_settings(&self.platform.settings);
            self.game.set_difficulty(self.platform.settings.difficulty);
            if self.game.phase() == GamePhase::Idle {
                self.saved =
                    persistence::load_snapshot(self.platform.store_mut(), platform::now_ms());
                self.show_prompt();
            }
            true
        }

        /// Pause and save when the page is hidden
        fn hide(&mut self) {
            if self.game.pause() {
                log::info!("Auto-paused (tab hidden)");
                self.flush_events();
            }
            self.platform.save_game(&self.game, platform::now_ms());
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        log::info!("Fish Adventure starting...");

        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            log::error!("No document - cannot start");
            return;
        };
        let Some(view) = View::new(document.clone()) else {
            log::error!("Failed to create the play area");
            return;
        };

        let touch = is_touch_device();
        let store = LocalStore::new();
        let settings = Settings::load(&store);
        let platform = Platform::new(
            settings,
            Box::new(AudioManager::new()),
            Box::new(Vibration::new(touch)),
            Box::new(LiveRegion::attach()),
            Box::new(store),
        );

        let seed = js_sys::Date::now() as u64;
        let mut game = Game::new(seed, AssetManifest::empty());
        game.state.high_score = persistence::load_high_score(platform.store());
        game.set_difficulty(platform.settings.difficulty);
        game.set_viewport(view.viewport());
        log::info!("Game initialized with seed: {}", seed);

        let mut app = App {
            game,
            platform,
            view,
            guard: LoopGuard::new(),
            held: HashSet::new(),
            touch_origin: None,
            touch_vector: Vec2::ZERO,
            saved: None,
        };
        app.saved = persistence::load_snapshot(app.platform.store_mut(), platform::now_ms());
        app.view.apply_settings(&app.platform.settings);
        app.view.show_stage(&app.game);
        app.show_prompt();

        let app = Rc::new(RefCell::new(app));
        APP.with(|slot| *slot.borrow_mut() = Some(app.clone()));
        preload_images(&app);
        setup_keyboard(app.clone());
        setup_touch(app.clone(), &document);
        setup_auto_pause(app.clone(), &document);
        setup_resize(app);

        log::info!("Fish Adventure running!");
    }

    fn preload_images(app: &Rc<RefCell<App>>) {
        let obstacles = ObstacleTier::ALL
            .iter()
            .flat_map(|tier| tier.kinds())
            .map(|kind| (kind.asset_key(), format!("assets/images/{}", kind.asset_key())));
        let backgrounds = BACKGROUNDS
            .iter()
            .map(|key| (*key, format!("assets/images/backgrounds/{}", key)));

        for (key, src) in obstacles.chain(backgrounds) {
            let Ok(img) = HtmlImageElement::new() else {
                continue;
            };
            let app = app.clone();
            let onload = Closure::<dyn FnMut()>::new(move || {
                let mut a = app.borrow_mut();
                let a = &mut *a;
                let mut assets = a.game.assets().clone();
                assets.mark_loaded(key);
                a.game.set_assets(assets);
                a.view.show_stage(&a.game);
            });
            let app = app.clone();
            let onerror = Closure::<dyn FnMut()>::new(move || {
                let mut a = app.borrow_mut();
                let mut assets = a.game.assets().clone();
                assets.mark_failed(key);
                a.game.set_assets(assets);
            });
            img.set_onload(Some(onload.as_ref().unchecked_ref()));
            img.set_onerror(Some(onerror.as_ref().unchecked_ref()));
            onload.forget();
            onerror.forget();
            img.set_src(&src);
        }
    }

    fn start_loop(app: &Rc<RefCell<App>>) {
        let generation = app.borrow_mut().guard.start();
        request_frame(app.clone(), generation);
    }

    fn request_frame(app: Rc<RefCell<App>>, generation: u64) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(app, generation, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(app: Rc<RefCell<App>>, generation: u64, time: f64) {
        let control = {
            let mut a = app.borrow_mut();
            // A frame scheduled by a stopped loop
            if !a.guard.is_current(generation) {
                return;
            }
            a.run_frame(time)
        };

        match control {
            LoopControl::Continue => request_frame(app, generation),
            LoopControl::Stop => app.borrow_mut().guard.stop(),
        }
    }

    /// Normalize a key name so WASD works with caps lock
    fn key_name(event: &KeyboardEvent) -> String {
        let key = event.key();
        if key.chars().count() == 1 {
            key.to_lowercase()
        } else {
            key
        }
    }

    fn setup_keyboard(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let key = key_name(&event);
                let restart_loop = {
                    let mut a = app.borrow_mut();
                    a.platform.unlock_audio();
                    match (key.as_str(), a.game.phase()) {
                        (" ", GamePhase::Idle) => a.begin(None),
                        ("c", GamePhase::Idle) => {
                            let saved = a.saved.clone();
                            saved.is_some() && a.begin(saved)
                        }
                        (" " | "Escape" | "p", GamePhase::Running | GamePhase::Paused) => {
                            a.game.toggle_pause();
                            a.flush_events();
                            let paused = a.game.state.is_paused();
                            a.view.show_overlay(paused.then_some("Paused"));
                            false
                        }
                        ("r", GamePhase::Ended) => {
                            let restarted = a.game.restart();
                            if restarted {
                                a.view.show_overlay(None);
                                a.flush_events();
                            }
                            restarted
                        }
                        ("1", _) => {
                            a.set_difficulty(Difficulty::Easy);
                            false
                        }
                        ("2", _) => {
                            a.set_difficulty(Difficulty::Normal);
                            false
                        }
                        ("3", _) => {
                            a.set_difficulty(Difficulty::Hard);
                            false
                        }
                        _ => {
                            if key.starts_with("Arrow") {
                                event.prevent_default();
                            }
                            a.held.insert(key.clone());
                            false
                        }
                    }
                };
                if restart_loop {
                    start_loop(&app);
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                app.borrow_mut().held.remove(&key_name(&event));
            });
            let _ = window
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// Virtual joystick: drag from the touch point to steer
    fn setup_touch(app: Rc<RefCell<App>>, document: &Document) {
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                let Some(touch) = event.touches().get(0) else {
                    return;
                };
                let start = Vec2::new(touch.client_x() as f32, touch.client_y() as f32);
                let begun = {
                    let mut a = app.borrow_mut();
                    a.platform.unlock_audio();
                    a.touch_origin = Some(start);
                    if a.game.phase() == GamePhase::Idle {
                        a.begin(None)
                    } else if a.game.phase() == GamePhase::Ended && a.game.restart() {
                        a.view.show_overlay(None);
                        a.flush_events();
                        true
                    } else {
                        false
                    }
                };
                if begun {
                    start_loop(&app);
                }
            });
            let _ = document
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                let Some(touch) = event.touches().get(0) else {
                    return;
                };
                let mut a = app.borrow_mut();
                let Some(origin) = a.touch_origin else {
                    return;
                };
                let now = Vec2::new(touch.client_x() as f32, touch.client_y() as f32);
                // Screen y grows downward
                let drag = (now - origin) * Vec2::new(1.0, -1.0) / TOUCH_RANGE;
                a.touch_vector = drag.clamp(Vec2::splat(-1.0), Vec2::ONE);
            });
            let _ = document
                .add_event_listener_with_callback("touchmove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: TouchEvent| {
                let mut a = app.borrow_mut();
                a.touch_origin = None;
                a.touch_vector = Vec2::ZERO;
            });
            let _ = document
                .add_event_listener_with_callback("touchend", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_auto_pause(app: Rc<RefCell<App>>, document: &Document) {
        let document_clone = document.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                let mut a = app.borrow_mut();
                a.hide();
                let paused = a.game.state.is_paused();
                a.view.show_overlay(paused.then_some("Paused"));
            }
        });
        let _ = document
            .add_event_listener_with_callback("visibilitychange", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_resize(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let mut a = app.borrow_mut();
            let size = a.view.viewport();
            a.game.set_viewport(size);
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless demo: an autopilot plays one session on synthetic frames
#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use fish_adventure::platform::{MemoryStore, Platform};
    use fish_adventure::sim::{AssetManifest, Game, LoopControl};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);
    log::info!("Fish Adventure (native) starting with seed {}", seed);

    let mut platform = Platform::headless(Box::new(MemoryStore::new()));
    let mut game = Game::new(seed, AssetManifest::all());
    game.set_difficulty(platform.settings.difficulty);
    game.start();

    const FRAME_MS: f64 = 1000.0 / 60.0;
    // Five simulated minutes
    const MAX_FRAMES: u32 = 60 * 60 * 5;

    let mut now = 0.0;
    let mut frames = 0;
    while frames < MAX_FRAMES {
        now += FRAME_MS;
        frames += 1;
        let input = autopilot::steer(&game);
        let control = game.frame(now, &input);
        let events = game.drain_events();
        platform.dispatch(&game, &events, now);
        if control == LoopControl::Stop {
            break;
        }
    }

    let state = &game.state;
    println!("Seed:      {}", seed);
    println!("Survived:  {:.1}s ({} frames)", now / 1000.0, frames);
    println!("Score:     {} (best {})", state.score, state.high_score);
    println!("Stage:     {} ({})", state.stage, game.stage.name);
    println!("Lives:     {}", state.lives.max(0.0));
    println!("Phase:     {:?}", game.phase());
}

#[cfg(not(target_arch = "wasm32"))]
mod autopilot {
    use fish_adventure::sim::{Body, Game, TickInput};

    /// How far ahead (px) obstacles are considered threats
    const LOOKAHEAD: f32 = 260.0;

    /// Dodge the nearest obstacle or pearl in the fish's lane, else drift
    /// back toward mid-screen
    pub fn steer(game: &Game) -> TickInput {
        let fish = game.state.fish_rect();
        let center = fish.center();

        let obstacles = game
            .entities
            .obstacles
            .iter()
            .map(|e| e.data.rect())
            .filter(|r| r.max.x > fish.min.x && r.min.x - fish.max.x < LOOKAHEAD);
        let pearls = game
            .entities
            .pearls
            .iter()
            .map(|e| e.data.rect())
            .filter(|r| r.max.y < fish.max.y && (r.center().x - center.x).abs() < 80.0);

        let threat = obstacles
            .chain(pearls)
            .filter(|r| r.max.y > fish.min.y - 40.0 && r.min.y < fish.max.y + 40.0)
            .min_by(|a, b| {
                let da = (a.center() - center).length();
                let db = (b.center() - center).length();
                da.total_cmp(&db)
            });

        let max_y = (game.state.viewport.y - fish.height()).max(0.0);
        let dy = match threat {
            Some(r) => {
                let away = if r.center().y > center.y { -1.0 } else { 1.0 };
                // Pinned against an edge: go the other way
                if (away < 0.0 && fish.min.y <= 1.0) || (away > 0.0 && fish.min.y >= max_y - 1.0)
                {
                    -away
                } else {
                    away
                }
            }
            None => ((max_y * 0.5 - fish.min.y) / 200.0).clamp(-0.3, 0.3),
        };
        TickInput::moving(0.0, dy * 0.6)
    }
}
