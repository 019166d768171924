//! Browser implementations of the platform collaborators

use wasm_bindgen::JsCast;
use web_sys::{HtmlElement, Storage};

use super::{Announcer, Haptics, KeyValueStore};
use crate::sim::HapticPattern;

/// `window.localStorage`
///
/// Missing storage (private browsing, sandboxed frames) behaves like an
/// empty store that drops writes.
pub struct LocalStore {
    storage: Option<Storage>,
}

impl Default for LocalStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalStore {
    pub fn new() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();
        if storage.is_none() {
            log::warn!("LocalStorage unavailable - progress will not be saved");
        }
        Self { storage }
    }
}

impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.as_ref()?.get_item(key).ok().flatten()
    }

    fn set(&mut self, key: &str, value: &str) -> bool {
        let Some(storage) = &self.storage else {
            return false;
        };
        match storage.set_item(key, value) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Failed to write {}: {:?}", key, e);
                false
            }
        }
    }

    fn remove(&mut self, key: &str) {
        if let Some(storage) = &self.storage {
            let _ = storage.remove_item(key);
        }
    }
}

/// `navigator.vibrate`, only on touch devices
pub struct Vibration {
    enabled: bool,
}

impl Vibration {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl Haptics for Vibration {
    fn vibrate(&mut self, pattern: HapticPattern) {
        if !self.enabled {
            return;
        }
        let Some(window) = web_sys::window() else {
            return;
        };
        let pulses: js_sys::Array = pattern
            .pulses()
            .iter()
            .map(|ms| wasm_bindgen::JsValue::from(*ms))
            .collect();
        // Returns false on unsupported devices
        let _ = window.navigator().vibrate_with_pattern(&pulses);
    }
}

/// Polite ARIA live region for screen readers
pub struct LiveRegion {
    element: Option<HtmlElement>,
}

impl LiveRegion {
    const ELEMENT_ID: &'static str = "announcer";

    /// Find the live region in the page, creating it if absent
    pub fn attach() -> Self {
        Self {
            element: Self::find_or_create(),
        }
    }

    fn find_or_create() -> Option<HtmlElement> {
        let document = web_sys::window()?.document()?;
        if let Some(el) = document.get_element_by_id(Self::ELEMENT_ID) {
            return el.dyn_into().ok();
        }
        let el = document.create_element("div").ok()?;
        el.set_id(Self::ELEMENT_ID);
        el.set_attribute("aria-live", "polite").ok()?;
        el.set_attribute("role", "status").ok()?;
        el.set_class_name("sr-only");
        document.body()?.append_child(&el).ok()?;
        el.dyn_into().ok()
    }
}

impl Announcer for LiveRegion {
    fn announce(&mut self, message: &str) {
        if let Some(el) = &self.element {
            // Clear first so repeating the same text is read again
            el.set_text_content(None);
            el.set_text_content(Some(message));
        }
    }
}

/// Coarse touch-device check used to enable haptics and touch controls
pub fn is_touch_device() -> bool {
    web_sys::window()
        .map(|w| w.navigator().max_touch_points() > 0)
        .unwrap_or(false)
}
