//! Asset availability
//!
//! Image preloading happens outside the simulation. The spawner and stage
//! system only need to know which asset keys finished loading.

use std::collections::HashSet;

/// Answers whether an asset finished loading
pub trait AssetCatalog {
    fn is_available(&self, key: &str) -> bool;
}

/// Set of loaded asset keys
#[derive(Debug, Clone, Default)]
pub struct AssetManifest {
    /// Every key counts as loaded
    everything: bool,
    loaded: HashSet<String>,
}

impl AssetManifest {
    /// Nothing loaded yet
    pub fn empty() -> Self {
        Self::default()
    }

    /// Treat every asset as loaded (bundled builds, headless runs)
    pub fn all() -> Self {
        Self {
            everything: true,
            loaded: HashSet::new(),
        }
    }

    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            everything: false,
            loaded: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Record a finished load
    pub fn mark_loaded(&mut self, key: impl Into<String>) {
        self.loaded.insert(key.into());
    }

    /// Record a failed load; the key is reported unavailable from now on
    pub fn mark_failed(&mut self, key: &str) {
        self.loaded.remove(key);
        log::warn!("Asset {} failed to load", key);
    }
}

impl AssetCatalog for AssetManifest {
    fn is_available(&self, key: &str) -> bool {
        self.everything || self.loaded.contains(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_load_is_unavailable() {
        let mut assets = AssetManifest::empty();
        assets.mark_loaded("shark.gif");
        assets.mark_failed("crab.png");
        assert!(assets.is_available("shark.gif"));
        assert!(!assets.is_available("crab.png"));

        // A reload that errors withdraws an earlier success
        assets.mark_failed("shark.gif");
        assert!(!assets.is_available("shark.gif"));
    }
}
