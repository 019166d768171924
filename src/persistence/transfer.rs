//! Import/export of saved data as one JSON document
//!
//! ```json
//! { "gameState": { ... } | null, "settings": { ... }, "exportDate": "2024-05-01T12:00:00.000Z" }
//! ```
//!
//! Import is all-or-nothing: the whole document is parsed and validated
//! before the store is touched.

use serde::{Deserialize, Serialize};

use super::{GameSnapshot, PersistenceError, SNAPSHOT_KEY, read_snapshot};
use crate::platform::{KeyValueStore, iso_timestamp};
use crate::settings::Settings;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    #[serde(default)]
    pub game_state: Option<GameSnapshot>,
    #[serde(default)]
    pub settings: Option<Settings>,
    #[serde(default)]
    pub export_date: Option<String>,
}

/// Serialize the current snapshot (if any) and settings
///
/// A stale or unreadable snapshot exports as `null`.
pub fn export_save(
    store: &dyn KeyValueStore,
    settings: &Settings,
    now_ms: f64,
) -> Result<String, PersistenceError> {
    let doc = ExportDocument {
        game_state: read_snapshot(store, now_ms).ok().flatten(),
        settings: Some(settings.clone()),
        export_date: Some(iso_timestamp(now_ms)),
    };
    serde_json::to_string_pretty(&doc).map_err(|e| PersistenceError::Corrupt(e.to_string()))
}

/// Apply an exported document, returning the imported settings
///
/// Settings present in the document are merged over defaults and saved; a
/// snapshot present is written as the current saved game. The snapshot is
/// written first and put back if the settings write fails, so on error the
/// store holds what it held before.
pub fn import_save(
    store: &mut dyn KeyValueStore,
    json: &str,
) -> Result<Option<Settings>, PersistenceError> {
    let doc: ExportDocument =
        serde_json::from_str(json).map_err(|e| PersistenceError::MalformedImport(e.to_string()))?;

    if let Some(snapshot) = &doc.game_state {
        snapshot
            .validate()
            .map_err(|e| PersistenceError::MalformedImport(e.to_string()))?;
    }
    if let Some(settings) = &doc.settings
        && !(0.0..=1.0).contains(&settings.volume)
    {
        return Err(PersistenceError::MalformedImport(format!(
            "volume {}",
            settings.volume
        )));
    }
    let snapshot_json = doc
        .game_state
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| PersistenceError::MalformedImport(e.to_string()))?;

    let previous = store.get(SNAPSHOT_KEY);
    if let Some(json) = &snapshot_json
        && !store.set(SNAPSHOT_KEY, json)
    {
        return Err(PersistenceError::StorageUnavailable);
    }
    if let Some(settings) = &doc.settings
        && !settings.save(store)
    {
        if snapshot_json.is_some() {
            match previous {
                Some(old) => {
                    store.set(SNAPSHOT_KEY, &old);
                }
                None => store.remove(SNAPSHOT_KEY),
            }
        }
        return Err(PersistenceError::StorageUnavailable);
    }
    log::info!(
        "Imported save (settings: {}, game: {})",
        doc.settings.is_some(),
        doc.game_state.is_some()
    );
    Ok(doc.settings)
}
