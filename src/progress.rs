//! Export and import of all learner progress as one JSON document.

use crate::error::ProgressError;
use crate::flashcards::{performance_key, schedule_key, PERFORMANCE_PREFIX, SCHEDULE_PREFIX, STATS_KEY};
use crate::models::{CardPerformance, CardSchedule, StudyStats};
use crate::pronunciation::{PronunciationEntry, HISTORY_KEY};
use crate::speech::{SpeechSettings, SETTINGS_KEY};
use crate::store::{load_json, save_json, KeyValueStore};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Current export format. Exports without a `version` field are treated as version 0.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProgressBlob {
    #[serde(default)]
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<StudyStats>,
    #[serde(default)]
    pub performance: BTreeMap<String, CardPerformance>,
    #[serde(default)]
    pub schedules: BTreeMap<String, CardSchedule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pronunciation: Option<Vec<PronunciationEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<SpeechSettings>,
}

impl ProgressBlob {
    /// Collects every progress record in the store.
    pub fn collect<S: KeyValueStore + ?Sized>(store: &S) -> Self {
        let mut blob = ProgressBlob {
            version: FORMAT_VERSION,
            stats: load_json(store, STATS_KEY),
            pronunciation: load_json(store, HISTORY_KEY),
            settings: load_json(store, SETTINGS_KEY),
            ..Default::default()
        };

        for key in store.keys() {
            if let Some(card_id) = key.strip_prefix(PERFORMANCE_PREFIX) {
                if let Some(performance) = load_json(store, &key) {
                    blob.performance.insert(card_id.to_string(), performance);
                }
            } else if let Some(card_id) = key.strip_prefix(SCHEDULE_PREFIX) {
                if let Some(schedule) = load_json(store, &key) {
                    blob.schedules.insert(card_id.to_string(), schedule);
                }
            }
        }

        blob
    }

    /// Parses an export and normalizes out-of-range records. Accepts the current format, the older unversioned
    /// flashcard export, and the bare pronunciation history array.
    pub fn parse(json: &str) -> Result<Self, ProgressError> {
        let value: Value = serde_json::from_str(json)?;

        if value.is_array() {
            let history: Vec<PronunciationEntry> = serde_json::from_value(value)?;
            return Ok(ProgressBlob {
                pronunciation: Some(history),
                ..Default::default()
            });
        }

        let found = value.get("version").and_then(Value::as_u64).unwrap_or(0);
        if found > FORMAT_VERSION as u64 {
            return Err(ProgressError::UnsupportedVersion {
                found: u32::try_from(found).unwrap_or(u32::MAX),
                supported: FORMAT_VERSION,
            });
        }

        let blob: ProgressBlob = serde_json::from_value(value)?;
        Ok(blob.normalized())
    }

    /// Pulls imported records back within the ranges the scheduler maintains.
    fn normalized(mut self) -> Self {
        self.stats = self.stats.map(StudyStats::normalized);
        self.performance = self
            .performance
            .into_iter()
            .map(|(card_id, performance)| (card_id, performance.normalized()))
            .collect();
        self
    }

    /// Writes every record in the blob, overwriting what the store holds for those keys.
    pub fn apply<S: KeyValueStore + ?Sized>(&self, store: &mut S) {
        if let Some(stats) = &self.stats {
            save_json(store, STATS_KEY, stats);
        }
        for (card_id, performance) in &self.performance {
            save_json(store, &performance_key(card_id), performance);
        }
        for (card_id, schedule) in &self.schedules {
            save_json(store, &schedule_key(card_id), schedule);
        }
        if let Some(history) = &self.pronunciation {
            save_json(store, HISTORY_KEY, history);
        }
        if let Some(settings) = &self.settings {
            save_json(store, SETTINGS_KEY, settings);
        }
    }
}

pub fn export<S: KeyValueStore + ?Sized>(store: &S) -> String {
    let blob = ProgressBlob::collect(store);
    // Plain structs and string-keyed maps always serialize.
    serde_json::to_string_pretty(&blob).unwrap_or_default()
}

/// Imports an export produced by [`export`]. Nothing is written unless the whole document parses.
pub fn import<S: KeyValueStore + ?Sized>(store: &mut S, json: &str) -> Result<ProgressBlob, ProgressError> {
    let blob = ProgressBlob::parse(json)?;
    blob.apply(store);
    log::info!(
        "Imported progress v{}: {} performance records, {} schedules, {} pronunciation entries",
        blob.version,
        blob.performance.len(),
        blob.schedules.len(),
        blob.pronunciation.as_ref().map_or(0, Vec::len)
    );
    Ok(blob)
}
