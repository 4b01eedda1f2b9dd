use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeMap;

/// String-keyed storage for progress records, shaped like browser local storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
    fn remove(&mut self, key: &str);
    fn keys(&self) -> Vec<String>;
}

/// A pending write recorded by [`MemoryStore`]; `None` means the key was removed.
pub type Change = (String, Option<String>);

/// In-memory store that also journals every write so a backing database can catch up.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
    changes: Vec<Change>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from persisted rows without journaling them.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            entries: entries.into_iter().collect(),
            changes: Vec::new(),
        }
    }

    /// Drains the journal of writes made since the last call.
    pub fn take_changes(&mut self) -> Vec<Change> {
        std::mem::take(&mut self.changes)
    }

    /// Puts back changes that failed to flush, ahead of anything journaled since.
    pub fn requeue(&mut self, mut changes: Vec<Change>) {
        changes.append(&mut self.changes);
        self.changes = changes;
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value.clone());
        self.changes.push((key.to_string(), Some(value)));
    }

    fn remove(&mut self, key: &str) {
        if self.entries.remove(key).is_some() {
            self.changes.push((key.to_string(), None));
        }
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

/// Reads and decodes a JSON record. Missing keys and undecodable values both read as `None`.
pub fn load_json<T, S>(store: &S, key: &str) -> Option<T>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    let raw = store.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Discarding malformed record under '{}': {}", key, e);
            None
        }
    }
}

pub fn save_json<T, S>(store: &mut S, key: &str, value: &T)
where
    T: Serialize,
    S: KeyValueStore + ?Sized,
{
    match serde_json::to_string(value) {
        Ok(raw) => store.set(key, raw),
        // Only non-string map keys can fail here, and none of our records have them.
        Err(e) => log::error!("Failed to encode record for '{}': {}", key, e),
    }
}
