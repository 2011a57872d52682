// src/pool.rs

use crate::config::{parse_key_pool, KeyRotationConfig};
use crate::storage::{HealthSnapshot, KeyId, KeyRecord};
use secrecy::Secret;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

/// Name of an independent key pool, e.g. `GEMINI_API`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyCategory(String);

impl KeyCategory {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for KeyCategory {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for KeyCategory {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for KeyCategory {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// All configured keys, grouped by category. A record's id is its index.
#[derive(Debug, Default)]
pub struct KeyPool {
    categories: BTreeMap<KeyCategory, Vec<KeyRecord>>,
}

impl KeyPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build one pool per configured category from the resolved pool strings.
    pub fn from_config(config: &KeyRotationConfig) -> Self {
        let mut pool = Self::new();
        for category in &config.categories {
            let raw = category.keys.as_deref().unwrap_or_default();
            pool.load(KeyCategory::new(category.name.clone()), raw);
        }
        pool
    }

    /// Parse a comma-separated pool string into fresh records. Returns the key count.
    pub fn load(&mut self, category: KeyCategory, raw: &str) -> usize {
        self.insert_secrets(category, parse_key_pool(raw))
    }

    pub fn insert_secrets(&mut self, category: KeyCategory, secrets: Vec<Secret<String>>) -> usize {
        let records: Vec<KeyRecord> = secrets
            .into_iter()
            .enumerate()
            .map(|(id, secret)| KeyRecord::new(id, secret))
            .collect();
        let count = records.len();
        info!(category = %category, keys = count, "Loaded key pool");
        self.categories.insert(category, records);
        count
    }

    pub fn categories(&self) -> impl Iterator<Item = &KeyCategory> {
        self.categories.keys()
    }

    pub fn records(&self, category: &KeyCategory) -> &[KeyRecord] {
        self.categories
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Records of a category; empty for an unknown one.
    pub fn records_mut(&mut self, category: &KeyCategory) -> &mut [KeyRecord] {
        self.categories
            .get_mut(category)
            .map(Vec::as_mut_slice)
            .unwrap_or(&mut [])
    }

    pub fn get(&self, category: &KeyCategory, id: KeyId) -> Option<&KeyRecord> {
        self.categories.get(category)?.get(id)
    }

    pub fn get_mut(&mut self, category: &KeyCategory, id: KeyId) -> Option<&mut KeyRecord> {
        self.categories.get_mut(category)?.get_mut(id)
    }

    pub fn key_count(&self, category: &KeyCategory) -> usize {
        self.records(category).len()
    }

    pub fn total_keys(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    /// Secret-free view of every record.
    pub fn snapshot(&self) -> HealthSnapshot {
        let mut snapshot = HealthSnapshot::default();
        for (category, records) in &self.categories {
            for record in records {
                snapshot.insert(category.as_str(), record.health());
            }
        }
        snapshot
    }

    /// Overlay persisted health by `(category, id)`. Entries without a live
    /// record are ignored. Returns the number of records restored.
    pub fn apply_snapshot(&mut self, snapshot: &HealthSnapshot) -> usize {
        let mut restored = 0;
        for (category, records) in &mut self.categories {
            for record in records.iter_mut() {
                if let Some(health) = snapshot.get(category.as_str(), record.id) {
                    record.apply_health(health);
                    restored += 1;
                }
            }
        }
        debug!(
            restored,
            persisted = snapshot.key_count(),
            "Applied persisted key health"
        );
        restored
    }
}
