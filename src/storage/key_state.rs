// src/storage/key_state.rs

use chrono::{DateTime, Utc};
use secrecy::Secret;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Load-order index of a key inside its category. Stable for the process lifetime.
pub type KeyId = usize;

/// Health state of a single key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyStatus {
    Active,
    Cooldown,
    Dead,
}

impl fmt::Display for KeyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Active => "active",
            Self::Cooldown => "cooldown",
            Self::Dead => "dead",
        };
        f.write_str(s)
    }
}

/// A credential together with its health counters.
///
/// The secret is wrapped in [`Secret`], which has no `Serialize` impl, so a
/// record can only reach disk through [`KeyRecord::health`].
#[derive(Debug)]
pub struct KeyRecord {
    pub id: KeyId,
    pub secret: Secret<String>,
    pub status: KeyStatus,
    pub success_count: u64,
    pub failure_count: u64,
    pub last_used: Option<DateTime<Utc>>,
    /// Only meaningful while `status == Cooldown`; `None` otherwise.
    pub cooldown_until: Option<DateTime<Utc>>,
    pub consecutive_failures: u32,
}

impl KeyRecord {
    /// Create a record in its initial, never-used state
    pub fn new(id: KeyId, secret: Secret<String>) -> Self {
        Self {
            id,
            secret,
            status: KeyStatus::Active,
            success_count: 0,
            failure_count: 0,
            last_used: None,
            cooldown_until: None,
            consecutive_failures: 0,
        }
    }

    pub fn is_viable(&self) -> bool {
        self.status != KeyStatus::Dead
    }

    pub fn is_active(&self) -> bool {
        self.status == KeyStatus::Active
    }

    /// Move to `Active`, dropping any cooldown deadline.
    pub fn activate(&mut self) {
        self.status = KeyStatus::Active;
        self.cooldown_until = None;
    }

    /// Emergency reset: revive the key regardless of its current status.
    pub fn revive(&mut self) {
        self.activate();
        self.consecutive_failures = 0;
    }

    /// Promote a `Cooldown` key whose deadline has passed. Returns true on promotion.
    pub fn promote_if_expired(&mut self, now: DateTime<Utc>) -> bool {
        let expired = self.status == KeyStatus::Cooldown
            && self.cooldown_until.map_or(true, |until| until <= now);
        if expired {
            self.activate();
        }
        expired
    }

    /// Non-secret view of the record, as written to the snapshot.
    pub fn health(&self) -> KeyHealth {
        KeyHealth {
            id: self.id,
            status: self.status,
            success_count: self.success_count,
            failure_count: self.failure_count,
            last_used: self.last_used,
            cooldown_until: self.cooldown_until,
            consecutive_failures: self.consecutive_failures,
        }
    }

    /// Overlay persisted health onto a freshly loaded record. The secret is untouched.
    pub fn apply_health(&mut self, health: &KeyHealth) {
        self.status = health.status;
        self.success_count = health.success_count;
        self.failure_count = health.failure_count;
        self.last_used = health.last_used;
        self.consecutive_failures = health.consecutive_failures;
        self.cooldown_until = match health.status {
            KeyStatus::Cooldown => health.cooldown_until,
            KeyStatus::Active | KeyStatus::Dead => None,
        };
    }
}

/// Persisted, secret-free fields of a [`KeyRecord`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyHealth {
    pub id: KeyId,
    pub status: KeyStatus,
    #[serde(default)]
    pub success_count: u64,
    #[serde(default)]
    pub failure_count: u64,
    #[serde(default)]
    pub last_used: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cooldown_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub consecutive_failures: u32,
}

/// `category -> id -> health`, the on-disk layout of the state file.
///
/// Ids are stored as JSON object keys, hence strings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HealthSnapshot {
    pub categories: BTreeMap<String, BTreeMap<String, KeyHealth>>,
}

impl HealthSnapshot {
    pub fn insert(&mut self, category: &str, health: KeyHealth) {
        self.categories
            .entry(category.to_string())
            .or_default()
            .insert(health.id.to_string(), health);
    }

    pub fn get(&self, category: &str, id: KeyId) -> Option<&KeyHealth> {
        self.categories.get(category)?.get(&id.to_string())
    }

    pub fn key_count(&self) -> usize {
        self.categories.values().map(BTreeMap::len).sum()
    }
}
