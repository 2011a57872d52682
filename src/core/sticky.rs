// src/core/sticky.rs

use crate::pool::KeyCategory;
use crate::storage::KeyId;
use std::collections::HashMap;

/// `run_id -> category -> key id` bindings for runs in flight.
///
/// Keyed by category as well as run id, so one run may hold a key in
/// several categories without collisions.
#[derive(Debug, Default)]
pub struct SessionBindings {
    runs: HashMap<String, HashMap<KeyCategory, KeyId>>,
}

impl SessionBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, run_id: &str, category: &KeyCategory) -> Option<KeyId> {
        self.runs.get(run_id)?.get(category).copied()
    }

    pub fn bind(&mut self, run_id: &str, category: &KeyCategory, id: KeyId) {
        self.runs
            .entry(run_id.to_string())
            .or_default()
            .insert(category.clone(), id);
    }

    /// Drop every binding of `run_id`. Returns how many were removed.
    pub fn release(&mut self, run_id: &str) -> usize {
        self.runs.remove(run_id).map_or(0, |bound| bound.len())
    }

    /// Number of runs holding at least one binding.
    pub fn active_runs(&self) -> usize {
        self.runs.len()
    }
}
