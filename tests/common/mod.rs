//! Common test utilities and fixtures

#![allow(dead_code)]

use bench_key_rotation::storage::{InMemoryStore, SnapshotStore};
use bench_key_rotation::utils::ManualClock;
use bench_key_rotation::{CooldownPolicy, KeyCategory, KeyManager, KeyPool};
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;

pub const GEMINI: &str = "GEMINI_API";

pub fn gemini() -> KeyCategory {
    KeyCategory::from(GEMINI)
}

pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
}

/// Test manager builder
pub struct TestManagerBuilder {
    pool: KeyPool,
    policy: CooldownPolicy,
    store: Arc<dyn SnapshotStore>,
    clock: Arc<ManualClock>,
}

impl TestManagerBuilder {
    pub fn new() -> Self {
        Self {
            pool: KeyPool::new(),
            policy: CooldownPolicy::default(),
            store: Arc::new(InMemoryStore::new()),
            clock: Arc::new(ManualClock::new(epoch())),
        }
    }

    pub fn with_pool(mut self, category: &str, raw: &str) -> Self {
        self.pool.load(KeyCategory::from(category), raw);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn SnapshotStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_clock(mut self, clock: Arc<ManualClock>) -> Self {
        self.clock = clock;
        self
    }

    pub async fn build(self) -> (KeyManager, Arc<ManualClock>) {
        let manager =
            KeyManager::from_parts(self.pool, self.policy, self.store, self.clock.clone()).await;
        (manager, self.clock)
    }
}

impl Default for TestManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Manager over `GEMINI_API = k0,k1,k2` with an in-memory store.
pub async fn three_key_manager() -> (KeyManager, Arc<ManualClock>) {
    TestManagerBuilder::new()
        .with_pool(GEMINI, "k0,k1,k2")
        .build()
        .await
}
