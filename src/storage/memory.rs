// src/storage/memory.rs

use crate::error::{AppError, Result};
use crate::storage::{HealthSnapshot, SnapshotStore};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::trace;

/// In-memory snapshot store.
///
/// Keeps the last saved snapshot and counts writes. Handy for tests and for
/// callers that do not want health to outlive the process.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    snapshot: Mutex<Option<HealthSnapshot>>,
    saves: AtomicUsize,
    fail_writes: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a previously persisted snapshot.
    pub fn with_snapshot(snapshot: HealthSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(Some(snapshot)),
            ..Self::default()
        }
    }

    pub fn last_saved(&self) -> Option<HealthSnapshot> {
        self.snapshot.lock().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Make every following `save` fail, to exercise best-effort persistence.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl SnapshotStore for InMemoryStore {
    async fn load(&self) -> Result<Option<HealthSnapshot>> {
        trace!("InMemoryStore::load");
        Ok(self.snapshot.lock().clone())
    }

    async fn save(&self, snapshot: &HealthSnapshot) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::StoragePersistence {
                message: "in-memory store configured to fail".to_string(),
            });
        }
        *self.snapshot.lock() = Some(snapshot.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        trace!(keys = snapshot.key_count(), "InMemoryStore::save");
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory".to_string()
    }
}
