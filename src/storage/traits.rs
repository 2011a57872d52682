// src/storage/traits.rs

use crate::error::Result;
use crate::storage::HealthSnapshot;
use async_trait::async_trait;

/// Where key health survives a process restart.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Read the last snapshot. `Ok(None)` when nothing has been written yet.
    async fn load(&self) -> Result<Option<HealthSnapshot>>;

    /// Replace the stored snapshot with `snapshot`.
    async fn save(&self, snapshot: &HealthSnapshot) -> Result<()>;

    /// Human-readable location for log lines.
    fn describe(&self) -> String;
}
