// src/storage/json_file.rs

use crate::error::{AppError, Result};
use crate::storage::{HealthSnapshot, SnapshotStore};
use async_trait::async_trait;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::trace;

/// Snapshot store backed by a single JSON file, overwritten on every save.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn parent_dir(&self) -> &Path {
        self.path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }
}

/// Write into a uniquely named sibling temp file, then rename it over `path`.
/// Concurrent writers never share a temp file and readers never see a partial one.
fn write_atomically(dir: &Path, path: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| AppError::StoragePersistence {
        message: format!("Failed to create temp file in '{}': {e}", dir.display()),
    })?;
    tmp.write_all(bytes)
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| AppError::StoragePersistence {
            message: format!("Failed to write '{}': {e}", tmp.path().display()),
        })?;
    tmp.persist(path).map_err(|e| AppError::StoragePersistence {
        message: format!("Failed to replace '{}': {}", path.display(), e.error),
    })?;
    Ok(())
}

#[async_trait]
impl SnapshotStore for JsonFileStore {
    async fn load(&self) -> Result<Option<HealthSnapshot>> {
        trace!(path = %self.path.display(), "JsonFileStore::load: reading snapshot");
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AppError::io("read_snapshot", &e)),
        };

        let snapshot = serde_json::from_str(&content).map_err(|e| AppError::Serialization {
            message: format!("Corrupt snapshot '{}': {e}", self.path.display()),
        })?;
        Ok(Some(snapshot))
    }

    async fn save(&self, snapshot: &HealthSnapshot) -> Result<()> {
        let json = serde_json::to_vec_pretty(snapshot)?;

        let dir = self.parent_dir().to_path_buf();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::io("create_snapshot_dir", &e))?;

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&dir, &path, &json))
            .await
            .map_err(|e| AppError::StoragePersistence {
                message: format!("Snapshot writer task failed: {e}"),
            })??;

        trace!(
            path = %self.path.display(),
            keys = snapshot.key_count(),
            "JsonFileStore::save: snapshot written"
        );
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
