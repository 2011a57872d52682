use crate::config::{ConfigValidator, KeyRotationConfig};
use crate::core::classifier::ClassifierChain;
use crate::core::health::{self, CooldownPolicy};
use crate::core::key_rotation::KeySelector;
use crate::core::sticky::SessionBindings;
use crate::error::{AppError, Result};
use crate::pool::{KeyCategory, KeyPool};
use crate::storage::{HealthSnapshot, JsonFileStore, KeyId, KeyRecord, KeyStatus, SnapshotStore};
use crate::utils::clock::{Clock, SystemClock};
use crate::utils::crypto::{duplicate_secret, preview_key, preview_secret};
use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// A key handed out to a caller.
#[derive(Debug)]
pub struct SelectedKey {
    pub category: KeyCategory,
    pub id: KeyId,
    secret: Secret<String>,
}

impl SelectedKey {
    fn from_record(category: &KeyCategory, record: &KeyRecord) -> Self {
        Self {
            category: category.clone(),
            id: record.id,
            secret: duplicate_secret(&record.secret),
        }
    }

    pub fn expose_secret(&self) -> &str {
        self.secret.expose_secret()
    }

    pub fn preview(&self) -> String {
        preview_secret(self.secret.expose_secret())
    }
}

/// Operations the benchmark orchestrator and answer generators depend on.
#[async_trait]
pub trait KeyManagerTrait: Send + Sync {
    async fn select_key(&self, category: &KeyCategory) -> Result<SelectedKey>;
    async fn get_key_for_run(&self, run_id: &str, category: &KeyCategory) -> Result<SelectedKey>;
    async fn report_result(
        &self,
        category: &KeyCategory,
        id: KeyId,
        success: bool,
        error_message: Option<&str>,
    );
    async fn release_run(&self, run_id: &str);
    async fn key_count(&self, category: &KeyCategory) -> usize;
}

#[derive(Debug)]
struct ManagerState {
    pool: KeyPool,
    bindings: SessionBindings,
}

/// Hands out credentials, tracks their health and persists it.
///
/// All operations serialize on one lock; none of them ever waits for a
/// cooldown to expire. Share it as `Arc<KeyManager>`.
pub struct KeyManager {
    state: Mutex<ManagerState>,
    store: Arc<dyn SnapshotStore>,
    clock: Arc<dyn Clock>,
    classifier: ClassifierChain,
    policy: CooldownPolicy,
    selector: KeySelector,
}

impl KeyManager {
    /// Build a manager from validated configuration, persisting to `config.state_file`.
    #[instrument(skip(config), name = "key_manager_init")]
    pub async fn new(config: &KeyRotationConfig) -> Result<Self> {
        ConfigValidator::validate(config)?;
        let pool = KeyPool::from_config(config);
        let store = Arc::new(JsonFileStore::new(&config.state_file));
        Ok(Self::from_parts(pool, config.cooldown.policy(), store, Arc::new(SystemClock)).await)
    }

    /// Assemble a manager from its parts and restore persisted health.
    ///
    /// A missing or unreadable snapshot is not fatal; every key then starts `Active`.
    pub async fn from_parts(
        mut pool: KeyPool,
        policy: CooldownPolicy,
        store: Arc<dyn SnapshotStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        match store.load().await {
            Ok(Some(snapshot)) => {
                let restored = pool.apply_snapshot(&snapshot);
                info!(
                    store = %store.describe(),
                    restored,
                    "Restored key health from snapshot"
                );
            }
            Ok(None) => info!(
                store = %store.describe(),
                "No persisted key health found. Starting with all keys active."
            ),
            Err(e) => warn!(
                store = %store.describe(),
                error = %e,
                "Failed to read persisted key health. Starting with all keys active."
            ),
        }

        info!(
            categories = pool.categories().count(),
            total_keys = pool.total_keys(),
            "KeyManager initialized"
        );

        Self {
            state: Mutex::new(ManagerState {
                pool,
                bindings: SessionBindings::new(),
            }),
            store,
            clock,
            classifier: ClassifierChain::default(),
            policy,
            selector: KeySelector::new(),
        }
    }

    /// Replace the failure classifier.
    pub fn with_classifier(mut self, classifier: ClassifierChain) -> Self {
        self.classifier = classifier;
        self
    }

    #[instrument(level = "debug", skip(self), fields(category = %category))]
    pub async fn select_key(&self, category: &KeyCategory) -> Result<SelectedKey> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let selected = self.select_locked(state, category)?;
        self.persist(state).await;
        Ok(selected)
    }

    /// Return the key bound to `run_id` in `category`, selecting and binding one on first use.
    #[instrument(level = "debug", skip(self), fields(category = %category))]
    pub async fn get_key_for_run(&self, run_id: &str, category: &KeyCategory) -> Result<SelectedKey> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let now = self.clock.now();

        let bound = state.bindings.get(run_id, category).and_then(|id| {
            let record = state.pool.get_mut(category, id)?;
            record.last_used = Some(now);
            Some(SelectedKey::from_record(category, record))
        });

        let selected = match bound {
            Some(selected) => {
                debug!(run_id, key.id = selected.id, "Reusing key bound to run");
                selected
            }
            None => {
                let selected = self.select_locked(state, category)?;
                state.bindings.bind(run_id, category, selected.id);
                debug!(run_id, key.id = selected.id, "Bound key to run");
                selected
            }
        };

        self.persist(state).await;
        Ok(selected)
    }

    /// Record the outcome of a call made with key `id`. Unknown keys are ignored.
    #[instrument(level = "debug", skip(self, error_message), fields(category = %category))]
    pub async fn report_result(
        &self,
        category: &KeyCategory,
        id: KeyId,
        success: bool,
        error_message: Option<&str>,
    ) {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let now = self.clock.now();

        let Some(record) = state.pool.get_mut(category, id) else {
            debug!(key.id = id, "Ignoring result reported for unknown key");
            return;
        };

        if success {
            let transition = health::record_success(record);
            if transition.changed() {
                info!(
                    key.id = id,
                    api_key.preview = %preview_key(&record.secret),
                    from = %transition.from,
                    to = %transition.to,
                    "Key recovered after successful call"
                );
            }
        } else {
            let kind = self.classifier.classify_message(error_message);
            let transition = health::record_failure(record, kind, &self.policy, now);
            match transition.to {
                KeyStatus::Dead if transition.changed() => warn!(
                    key.id = id,
                    api_key.preview = %preview_key(&record.secret),
                    failure.kind = %kind,
                    "API key revoked after authentication failure"
                ),
                KeyStatus::Cooldown => warn!(
                    key.id = id,
                    api_key.preview = %preview_key(&record.secret),
                    failure.kind = %kind,
                    consecutive_failures = record.consecutive_failures,
                    cooldown_until = ?record.cooldown_until,
                    "API key placed in cooldown"
                ),
                _ => debug!(
                    key.id = id,
                    failure.kind = %kind,
                    status = %transition.to,
                    "Failure recorded"
                ),
            }
        }

        self.persist(state).await;
    }

    /// Forget every binding of `run_id`. Safe to call repeatedly.
    pub async fn release_run(&self, run_id: &str) {
        let released = self.state.lock().await.bindings.release(run_id);
        debug!(run_id, released, "Released run bindings");
    }

    pub async fn key_count(&self, category: &KeyCategory) -> usize {
        self.state.lock().await.pool.key_count(category)
    }

    /// Secret-free health of every key, as it would be persisted.
    pub async fn key_states(&self) -> HealthSnapshot {
        self.state.lock().await.pool.snapshot()
    }

    pub async fn categories(&self) -> Vec<KeyCategory> {
        self.state.lock().await.pool.categories().cloned().collect()
    }

    /// Number of runs currently holding a sticky binding.
    pub async fn active_runs(&self) -> usize {
        self.state.lock().await.bindings.active_runs()
    }

    fn select_locked(&self, state: &mut ManagerState, category: &KeyCategory) -> Result<SelectedKey> {
        let now = self.clock.now();
        let records = state.pool.records_mut(category);
        let selection = self
            .selector
            .select_available_key(category, records, now)
            .ok_or_else(|| {
                warn!(category = %category, "Selection attempted on a category with no keys");
                AppError::NoKeysConfigured {
                    category: category.to_string(),
                }
            })?;
        Ok(SelectedKey::from_record(category, &records[selection.id]))
    }

    async fn persist(&self, state: &ManagerState) {
        let snapshot = state.pool.snapshot();
        if let Err(e) = self.store.save(&snapshot).await {
            e.log("persist_snapshot");
        }
    }
}

#[async_trait]
impl KeyManagerTrait for KeyManager {
    async fn select_key(&self, category: &KeyCategory) -> Result<SelectedKey> {
        KeyManager::select_key(self, category).await
    }

    async fn get_key_for_run(&self, run_id: &str, category: &KeyCategory) -> Result<SelectedKey> {
        KeyManager::get_key_for_run(self, run_id, category).await
    }

    async fn report_result(
        &self,
        category: &KeyCategory,
        id: KeyId,
        success: bool,
        error_message: Option<&str>,
    ) {
        KeyManager::report_result(self, category, id, success, error_message).await
    }

    async fn release_run(&self, run_id: &str) {
        KeyManager::release_run(self, run_id).await
    }

    async fn key_count(&self, category: &KeyCategory) -> usize {
        KeyManager::key_count(self, category).await
    }
}
