// src/core/key_rotation.rs

use crate::pool::KeyCategory;
use crate::storage::{KeyId, KeyRecord, KeyStatus};
use crate::utils::crypto::preview_key;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

/// Result of one selection pass over a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub id: KeyId,
    /// Every key was dead and the pool was revived first.
    pub emergency_reset: bool,
    /// Cooldown keys whose deadline had passed and were promoted to active.
    pub promoted: usize,
    /// Set when no key was active and a cooling key was handed out anyway;
    /// holds the time left on its cooldown.
    pub degraded_wait: Option<chrono::Duration>,
}

/// Least-recently-used key selection with cooldown promotion and a
/// non-blocking fallback.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeySelector;

impl KeySelector {
    pub fn new() -> Self {
        Self
    }

    /// Pick a key and stamp its `last_used`. `None` only for an empty pool.
    pub fn select_available_key(
        &self,
        category: &KeyCategory,
        records: &mut [KeyRecord],
        now: DateTime<Utc>,
    ) -> Option<Selection> {
        if records.is_empty() {
            return None;
        }

        let emergency_reset = !records.iter().any(KeyRecord::is_viable);
        if emergency_reset {
            warn!(
                category = %category,
                keys = records.len(),
                "All keys are dead. Performing emergency reset of the whole pool."
            );
            records.iter_mut().for_each(KeyRecord::revive);
        }

        let promoted = records
            .iter_mut()
            .map(|r| r.promote_if_expired(now))
            .filter(|&p| p)
            .count();
        if promoted > 0 {
            debug!(category = %category, promoted, "Cooldown expired, keys back in rotation");
        }

        let active_count = records.iter().filter(|r| r.is_active()).count();

        // `None < Some(_)`, so never-used keys win; ties fall back to id order.
        let lru = records
            .iter()
            .filter(|r| r.is_active())
            .min_by_key(|r| (r.last_used, r.id))
            .map(|r| r.id);

        let (id, degraded_wait) = match lru {
            Some(id) => (id, None),
            None => {
                let soonest = records
                    .iter()
                    .filter(|r| r.status == KeyStatus::Cooldown)
                    .min_by_key(|r| (r.cooldown_until, r.id))?;
                let wait = soonest
                    .cooldown_until
                    .map_or_else(chrono::Duration::zero, |until| until - now);
                (soonest.id, Some(wait))
            }
        };

        let record = records.iter_mut().find(|r| r.id == id)?;
        record.last_used = Some(now);

        match degraded_wait {
            None => info!(
                event = "key_selected",
                category = %category,
                key.id = id,
                api_key.preview = %preview_key(&record.secret),
                rotation_method = "lru",
                active_candidates = active_count,
                "API key selected"
            ),
            Some(wait) => warn!(
                event = "key_selected_degraded",
                category = %category,
                key.id = id,
                api_key.preview = %preview_key(&record.secret),
                recommended_wait_ms = wait.num_milliseconds(),
                "All keys are cooling down. Returning the key that recovers soonest."
            ),
        }

        Some(Selection {
            id,
            emergency_reset,
            promoted,
            degraded_wait,
        })
    }
}
