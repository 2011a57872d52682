// src/core/health.rs

use crate::core::classifier::FailureKind;
use crate::storage::{KeyRecord, KeyStatus};
use crate::utils::clock::add_duration;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Cooldown tuning constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownPolicy {
    pub base: Duration,
    pub max: Duration,
    pub generic: Duration,
}

impl Default for CooldownPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(5),
            max: Duration::from_secs(300),
            generic: Duration::from_secs(5),
        }
    }
}

impl CooldownPolicy {
    /// `min(max, base * 2^(consecutive_failures - 1))`, saturating.
    pub fn quota_backoff(&self, consecutive_failures: u32) -> Duration {
        let exponent = consecutive_failures.saturating_sub(1);
        2u32.checked_pow(exponent)
            .and_then(|factor| self.base.checked_mul(factor))
            .map_or(self.max, |d| d.min(self.max))
    }

    pub fn cooldown_for(&self, kind: FailureKind, consecutive_failures: u32) -> Option<Duration> {
        match kind {
            FailureKind::Auth => None,
            FailureKind::Quota => Some(self.quota_backoff(consecutive_failures)),
            FailureKind::Generic => Some(self.generic),
        }
    }
}

/// Status change caused by a reported outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: KeyStatus,
    pub to: KeyStatus,
}

impl Transition {
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

/// A success proves the key works again; it does not revive a dead key.
pub fn record_success(record: &mut KeyRecord) -> Transition {
    let from = record.status;
    record.success_count += 1;
    record.consecutive_failures = 0;
    if record.status == KeyStatus::Cooldown {
        record.activate();
    }
    Transition {
        from,
        to: record.status,
    }
}

pub fn record_failure(
    record: &mut KeyRecord,
    kind: FailureKind,
    policy: &CooldownPolicy,
    now: DateTime<Utc>,
) -> Transition {
    let from = record.status;
    record.failure_count += 1;
    record.consecutive_failures = record.consecutive_failures.saturating_add(1);

    // Dead is sticky until the emergency reset.
    if record.status != KeyStatus::Dead {
        match policy.cooldown_for(kind, record.consecutive_failures) {
            None => {
                record.status = KeyStatus::Dead;
                record.cooldown_until = None;
            }
            Some(cooldown) => {
                record.status = KeyStatus::Cooldown;
                record.cooldown_until = Some(add_duration(now, cooldown));
            }
        }
    }

    Transition {
        from,
        to: record.status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use secrecy::Secret;

    fn record() -> KeyRecord {
        KeyRecord::new(0, Secret::new("k0".to_string()))
    }

    #[test]
    fn quota_backoff_doubles_until_capped() {
        let policy = CooldownPolicy::default();
        let secs: Vec<u64> = (1..=8).map(|k| policy.quota_backoff(k).as_secs()).collect();
        assert_eq!(secs, vec![5, 10, 20, 40, 80, 160, 300, 300]);
    }

    #[test]
    fn quota_failure_sets_exponential_cooldown() {
        let policy = CooldownPolicy::default();
        let now = Utc::now();
        let mut r = record();

        record_failure(&mut r, FailureKind::Quota, &policy, now);
        record_failure(&mut r, FailureKind::Quota, &policy, now);

        assert_eq!(r.status, KeyStatus::Cooldown);
        assert_eq!(r.consecutive_failures, 2);
        assert_eq!(r.cooldown_until, Some(now + chrono::Duration::seconds(10)));
    }

    #[test]
    fn generic_failure_cooldown_is_flat() {
        let policy = CooldownPolicy::default();
        let now = Utc::now();
        let mut r = record();
        for _ in 0..4 {
            record_failure(&mut r, FailureKind::Generic, &policy, now);
        }
        assert_eq!(r.cooldown_until, Some(now + chrono::Duration::seconds(5)));
        assert_eq!(r.failure_count, 4);
    }

    #[test]
    fn auth_failure_kills_key() {
        let mut r = record();
        let t = record_failure(
            &mut r,
            FailureKind::Auth,
            &CooldownPolicy::default(),
            Utc::now(),
        );
        assert_eq!(
            t,
            Transition {
                from: KeyStatus::Active,
                to: KeyStatus::Dead
            }
        );
        assert_eq!(r.cooldown_until, None);
    }

    #[test]
    fn dead_key_stays_dead_on_other_outcomes() {
        let policy = CooldownPolicy::default();
        let mut r = record();
        record_failure(&mut r, FailureKind::Auth, &policy, Utc::now());

        record_failure(&mut r, FailureKind::Quota, &policy, Utc::now());
        assert_eq!(r.status, KeyStatus::Dead);
        assert_eq!(r.cooldown_until, None);

        let t = record_success(&mut r);
        assert!(!t.changed());
        assert_eq!(r.status, KeyStatus::Dead);
        assert_eq!(r.consecutive_failures, 0);
        assert_eq!(r.success_count, 1);
    }

    #[test]
    fn success_ends_cooldown_early() {
        let mut r = record();
        record_failure(
            &mut r,
            FailureKind::Quota,
            &CooldownPolicy::default(),
            Utc::now(),
        );
        let t = record_success(&mut r);
        assert!(t.changed());
        assert_eq!(r.status, KeyStatus::Active);
        assert_eq!(r.cooldown_until, None);
        assert_eq!(r.consecutive_failures, 0);
    }

    proptest! {
        #[test]
        fn backoff_never_exceeds_max(base in 1u64..600, max in 1u64..3600, k in 1u32..200) {
            let policy = CooldownPolicy {
                base: Duration::from_secs(base),
                max: Duration::from_secs(max),
                generic: Duration::from_secs(5),
            };
            let backoff = policy.quota_backoff(k);
            prop_assert!(backoff <= policy.max);
            if k < 20 {
                let expected = (base << (k - 1)).min(max);
                prop_assert_eq!(backoff.as_secs(), expected);
            }
        }
    }
}
