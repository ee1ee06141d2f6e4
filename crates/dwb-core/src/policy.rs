//! Access policy: combines the premium ledger and the free-tier ledger
//! into a single allow/deny verdict.
//!
//! The check is pure (no side effects, no usage write). The caller is
//! responsible for recording usage only after a successful resolution and
//! only for non-premium users, and for serializing check-resolve-record
//! per user so two concurrent requests cannot both spend one allowance.

use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::{
    domain::UserId, entitlement::EntitlementStore, usage::UsageTracker, utils::now_local,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessDecision {
    /// Request may proceed. `premium` tells the caller whether to skip
    /// usage recording afterwards.
    Allowed { premium: bool },
    Denied(DenyReason),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DenyReason {
    /// Non-premium user inside the free-tier window.
    RateLimited,
    /// The usage ledger cannot be read; denying is the safe default,
    /// since nothing could be recorded either.
    StoreUnavailable,
}

#[derive(Clone)]
pub struct AccessPolicy {
    entitlements: Arc<EntitlementStore>,
    usage: Arc<UsageTracker>,
}

impl AccessPolicy {
    pub fn new(entitlements: Arc<EntitlementStore>, usage: Arc<UsageTracker>) -> Self {
        Self {
            entitlements,
            usage,
        }
    }

    pub fn check_access(&self, user: UserId) -> AccessDecision {
        self.check_access_at(user, now_local())
    }

    pub fn check_access_at(&self, user: UserId, now: NaiveDateTime) -> AccessDecision {
        match self.entitlements.is_premium_active_at(user, now) {
            Ok(true) => return AccessDecision::Allowed { premium: true },
            Ok(false) => {}
            Err(e) => {
                // An unreadable premium ledger demotes to the free tier;
                // it must not grant unlimited access.
                tracing::warn!("premium ledger unavailable, treating user {} as free: {e}", user.0);
            }
        }

        match self.usage.can_use_free_at(user, now) {
            Ok(true) => AccessDecision::Allowed { premium: false },
            Ok(false) => AccessDecision::Denied(DenyReason::RateLimited),
            Err(e) => {
                tracing::warn!("usage ledger unavailable, denying user {}: {e}", user.0);
                AccessDecision::Denied(DenyReason::StoreUnavailable)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use crate::store::{MapStore, MemoryStore};
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn at(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 4, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    struct BrokenStore;

    impl MapStore for BrokenStore {
        fn load(&self) -> crate::Result<HashMap<String, String>> {
            Err(Error::Storage("disk on fire".to_string()))
        }

        fn save(&self, _map: &HashMap<String, String>) -> crate::Result<()> {
            Err(Error::Storage("disk on fire".to_string()))
        }
    }

    fn policy_with(
        premium: Arc<dyn MapStore>,
        usage: Arc<dyn MapStore>,
    ) -> (AccessPolicy, Arc<EntitlementStore>, Arc<UsageTracker>) {
        let ent = Arc::new(EntitlementStore::new(premium));
        let tracker = Arc::new(UsageTracker::new(usage, 24));
        (AccessPolicy::new(ent.clone(), tracker.clone()), ent, tracker)
    }

    fn fresh() -> (AccessPolicy, Arc<EntitlementStore>, Arc<UsageTracker>) {
        policy_with(
            Arc::new(MemoryStore::default()),
            Arc::new(MemoryStore::default()),
        )
    }

    #[test]
    fn new_user_is_allowed_on_the_free_tier() {
        let (policy, _, _) = fresh();
        assert_eq!(
            policy.check_access_at(UserId(1), at(1, 10)),
            AccessDecision::Allowed { premium: false }
        );
    }

    #[test]
    fn used_up_free_tier_is_rate_limited_until_the_window_passes() {
        let (policy, _, usage) = fresh();
        let t0 = at(1, 10);
        usage.record_usage_at(UserId(2), t0).unwrap();

        assert_eq!(
            policy.check_access_at(UserId(2), at(1, 11)),
            AccessDecision::Denied(DenyReason::RateLimited)
        );
        assert_eq!(
            policy.check_access_at(UserId(2), at(2, 10)),
            AccessDecision::Allowed { premium: false }
        );
    }

    #[test]
    fn premium_bypasses_the_usage_window() {
        let (policy, ent, usage) = fresh();
        let t0 = at(1, 10);
        usage.record_usage_at(UserId(3), t0).unwrap();
        ent.grant_premium_at(UserId(3), 30, t0).unwrap();

        assert_eq!(
            policy.check_access_at(UserId(3), at(1, 11)),
            AccessDecision::Allowed { premium: true }
        );
    }

    #[test]
    fn expired_premium_falls_back_to_the_free_tier() {
        let (policy, ent, _) = fresh();
        ent.grant_premium_at(UserId(4), 1, at(1, 10)).unwrap();

        assert_eq!(
            policy.check_access_at(UserId(4), at(10, 10)),
            AccessDecision::Allowed { premium: false }
        );
    }

    #[test]
    fn check_has_no_side_effects() {
        let (policy, _, _) = fresh();
        // A decision alone never spends the allowance.
        for _ in 0..3 {
            assert_eq!(
                policy.check_access_at(UserId(5), at(1, 10)),
                AccessDecision::Allowed { premium: false }
            );
        }
    }

    #[test]
    fn broken_premium_ledger_demotes_to_free_tier() {
        let (policy, _, _) = policy_with(Arc::new(BrokenStore), Arc::new(MemoryStore::default()));
        assert_eq!(
            policy.check_access_at(UserId(6), at(1, 10)),
            AccessDecision::Allowed { premium: false }
        );
    }

    #[test]
    fn broken_usage_ledger_denies() {
        let (policy, _, _) = policy_with(Arc::new(MemoryStore::default()), Arc::new(BrokenStore));
        assert_eq!(
            policy.check_access_at(UserId(7), at(1, 10)),
            AccessDecision::Denied(DenyReason::StoreUnavailable)
        );
    }
}
