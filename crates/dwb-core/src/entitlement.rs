//! Premium membership ledger.
//!
//! Maps a user id to an expiry date (`YYYY-MM-DD`). Records are never
//! deleted; expiry is computed on read. Last write wins.

use std::sync::{Arc, Mutex};

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::{domain::UserId, errors::Error, store::MapStore, utils::now_local, Result};

const EXPIRY_FORMAT: &str = "%Y-%m-%d";

pub struct EntitlementStore {
    store: Arc<dyn MapStore>,
    // Serializes the load-modify-save cycle for grants.
    write_lock: Mutex<()>,
}

impl EntitlementStore {
    pub fn new(store: Arc<dyn MapStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// Whether the user holds an unexpired premium record.
    ///
    /// Absent user or an unparseable expiry is `Ok(false)`; a broken
    /// ledger is `Err`, left to the caller's degraded-mode policy.
    pub fn is_premium_active(&self, user: UserId) -> Result<bool> {
        self.is_premium_active_at(user, now_local())
    }

    pub fn is_premium_active_at(&self, user: UserId, now: NaiveDateTime) -> Result<bool> {
        let map = self.store.load()?;
        let Some(raw) = map.get(&user.0.to_string()) else {
            return Ok(false);
        };

        match NaiveDate::parse_from_str(raw, EXPIRY_FORMAT) {
            // Inclusive: premium stays active through the expiry day.
            Ok(expiry) => Ok(now.date() <= expiry),
            Err(e) => {
                tracing::warn!("unparseable premium expiry {raw:?} for user {}: {e}", user.0);
                Ok(false)
            }
        }
    }

    /// Grant (or extend-by-overwrite) premium for `days` calendar days
    /// from now. Returns the resulting expiry date.
    pub fn grant_premium(&self, user: UserId, days: i64) -> Result<NaiveDate> {
        self.grant_premium_at(user, days, now_local())
    }

    pub fn grant_premium_at(
        &self,
        user: UserId,
        days: i64,
        now: NaiveDateTime,
    ) -> Result<NaiveDate> {
        if days < 1 {
            return Err(Error::Validation(format!(
                "premium grant needs at least 1 day, got {days}"
            )));
        }

        let _guard = self.write_lock.lock().unwrap_or_else(|p| p.into_inner());

        let mut map = self.store.load()?;
        let expiry = (now + Duration::days(days)).date();
        map.insert(user.0.to_string(), expiry.format(EXPIRY_FORMAT).to_string());
        self.store.save(&map)?;

        Ok(expiry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn fresh() -> EntitlementStore {
        EntitlementStore::new(Arc::new(MemoryStore::default()))
    }

    #[test]
    fn absent_user_is_not_premium() {
        let ent = fresh();
        assert!(!ent.is_premium_active_at(UserId(1), at(2026, 3, 1, 12)).unwrap());
    }

    #[test]
    fn grant_is_active_through_expiry_day_and_not_after() {
        let ent = fresh();
        let t0 = at(2026, 3, 1, 15);
        let expiry = ent.grant_premium_at(UserId(9), 7, t0).unwrap();
        assert_eq!(expiry, NaiveDate::from_ymd_opt(2026, 3, 8).unwrap());

        assert!(ent.is_premium_active_at(UserId(9), t0).unwrap());
        assert!(ent.is_premium_active_at(UserId(9), at(2026, 3, 8, 23)).unwrap());
        assert!(!ent.is_premium_active_at(UserId(9), at(2026, 3, 9, 0)).unwrap());
    }

    #[test]
    fn grant_is_idempotent_and_last_write_wins() {
        let ent = fresh();
        let t0 = at(2026, 3, 1, 8);

        let first = ent.grant_premium_at(UserId(2), 7, t0).unwrap();
        let second = ent.grant_premium_at(UserId(2), 7, t0).unwrap();
        assert_eq!(first, second);

        // A later shorter grant replaces the record, no accumulation.
        let replaced = ent.grant_premium_at(UserId(2), 1, t0).unwrap();
        assert_eq!(replaced, NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
        assert!(!ent
            .is_premium_active_at(UserId(2), at(2026, 3, 5, 0))
            .unwrap());
    }

    #[test]
    fn non_positive_days_are_rejected_without_mutation() {
        let ent = fresh();
        let t0 = at(2026, 3, 1, 8);

        assert!(matches!(
            ent.grant_premium_at(UserId(3), 0, t0),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            ent.grant_premium_at(UserId(3), -5, t0),
            Err(Error::Validation(_))
        ));
        assert!(!ent.is_premium_active_at(UserId(3), t0).unwrap());
    }

    #[test]
    fn unparseable_expiry_reads_as_not_premium() {
        let store = Arc::new(MemoryStore::default());
        let mut map = std::collections::HashMap::new();
        map.insert("4".to_string(), "not-a-date".to_string());
        store.save(&map).unwrap();

        let ent = EntitlementStore::new(store);
        assert!(!ent.is_premium_active_at(UserId(4), at(2026, 3, 1, 0)).unwrap());
    }
}
