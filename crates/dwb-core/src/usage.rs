//! Free-tier usage ledger.
//!
//! Maps a user id to the timestamp of the last successful free-tier
//! resolution (`YYYY-MM-DD HH:MM:SS`). Absence means "never used". The
//! caller records usage only after a successful resolution, and only for
//! non-premium users.

use std::sync::{Arc, Mutex};

use chrono::{Duration, NaiveDateTime};

use crate::{domain::UserId, store::MapStore, utils::now_local, Result};

const USED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct UsageTracker {
    store: Arc<dyn MapStore>,
    write_lock: Mutex<()>,
    window: Duration,
}

impl UsageTracker {
    pub fn new(store: Arc<dyn MapStore>, window_hours: i64) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
            window: Duration::hours(window_hours.max(1)),
        }
    }

    /// Whether the user is outside the free-tier window (or never used it).
    pub fn can_use_free(&self, user: UserId) -> Result<bool> {
        self.can_use_free_at(user, now_local())
    }

    pub fn can_use_free_at(&self, user: UserId, now: NaiveDateTime) -> Result<bool> {
        let map = self.store.load()?;
        let Some(raw) = map.get(&user.0.to_string()) else {
            return Ok(true);
        };

        match NaiveDateTime::parse_from_str(raw, USED_AT_FORMAT) {
            Ok(last_used) => Ok(now.signed_duration_since(last_used) >= self.window),
            Err(e) => {
                // The record is overwritten on the next successful use.
                tracing::warn!(
                    "unparseable usage timestamp {raw:?} for user {}: {e}",
                    user.0
                );
                Ok(true)
            }
        }
    }

    /// Overwrite the user's last-use timestamp with now.
    pub fn record_usage(&self, user: UserId) -> Result<()> {
        self.record_usage_at(user, now_local())
    }

    pub fn record_usage_at(&self, user: UserId, now: NaiveDateTime) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|p| p.into_inner());

        let mut map = self.store.load()?;
        map.insert(
            user.0.to_string(),
            now.format(USED_AT_FORMAT).to_string(),
        );
        self.store.save(&map)
    }
}
