use chrono::{Local, NaiveDateTime};

// ============== Timestamp Helpers ==============

/// Wall-clock "now" in process-local time.
///
/// The premium expiry check, the free-tier window check, and usage
/// recording must all read the clock through this one function so the two
/// ledgers cannot drift against each other.
pub fn now_local() -> NaiveDateTime {
    Local::now().naive_local()
}
