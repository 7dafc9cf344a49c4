//! Delivery times for batched (digest) notification emails.
//!
//! Digests go out at a fixed UTC hour so every user's batch is computed
//! against the same schedule: daily digests at the next 08:00, weekly
//! digests on the next Monday at 08:00.

use chrono::{Datelike, Duration, NaiveTime};

use crate::preferences::EmailFrequency;
use crate::types::Timestamp;

/// Hour of day (UTC) at which digests are delivered.
pub const DIGEST_DELIVERY_HOUR: u32 = 8;

/// Next delivery time for a digest of the given frequency.
///
/// Returns `None` for frequencies that do not batch (`Realtime`, `Off`).
pub fn next_digest_time(frequency: EmailFrequency, now: Timestamp) -> Option<Timestamp> {
    match frequency {
        EmailFrequency::Daily => Some(next_daily(now)),
        EmailFrequency::Weekly => Some(next_weekly(now)),
        EmailFrequency::Realtime | EmailFrequency::Off => None,
    }
}

fn delivery_time() -> NaiveTime {
    NaiveTime::from_hms_opt(DIGEST_DELIVERY_HOUR, 0, 0).unwrap_or(NaiveTime::MIN)
}

fn at_delivery_hour(now: Timestamp, days_ahead: i64) -> Timestamp {
    let date = now.date_naive() + Duration::days(days_ahead);
    date.and_time(delivery_time()).and_utc()
}

fn next_daily(now: Timestamp) -> Timestamp {
    let today = at_delivery_hour(now, 0);
    if now < today {
        today
    } else {
        at_delivery_hour(now, 1)
    }
}

fn next_weekly(now: Timestamp) -> Timestamp {
    let from_monday = i64::from(now.weekday().num_days_from_monday());
    let days_until_monday = (7 - from_monday) % 7;
    let candidate = at_delivery_hour(now, days_until_monday);
    if now < candidate {
        candidate
    } else {
        at_delivery_hour(now, days_until_monday + 7)
    }
}
