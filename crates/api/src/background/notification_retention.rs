//! Periodic cleanup of expired notifications and delivered digest entries.

use std::time::Duration;

use campus_db::repositories::{DigestRepo, NotificationRepo};
use campus_core::types::Timestamp;
use campus_db::DbPool;
use chrono::Utc;
use tokio_util::sync::CancellationToken;

/// Sent digest entries are kept this long before being purged.
pub const DIGEST_RETENTION_DAYS: i64 = 30;

/// Run one cleanup pass as of `now`. Returns `(notifications, digest_entries)`
/// deleted.
pub async fn purge_at(pool: &DbPool, now: Timestamp) -> (u64, u64) {
    let notifications = NotificationRepo::delete_expired(pool, now).await;
    let digest_entries =
        DigestRepo::purge_sent(pool, now - chrono::Duration::days(DIGEST_RETENTION_DAYS)).await;
    (notifications, digest_entries)
}

pub async fn purge_once(pool: &DbPool) -> (u64, u64) {
    purge_at(pool, Utc::now()).await
}

/// Run the retention loop every `every` until `cancel` is triggered.
pub async fn run(pool: DbPool, every: Duration, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = every.as_secs(),
        digest_retention_days = DIGEST_RETENTION_DAYS,
        "Notification retention job started"
    );

    let mut interval = tokio::time::interval(every);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Notification retention job stopping");
                break;
            }
            _ = interval.tick() => {
                let (notifications, digest_entries) = purge_once(&pool).await;
                if notifications > 0 || digest_entries > 0 {
                    tracing::info!(notifications, digest_entries, "Notification retention: purged records");
                } else {
                    tracing::debug!("Notification retention: nothing to purge");
                }
            }
        }
    }
}
