//! Repository for queued digest entries.

use campus_core::types::{DbId, Timestamp};
use chrono::Utc;

use crate::models::digest::{CreateDigestEntry, DigestEntry};
use crate::Store;

/// Provides queue operations for digest entries.
pub struct DigestRepo;

impl DigestRepo {
    /// Queue a notification for a later digest.
    pub async fn enqueue(store: &Store, input: CreateDigestEntry) -> DigestEntry {
        let entry = DigestEntry {
            id: store.next_id(),
            user_id: input.user_id,
            notification_id: input.notification_id,
            frequency: input.frequency,
            subcategory: input.subcategory,
            title: input.title,
            message: input.message,
            action_url: input.action_url,
            scheduled_for: input.scheduled_for,
            created_at: Utc::now(),
            sent_at: None,
        };
        store
            .digest_entries
            .write()
            .await
            .insert(entry.id, entry.clone());
        entry
    }

    /// Unsent entries whose scheduled time is at or before `now`, oldest first.
    pub async fn list_due(store: &Store, now: Timestamp) -> Vec<DigestEntry> {
        store
            .digest_entries
            .read()
            .await
            .values()
            .filter(|e| e.sent_at.is_none() && e.scheduled_for <= now)
            .cloned()
            .collect()
    }

    /// Unsent entries for one user.
    pub async fn list_pending_for_user(store: &Store, user_id: DbId) -> Vec<DigestEntry> {
        store
            .digest_entries
            .read()
            .await
            .values()
            .filter(|e| e.user_id == user_id && e.sent_at.is_none())
            .cloned()
            .collect()
    }

    /// Mark entries as sent. Returns the number of entries updated.
    pub async fn mark_sent(store: &Store, ids: &[DbId], sent_at: Timestamp) -> u64 {
        let mut table = store.digest_entries.write().await;
        let mut count = 0;
        for id in ids {
            if let Some(entry) = table.get_mut(id) {
                if entry.sent_at.is_none() {
                    entry.sent_at = Some(sent_at);
                    count += 1;
                }
            }
        }
        count
    }

    /// Delete sent entries older than `before`. Returns the number deleted.
    pub async fn purge_sent(store: &Store, before: Timestamp) -> u64 {
        let mut table = store.digest_entries.write().await;
        let count = table.len();
        table.retain(|_, e| !e.sent_at.is_some_and(|at| at < before));
        (count - table.len()) as u64
    }
}
