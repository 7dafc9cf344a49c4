//! Repository for per-user notification preferences.
//!
//! Each user's record is stored as an immutable `Arc` snapshot. Updates
//! clone the current snapshot, apply the change and replace the map entry
//! while holding the write lock, so a reader sees either the old record or
//! the new one in full.

use std::sync::Arc;

use campus_core::preferences::UserNotificationPreferences;
use campus_core::types::DbId;

use crate::models::preferences::PreferencesPatch;
use crate::Store;

/// Provides read and update operations for notification preferences.
pub struct NotificationPreferenceRepo;

impl NotificationPreferenceRepo {
    /// Get a user's preferences, creating the defaults on first access.
    pub async fn get(store: &Store, user_id: DbId) -> Arc<UserNotificationPreferences> {
        if let Some(prefs) = store.preferences.read().await.get(&user_id) {
            return Arc::clone(prefs);
        }

        let mut table = store.preferences.write().await;
        let prefs = table.entry(user_id).or_insert_with(|| {
            tracing::debug!(user_id, "Creating default notification preferences");
            Arc::new(UserNotificationPreferences::default())
        });
        Arc::clone(prefs)
    }

    /// Get a user's preferences without creating them.
    pub async fn find(store: &Store, user_id: DbId) -> Option<Arc<UserNotificationPreferences>> {
        store.preferences.read().await.get(&user_id).cloned()
    }

    /// Apply a validated partial update and return the new snapshot.
    pub async fn apply_patch(
        store: &Store,
        user_id: DbId,
        patch: &PreferencesPatch,
    ) -> Arc<UserNotificationPreferences> {
        let mut table = store.preferences.write().await;
        let mut next = table
            .get(&user_id)
            .map(|current| UserNotificationPreferences::clone(current))
            .unwrap_or_default();
        patch.apply(&mut next);

        let next = Arc::new(next);
        table.insert(user_id, Arc::clone(&next));
        next
    }

    /// Replace a user's preferences wholesale.
    pub async fn replace(
        store: &Store,
        user_id: DbId,
        prefs: UserNotificationPreferences,
    ) -> Arc<UserNotificationPreferences> {
        let prefs = Arc::new(prefs);
        store
            .preferences
            .write()
            .await
            .insert(user_id, Arc::clone(&prefs));
        prefs
    }
}
