//! Repository for stored notifications.

use campus_core::types::{DbId, Timestamp};
use chrono::Utc;

use crate::models::notification::{
    CreateNotification, EmailStatus, Notification, NotificationListParams,
};
use crate::Store;

/// Provides CRUD operations for notifications.
pub struct NotificationRepo;

impl NotificationRepo {
    /// Store a notification, returning the created record.
    pub async fn create(store: &Store, input: CreateNotification) -> Notification {
        let draft = input.draft;
        let notification = Notification {
            id: store.next_id(),
            user_id: draft.user_id,
            notification_type: draft.notification_type,
            subcategory: draft.subcategory,
            priority: draft.priority,
            title: draft.title,
            message: draft.message,
            data: draft.data,
            action_url: draft.action_url,
            action_text: draft.action_text,
            related_entity_id: draft.related_entity_id,
            related_entity_type: draft.related_entity_type,
            is_read: false,
            read_at: None,
            expires_at: draft.expires_at,
            created_at: Utc::now(),
            in_app_delivered: input.in_app_delivered,
            email_status: input.email_status,
        };

        store
            .notifications
            .write()
            .await
            .insert(notification.id, notification.clone());
        notification
    }

    pub async fn find_by_id(store: &Store, id: DbId) -> Option<Notification> {
        store.notifications.read().await.get(&id).cloned()
    }

    /// List a user's notifications, newest first.
    ///
    /// Expired notifications are never returned. Notifications whose in-app
    /// delivery was suppressed are only returned with `include_suppressed`.
    pub async fn list_for_user(
        store: &Store,
        user_id: DbId,
        params: &NotificationListParams,
    ) -> Vec<Notification> {
        let now = Utc::now();
        let unread_only = params.unread_only.unwrap_or(false);
        let include_suppressed = params.include_suppressed.unwrap_or(false);

        store
            .notifications
            .read()
            .await
            .values()
            .rev()
            .filter(|n| n.user_id == user_id && !n.is_expired(now))
            .filter(|n| include_suppressed || n.in_app_delivered)
            .filter(|n| !unread_only || !n.is_read)
            .skip(params.offset())
            .take(params.limit())
            .cloned()
            .collect()
    }

    /// Number of unread notifications in the user's bell.
    pub async fn unread_count(store: &Store, user_id: DbId) -> usize {
        let now = Utc::now();
        store
            .notifications
            .read()
            .await
            .values()
            .filter(|n| in_bell(n, user_id, now) && !n.is_read)
            .count()
    }

    /// Mark a single notification as read.
    ///
    /// Returns `false` if no notification with this id belongs to the user.
    /// Marking an already-read notification succeeds without changing `read_at`.
    pub async fn mark_read(store: &Store, notification_id: DbId, user_id: DbId) -> bool {
        let mut table = store.notifications.write().await;
        match table.get_mut(&notification_id) {
            Some(n) if n.user_id == user_id => {
                if !n.is_read {
                    n.is_read = true;
                    n.read_at = Some(Utc::now());
                }
                true
            }
            _ => false,
        }
    }

    /// Mark every unread notification in the user's bell as read.
    ///
    /// Suppressed and expired records are left alone, so the returned count
    /// never exceeds [`NotificationRepo::unread_count`].
    pub async fn mark_all_read(store: &Store, user_id: DbId) -> u64 {
        let now = Utc::now();
        let mut count = 0;
        for n in store.notifications.write().await.values_mut() {
            if in_bell(n, user_id, now) && !n.is_read {
                n.is_read = true;
                n.read_at = Some(now);
                count += 1;
            }
        }
        count
    }

    /// Record the outcome of an email send. Returns `false` if the id is unknown.
    pub async fn set_email_status(store: &Store, notification_id: DbId, status: EmailStatus) -> bool {
        match store.notifications.write().await.get_mut(&notification_id) {
            Some(n) => {
                n.email_status = status;
                true
            }
            None => false,
        }
    }

    /// Delete a notification owned by the user. Returns `false` if not found.
    pub async fn delete(store: &Store, notification_id: DbId, user_id: DbId) -> bool {
        let mut table = store.notifications.write().await;
        let owned = table
            .get(&notification_id)
            .is_some_and(|n| n.user_id == user_id);
        if owned {
            table.remove(&notification_id);
        }
        owned
    }

    /// Delete every notification whose expiry is at or before `now`.
    ///
    /// Returns the number of deleted notifications.
    pub async fn delete_expired(store: &Store, now: Timestamp) -> u64 {
        let mut table = store.notifications.write().await;
        let before = table.len();
        table.retain(|_, n| !n.is_expired(now));
        (before - table.len()) as u64
    }
}

/// Shown in the user's bell: delivered in-app and not yet expired.
fn in_bell(n: &Notification, user_id: DbId, now: Timestamp) -> bool {
    n.user_id == user_id && n.in_app_delivered && !n.is_expired(now)
}
