//! Notification records and DTOs.

use campus_core::notification::{NotificationDraft, NotificationType, Priority, RelatedEntityType};
use campus_core::taxonomy::NotificationSubcategory;
use campus_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};

/// What happened to the email copy of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EmailStatus {
    /// A real-time send is in flight.
    Pending,
    Sent,
    Failed,
    /// Held for the user's next digest.
    Queued { scheduled_for: Timestamp },
    /// Email was allowed but the user's frequency is `none`.
    FrequencyOff,
    /// The user's preferences block email for this kind.
    Suppressed,
}

/// A stored notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: DbId,
    pub user_id: DbId,
    pub notification_type: NotificationType,
    pub subcategory: NotificationSubcategory,
    pub priority: Priority,
    pub title: String,
    pub message: String,
    pub data: Option<serde_json::Value>,
    pub action_url: Option<String>,
    pub action_text: Option<String>,
    pub related_entity_id: Option<DbId>,
    pub related_entity_type: Option<RelatedEntityType>,
    pub is_read: bool,
    pub read_at: Option<Timestamp>,
    pub expires_at: Option<Timestamp>,
    pub created_at: Timestamp,
    /// Whether the notification shows in the user's bell.
    pub in_app_delivered: bool,
    pub email_status: EmailStatus,
}

impl Notification {
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// DTO for creating a notification.
#[derive(Debug, Clone)]
pub struct CreateNotification {
    pub draft: NotificationDraft,
    pub in_app_delivered: bool,
    pub email_status: EmailStatus,
}

/// Maximum page size for notification listing.
pub const MAX_LIST_LIMIT: usize = 100;

/// Default page size for notification listing.
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Query parameters for listing a user's notifications.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationListParams {
    /// Only unread notifications. Defaults to `false`.
    pub unread_only: Option<bool>,
    /// Also return notifications kept out of the bell by preferences.
    pub include_suppressed: Option<bool>,
    /// Defaults to 50, capped at 100.
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl NotificationListParams {
    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIST_LIMIT).min(MAX_LIST_LIMIT)
    }

    pub fn offset(&self) -> usize {
        self.offset.unwrap_or(0)
    }
}
