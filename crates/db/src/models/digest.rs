//! Notifications held back for a batched digest email.

use campus_core::preferences::EmailFrequency;
use campus_core::taxonomy::NotificationSubcategory;
use campus_core::types::{DbId, Timestamp};
use serde::Serialize;

/// One notification waiting in a user's digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DigestEntry {
    pub id: DbId,
    pub user_id: DbId,
    pub notification_id: DbId,
    pub frequency: EmailFrequency,
    pub subcategory: NotificationSubcategory,
    pub title: String,
    pub message: String,
    pub action_url: Option<String>,
    pub scheduled_for: Timestamp,
    pub created_at: Timestamp,
    pub sent_at: Option<Timestamp>,
}

/// DTO for queueing a digest entry.
#[derive(Debug, Clone)]
pub struct CreateDigestEntry {
    pub user_id: DbId,
    pub notification_id: DbId,
    pub frequency: EmailFrequency,
    pub subcategory: NotificationSubcategory,
    pub title: String,
    pub message: String,
    pub action_url: Option<String>,
    pub scheduled_for: Timestamp,
}
