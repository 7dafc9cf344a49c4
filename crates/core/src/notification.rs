//! Notification drafts: what a feature asks the delivery gate to send.

use serde::{Deserialize, Serialize};

use crate::taxonomy::NotificationSubcategory;
use crate::types::{DbId, Timestamp};

/// Display type of a notification (drives the bell icon and styling).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Progress,
    Risk,
    Achievement,
    Intervention,
    Assignment,
    Course,
    Community,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

/// Kind of entity a notification points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelatedEntityType {
    Course,
    Lesson,
    Assessment,
    Student,
    Comment,
}

/// A notification addressed to one user, before preferences are applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationDraft {
    pub user_id: DbId,
    pub subcategory: NotificationSubcategory,
    pub notification_type: NotificationType,
    pub priority: Priority,
    pub title: String,
    pub message: String,
    pub data: Option<serde_json::Value>,
    pub action_url: Option<String>,
    pub action_text: Option<String>,
    pub related_entity_id: Option<DbId>,
    pub related_entity_type: Option<RelatedEntityType>,
    pub expires_at: Option<Timestamp>,
}

impl NotificationDraft {
    pub fn new(
        user_id: DbId,
        subcategory: NotificationSubcategory,
        notification_type: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            subcategory,
            notification_type,
            priority: Priority::Normal,
            title: title.into(),
            message: message.into(),
            data: None,
            action_url: None,
            action_text: None,
            related_entity_id: None,
            related_entity_type: None,
            expires_at: None,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_action(mut self, url: impl Into<String>, text: impl Into<String>) -> Self {
        self.action_url = Some(url.into());
        self.action_text = Some(text.into());
        self
    }

    pub fn with_related(mut self, entity_type: RelatedEntityType, entity_id: DbId) -> Self {
        self.related_entity_type = Some(entity_type);
        self.related_entity_id = Some(entity_id);
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_expiry(mut self, expires_at: Timestamp) -> Self {
        self.expires_at = Some(expires_at);
        self
    }
}
