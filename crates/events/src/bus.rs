//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] fans [`NotificationEvent`]s out to real-time listeners (the
//! push transport, tests). It is shared via `Arc<EventBus>`.

use campus_core::types::{DbId, Timestamp};
use chrono::Utc;
use serde::Serialize;
use tokio::sync::broadcast;

/// A notification was stored and should be pushed to the user's bell.
pub const EVENT_NOTIFICATION_CREATED: &str = "notification.created";
pub const EVENT_NOTIFICATION_READ: &str = "notification.read";
pub const EVENT_NOTIFICATIONS_ALL_READ: &str = "notification.all_read";
pub const EVENT_NOTIFICATION_DELETED: &str = "notification.deleted";
pub const EVENT_PREFERENCES_UPDATED: &str = "preferences.updated";
pub const EVENT_DIGEST_SENT: &str = "digest.sent";

// ---------------------------------------------------------------------------
// NotificationEvent
// ---------------------------------------------------------------------------

/// Something that happened to a user's notifications.
///
/// Constructed via [`NotificationEvent::new`] and enriched with
/// [`with_notification`](NotificationEvent::with_notification) and
/// [`with_payload`](NotificationEvent::with_payload).
#[derive(Debug, Clone, Serialize)]
pub struct NotificationEvent {
    /// Dot-separated event name, e.g. `"notification.created"`.
    pub event_type: String,

    /// The user whose notifications changed.
    pub user_id: DbId,

    pub notification_id: Option<DbId>,

    /// Event-specific data; for `notification.created` the full record.
    pub payload: serde_json::Value,

    pub timestamp: Timestamp,
}

impl NotificationEvent {
    pub fn new(event_type: impl Into<String>, user_id: DbId) -> Self {
        Self {
            event_type: event_type.into(),
            user_id,
            notification_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn with_notification(mut self, notification_id: DbId) -> Self {
        self.notification_id = Some(notification_id);
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// ```rust
/// use campus_events::bus::{EventBus, NotificationEvent, EVENT_NOTIFICATION_CREATED};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(NotificationEvent::new(EVENT_NOTIFICATION_CREATED, 7));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<NotificationEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest unconsumed events are dropped and
    /// slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// Returns the number of subscribers that received it; with no
    /// subscribers the event is dropped.
    pub fn publish(&self, event: NotificationEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        let delivered = bus.publish(
            NotificationEvent::new(EVENT_NOTIFICATION_CREATED, 7)
                .with_notification(42)
                .with_payload(serde_json::json!({ "title": "Graded" })),
        );
        assert_eq!(delivered, 1);

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.event_type, EVENT_NOTIFICATION_CREATED);
        assert_eq!(received.user_id, 7);
        assert_eq!(received.notification_id, Some(42));
        assert_eq!(received.payload["title"], "Graded");
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(NotificationEvent::new(EVENT_PREFERENCES_UPDATED, 3));

        assert_eq!(rx1.recv().await.unwrap().event_type, EVENT_PREFERENCES_UPDATED);
        assert_eq!(rx2.recv().await.unwrap().event_type, EVENT_PREFERENCES_UPDATED);
    }

    #[test]
    fn publish_with_no_subscribers_is_dropped() {
        let bus = EventBus::default();
        assert_eq!(bus.publish(NotificationEvent::new(EVENT_DIGEST_SENT, 1)), 0);
    }
}
