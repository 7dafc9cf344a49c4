//! Delivery gate for outbound notifications.
//!
//! [`NotificationDispatcher`] asks the resolution engine once per channel
//! for every draft and then:
//!
//! - always stores the notification, tagged with whether it shows in the bell
//!   and what happened to its email copy;
//! - pushes it over the event bus when in-app delivery is allowed and the
//!   user is outside their quiet hours (forced kinds ignore quiet hours);
//! - sends, queues or skips the email depending on the user's frequency.

use std::sync::Arc;

use campus_core::digest_schedule::next_digest_time;
use campus_core::notification::NotificationDraft;
use campus_core::preferences::{EmailFrequency, UserNotificationPreferences};
use campus_core::resolution::resolve;
use campus_core::types::{DbId, Timestamp};
use campus_db::models::digest::CreateDigestEntry;
use campus_db::models::notification::{CreateNotification, EmailStatus, Notification};
use campus_db::repositories::{DigestRepo, NotificationPreferenceRepo, NotificationRepo};
use campus_db::DbPool;
use campus_events::bus::EVENT_NOTIFICATION_CREATED;
use campus_events::{EmailConfig, EmailSender, EventBus, NotificationEvent, OutgoingEmail};
use chrono::Utc;
use serde::Serialize;

/// What the gate did with one draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DispatchOutcome {
    pub notification_id: DbId,
    pub user_id: DbId,
    /// The notification shows in the user's bell.
    pub in_app: bool,
    /// A real-time push event was published.
    pub pushed: bool,
    pub email: EmailStatus,
}

pub struct NotificationDispatcher {
    pool: DbPool,
    event_bus: Arc<EventBus>,
    mailer: Arc<dyn EmailSender>,
    email_config: EmailConfig,
}

/// Email status before any send is attempted.
fn initial_email_status(
    prefs: &UserNotificationPreferences,
    email_allowed: bool,
    forced: bool,
    now: Timestamp,
) -> EmailStatus {
    if !email_allowed {
        return EmailStatus::Suppressed;
    }
    if forced {
        return EmailStatus::Pending;
    }

    let frequency = prefs.email_frequency;
    match (frequency, next_digest_time(frequency, now)) {
        (EmailFrequency::Off, _) => EmailStatus::FrequencyOff,
        (_, Some(scheduled_for)) => EmailStatus::Queued { scheduled_for },
        (_, None) => EmailStatus::Pending,
    }
}

impl NotificationDispatcher {
    pub fn new(
        pool: DbPool,
        event_bus: Arc<EventBus>,
        mailer: Arc<dyn EmailSender>,
        email_config: EmailConfig,
    ) -> Self {
        Self {
            pool,
            event_bus,
            mailer,
            email_config,
        }
    }

    pub async fn dispatch(&self, draft: NotificationDraft) -> DispatchOutcome {
        self.dispatch_at(draft, Utc::now()).await
    }

    /// Dispatch drafts one after another, in order.
    pub async fn dispatch_all(&self, drafts: Vec<NotificationDraft>) -> Vec<DispatchOutcome> {
        let mut outcomes = Vec::with_capacity(drafts.len());
        for draft in drafts {
            outcomes.push(self.dispatch(draft).await);
        }
        outcomes
    }

    /// Dispatch a draft as of `now` (quiet hours and digest times use it).
    pub async fn dispatch_at(&self, draft: NotificationDraft, now: Timestamp) -> DispatchOutcome {
        let user_id = draft.user_id;
        let subcategory = draft.subcategory;
        let forced = subcategory.forces_delivery();

        let prefs = NotificationPreferenceRepo::get(&self.pool, user_id).await;
        let decision = resolve(&prefs, subcategory);
        let email_status = initial_email_status(&prefs, decision.email, forced, now);

        let notification = NotificationRepo::create(
            &self.pool,
            CreateNotification {
                draft,
                in_app_delivered: decision.in_app,
                email_status,
            },
        )
        .await;

        let pushed = decision.in_app && (forced || !prefs.in_quiet_hours(now));
        if pushed {
            self.push(&notification);
        } else if decision.in_app {
            tracing::debug!(
                user_id,
                notification_id = notification.id,
                "Push held back during quiet hours"
            );
        }

        let email = match email_status {
            EmailStatus::Pending => self.send_now(&notification).await,
            EmailStatus::Queued { scheduled_for } => {
                self.queue_for_digest(&notification, prefs.email_frequency, scheduled_for)
                    .await;
                email_status
            }
            other => other,
        };

        tracing::info!(
            user_id,
            notification_id = notification.id,
            subcategory = %subcategory,
            in_app = decision.in_app,
            pushed,
            email = ?email,
            "Notification dispatched"
        );

        DispatchOutcome {
            notification_id: notification.id,
            user_id,
            in_app: decision.in_app,
            pushed,
            email,
        }
    }

    fn push(&self, notification: &Notification) {
        let payload = serde_json::to_value(notification).unwrap_or_default();
        self.event_bus.publish(
            NotificationEvent::new(EVENT_NOTIFICATION_CREATED, notification.user_id)
                .with_notification(notification.id)
                .with_payload(payload),
        );
    }

    /// Send the email immediately. Failures are logged and recorded, never
    /// propagated.
    async fn send_now(&self, notification: &Notification) -> EmailStatus {
        let email = OutgoingEmail::for_notification(&self.email_config, notification);
        let status = match self.mailer.send(&email).await {
            Ok(()) => EmailStatus::Sent,
            Err(e) => {
                tracing::error!(
                    user_id = notification.user_id,
                    notification_id = notification.id,
                    error = %e,
                    "Failed to send notification email"
                );
                EmailStatus::Failed
            }
        };
        NotificationRepo::set_email_status(&self.pool, notification.id, status).await;
        status
    }

    async fn queue_for_digest(
        &self,
        notification: &Notification,
        frequency: EmailFrequency,
        scheduled_for: Timestamp,
    ) {
        DigestRepo::enqueue(
            &self.pool,
            CreateDigestEntry {
                user_id: notification.user_id,
                notification_id: notification.id,
                frequency,
                subcategory: notification.subcategory,
                title: notification.title.clone(),
                message: notification.message.clone(),
                action_url: notification.action_url.clone(),
                scheduled_for,
            },
        )
        .await;
    }
}
