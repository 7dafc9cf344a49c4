//! Digest email scheduler.
//!
//! [`DigestScheduler`] runs as a background task, periodically collecting
//! queued digest entries whose delivery time has passed and sending one
//! email per user and frequency. Entries are only marked sent after the
//! email goes out; failed sends are retried on the next tick.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use campus_core::preferences::EmailFrequency;
use campus_core::types::{DbId, Timestamp};
use campus_db::models::digest::DigestEntry;
use campus_db::repositories::DigestRepo;
use campus_db::DbPool;
use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::bus::{EventBus, NotificationEvent, EVENT_DIGEST_SENT};
use crate::delivery::email::{EmailConfig, EmailSender, OutgoingEmail};

/// Default polling interval.
const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(300);

/// Counts from one pass over the digest queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DigestRunSummary {
    pub emails_sent: usize,
    pub entries_sent: usize,
    pub emails_failed: usize,
}

// ---------------------------------------------------------------------------
// DigestScheduler
// ---------------------------------------------------------------------------

pub struct DigestScheduler {
    pool: DbPool,
    mailer: Arc<dyn EmailSender>,
    event_bus: Arc<EventBus>,
    email_config: EmailConfig,
    interval: Duration,
}

impl DigestScheduler {
    pub fn new(
        pool: DbPool,
        mailer: Arc<dyn EmailSender>,
        event_bus: Arc<EventBus>,
        email_config: EmailConfig,
    ) -> Self {
        Self {
            pool,
            mailer,
            event_bus,
            email_config,
            interval: DEFAULT_CHECK_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run the scheduler loop until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);
        tracing::info!(interval_secs = self.interval.as_secs(), "Digest scheduler started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Digest scheduler cancelled");
                    break;
                }
                _ = interval.tick() => {
                    let summary = self.process_due(Utc::now()).await;
                    if summary.emails_sent > 0 || summary.emails_failed > 0 {
                        tracing::info!(
                            emails_sent = summary.emails_sent,
                            entries_sent = summary.entries_sent,
                            emails_failed = summary.emails_failed,
                            "Processed digest deliveries",
                        );
                    }
                }
            }
        }
    }

    /// Send every digest that is due at `now`.
    pub async fn process_due(&self, now: Timestamp) -> DigestRunSummary {
        let due = DigestRepo::list_due(&self.pool, now).await;

        let mut groups: BTreeMap<(DbId, EmailFrequency), Vec<DigestEntry>> = BTreeMap::new();
        for entry in due {
            groups
                .entry((entry.user_id, entry.frequency))
                .or_default()
                .push(entry);
        }

        let mut summary = DigestRunSummary::default();
        for ((user_id, frequency), entries) in groups {
            let email = OutgoingEmail::digest(&self.email_config, user_id, frequency, &entries);

            match self.mailer.send(&email).await {
                Ok(()) => {
                    let ids: Vec<DbId> = entries.iter().map(|e| e.id).collect();
                    let marked = DigestRepo::mark_sent(&self.pool, &ids, now).await;
                    self.event_bus.publish(
                        NotificationEvent::new(EVENT_DIGEST_SENT, user_id).with_payload(
                            serde_json::json!({
                                "frequency": frequency,
                                "entries": marked,
                            }),
                        ),
                    );
                    tracing::info!(user_id, %frequency, entries = marked, "Digest delivered");
                    summary.emails_sent += 1;
                    summary.entries_sent += ids.len();
                }
                Err(e) => {
                    tracing::error!(user_id, %frequency, error = %e, "Failed to send digest");
                    summary.emails_failed += 1;
                }
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use campus_core::taxonomy::NotificationSubcategory;
    use campus_db::models::digest::CreateDigestEntry;
    use chrono::Duration as ChronoDuration;

    use super::*;
    use crate::delivery::email::EmailError;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<OutgoingEmail>>,
        fail: bool,
    }

    #[async_trait]
    impl EmailSender for RecordingMailer {
        async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError> {
            if self.fail {
                return Err(EmailError::Transport("connection refused".into()));
            }
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }
    }

    fn entry(user_id: DbId, frequency: EmailFrequency, scheduled_for: Timestamp) -> CreateDigestEntry {
        CreateDigestEntry {
            user_id,
            notification_id: 1,
            frequency,
            subcategory: NotificationSubcategory::NewLessons,
            title: "New lesson".into(),
            message: "Lifetimes".into(),
            action_url: None,
            scheduled_for,
        }
    }

    fn scheduler(mailer: Arc<RecordingMailer>) -> (DigestScheduler, DbPool) {
        let pool = campus_db::create_pool();
        let scheduler = DigestScheduler::new(
            Arc::clone(&pool),
            mailer,
            Arc::new(EventBus::default()),
            EmailConfig::default(),
        );
        (scheduler, pool)
    }

    #[tokio::test]
    async fn due_entries_are_grouped_per_user_and_frequency() {
        let mailer = Arc::new(RecordingMailer::default());
        let (scheduler, pool) = scheduler(Arc::clone(&mailer));
        let now = Utc::now();
        let past = now - ChronoDuration::minutes(5);

        DigestRepo::enqueue(&pool, entry(1, EmailFrequency::Daily, past)).await;
        DigestRepo::enqueue(&pool, entry(1, EmailFrequency::Daily, past)).await;
        DigestRepo::enqueue(&pool, entry(2, EmailFrequency::Weekly, past)).await;
        DigestRepo::enqueue(&pool, entry(3, EmailFrequency::Daily, now + ChronoDuration::hours(1))).await;

        let summary = scheduler.process_due(now).await;
        assert_eq!(
            summary,
            DigestRunSummary {
                emails_sent: 2,
                entries_sent: 3,
                emails_failed: 0
            }
        );

        let sent = mailer.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 2);
        assert!(sent[0].subject.contains("daily digest (2 notifications)"));
        assert!(sent[1].subject.contains("weekly digest (1 notification)"));

        // Nothing is sent twice.
        assert_eq!(scheduler.process_due(now).await.emails_sent, 0);
        assert_eq!(DigestRepo::list_pending_for_user(&pool, 3).await.len(), 1);
    }

    #[tokio::test]
    async fn failed_sends_stay_queued() {
        let mailer = Arc::new(RecordingMailer {
            fail: true,
            ..Default::default()
        });
        let (scheduler, pool) = scheduler(mailer);
        let now = Utc::now();
        DigestRepo::enqueue(&pool, entry(1, EmailFrequency::Daily, now)).await;

        let summary = scheduler.process_due(now).await;
        assert_eq!(summary.emails_failed, 1);
        assert_eq!(DigestRepo::list_due(&pool, now).await.len(), 1);
    }

    #[tokio::test]
    async fn run_stops_when_cancelled() {
        let (scheduler, _pool) = scheduler(Arc::new(RecordingMailer::default()));
        let scheduler = scheduler.with_interval(Duration::from_millis(10));
        let cancel = CancellationToken::new();

        let handle = {
            let cancel = cancel.clone();
            tokio::spawn(async move { scheduler.run(cancel).await })
        };
        cancel.cancel();
        handle.await.unwrap();
    }
}
