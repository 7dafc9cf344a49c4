//! Notification email rendering and the sending seam.
//!
//! Emails are rendered into [`OutgoingEmail`]s and handed to an
//! [`EmailSender`]. The bundled [`LogMailer`] builds the full RFC 5322
//! message with `lettre` and records it through `tracing`; a transport that
//! talks to a mail server implements the same trait.

use async_trait::async_trait;
use campus_core::preferences::EmailFrequency;
use campus_core::types::DbId;
use campus_db::models::digest::DigestEntry;
use campus_db::models::notification::Notification;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::Message;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),

    #[error("Email transport error: {0}")]
    Transport(String),
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

const DEFAULT_FROM_ADDRESS: &str = "noreply@campus.local";
const DEFAULT_SUBJECT_PREFIX: &str = "[Campus]";
const DEFAULT_RECIPIENT_DOMAIN: &str = "campus.local";

#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// RFC 5322 "From" address.
    pub from_address: String,
    /// Prepended to every subject line.
    pub subject_prefix: String,
    /// Recipients are addressed as `user<id>@<domain>`.
    pub recipient_domain: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            from_address: DEFAULT_FROM_ADDRESS.to_string(),
            subject_prefix: DEFAULT_SUBJECT_PREFIX.to_string(),
            recipient_domain: DEFAULT_RECIPIENT_DOMAIN.to_string(),
        }
    }
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable                 | Default                |
    /// |--------------------------|------------------------|
    /// | `EMAIL_FROM`             | `noreply@campus.local` |
    /// | `EMAIL_SUBJECT_PREFIX`   | `[Campus]`             |
    /// | `EMAIL_RECIPIENT_DOMAIN` | `campus.local`         |
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            from_address: std::env::var("EMAIL_FROM").unwrap_or(defaults.from_address),
            subject_prefix: std::env::var("EMAIL_SUBJECT_PREFIX")
                .unwrap_or(defaults.subject_prefix),
            recipient_domain: std::env::var("EMAIL_RECIPIENT_DOMAIN")
                .unwrap_or(defaults.recipient_domain),
        }
    }

    pub fn recipient_for(&self, user_id: DbId) -> String {
        format!("user{user_id}@{}", self.recipient_domain)
    }

    fn subject(&self, text: &str) -> String {
        format!("{} {}", self.subject_prefix, text)
    }
}

// ---------------------------------------------------------------------------
// OutgoingEmail
// ---------------------------------------------------------------------------

/// A rendered plain-text email addressed to one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub user_id: DbId,
    pub subject: String,
    pub body: String,
}

impl OutgoingEmail {
    /// A single real-time notification.
    pub fn for_notification(config: &EmailConfig, notification: &Notification) -> Self {
        let mut body = notification.message.clone();
        if let Some(url) = &notification.action_url {
            let text = notification.action_text.as_deref().unwrap_or("Open");
            body.push_str(&format!("\n\n{text}: {url}"));
        }

        Self {
            user_id: notification.user_id,
            subject: config.subject(&notification.title),
            body,
        }
    }

    /// A batch of queued notifications for one user.
    pub fn digest(
        config: &EmailConfig,
        user_id: DbId,
        frequency: EmailFrequency,
        entries: &[DigestEntry],
    ) -> Self {
        let period = match frequency {
            EmailFrequency::Weekly => "weekly",
            _ => "daily",
        };
        let noun = if entries.len() == 1 {
            "notification"
        } else {
            "notifications"
        };

        let mut body = format!("Here is your {period} summary:\n");
        for entry in entries {
            body.push_str(&format!("\n- {}: {}", entry.title, entry.message));
            if let Some(url) = &entry.action_url {
                body.push_str(&format!(" ({url})"));
            }
        }

        Self {
            user_id,
            subject: config.subject(&format!(
                "Your {period} digest ({} {noun})",
                entries.len()
            )),
            body,
        }
    }
}

// ---------------------------------------------------------------------------
// EmailSender
// ---------------------------------------------------------------------------

/// Delivers rendered emails.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError>;
}

/// Builds each message and logs it instead of handing it to a mail server.
pub struct LogMailer {
    config: EmailConfig,
}

impl LogMailer {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Assemble the MIME message for an email.
    pub fn build_message(&self, email: &OutgoingEmail) -> Result<Message, EmailError> {
        let from: Mailbox = self.config.from_address.parse()?;
        let to: Mailbox = self.config.recipient_for(email.user_id).parse()?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())
            .map_err(|e| EmailError::Build(e.to_string()))
    }
}

#[async_trait]
impl EmailSender for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError> {
        let message = self.build_message(email)?;
        let bytes = message.formatted().len();

        tracing::info!(
            user_id = email.user_id,
            to = %self.config.recipient_for(email.user_id),
            subject = %email.subject,
            bytes,
            "Notification email rendered",
        );
        Ok(())
    }
}
