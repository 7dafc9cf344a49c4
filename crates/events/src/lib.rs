//! Campus notification events and delivery infrastructure.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`, carrying [`NotificationEvent`]s to real-time
//!   listeners.
//! - [`delivery`]: the email seam ([`EmailSender`]) and message rendering.
//! - [`DigestScheduler`]: periodic sender of daily and weekly digests.

pub mod bus;
pub mod delivery;
pub mod digest;

pub use bus::{EventBus, NotificationEvent};
pub use delivery::email::{EmailConfig, EmailError, EmailSender, LogMailer, OutgoingEmail};
pub use digest::DigestScheduler;
