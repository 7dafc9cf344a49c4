//! The delivery gate: turns notification drafts into stored records, push
//! events and emails according to each recipient's preferences.

pub mod dispatcher;

pub use dispatcher::{DispatchOutcome, NotificationDispatcher};
