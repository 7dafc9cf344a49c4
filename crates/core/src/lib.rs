//! Campus notification domain.
//!
//! This crate has zero internal dependencies so the taxonomy, preference
//! model and resolution engine can be shared by the store, the event
//! services and the HTTP layer alike.

pub mod channels;
pub mod digest_schedule;
pub mod error;
pub mod notification;
pub mod preferences;
pub mod resolution;
pub mod taxonomy;
pub mod templates;
pub mod types;
