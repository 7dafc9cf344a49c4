//! Record structs and DTOs.
//!
//! - [`notification`]: stored notifications and their email status
//! - [`digest`]: notifications waiting for a daily or weekly digest email
//! - [`preferences`]: the JSON wire format of user preferences

pub mod digest;
pub mod notification;
pub mod preferences;
