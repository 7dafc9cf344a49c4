//! Request extractors.
//!
//! - [`user::ActingUser`] -- the user a request acts on behalf of.

pub mod user;
