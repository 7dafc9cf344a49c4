//! Delivery channels and their well-known wire names.
//!
//! The string constants must match the values accepted by the `resolve`
//! endpoint and emitted in logs and event payloads.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// In-app notification stored for the notification bell and pushed in real time.
pub const CHANNEL_IN_APP: &str = "in_app";

/// Email notification, sent immediately or batched into a digest.
pub const CHANNEL_EMAIL: &str = "email";

/// A delivery medium. Each channel is resolved independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    InApp,
    Email,
}

impl Channel {
    /// Every channel, in resolution order.
    pub const ALL: [Channel; 2] = [Channel::InApp, Channel::Email];

    pub fn as_str(self) -> &'static str {
        match self {
            Channel::InApp => CHANNEL_IN_APP,
            Channel::Email => CHANNEL_EMAIL,
        }
    }

    /// Prefix used for this channel's per-subcategory field in the
    /// preferences document (`EnableLessonCompletion` / `EmailLessonCompletion`).
    pub fn field_prefix(self) -> &'static str {
        match self {
            Channel::InApp => "Enable",
            Channel::Email => "Email",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            CHANNEL_IN_APP | "inapp" | "InApp" => Ok(Channel::InApp),
            CHANNEL_EMAIL | "Email" => Ok(Channel::Email),
            other => Err(CoreError::Validation(format!(
                "Unknown channel '{other}'. Expected one of: {CHANNEL_IN_APP}, {CHANNEL_EMAIL}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wire_names() {
        assert_eq!("in_app".parse::<Channel>().unwrap(), Channel::InApp);
        assert_eq!("email".parse::<Channel>().unwrap(), Channel::Email);
    }

    #[test]
    fn rejects_unknown_channel() {
        let err = "sms".parse::<Channel>().unwrap_err();
        assert!(err.to_string().contains("Unknown channel 'sms'"));
    }

    #[test]
    fn display_matches_constants() {
        assert_eq!(Channel::InApp.to_string(), CHANNEL_IN_APP);
        assert_eq!(Channel::Email.to_string(), CHANNEL_EMAIL);
    }
}
