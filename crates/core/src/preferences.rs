//! Per-user notification preferences.
//!
//! A [`UserNotificationPreferences`] record holds three levels of switches:
//! a global pair (in-app / email), one switch per category, and a sparse set
//! of per-subcategory, per-channel [`TriState`] overrides. The record is
//! owned by the preference store; the resolution engine only reads it.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::channels::Channel;
use crate::error::CoreError;
use crate::taxonomy::{NotificationCategory, NotificationSubcategory};
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// TriState
// ---------------------------------------------------------------------------

/// A subcategory override for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TriState {
    On,
    Off,
    /// Defer to the owning category's current state.
    #[default]
    Inherit,
}

impl TriState {
    /// Wire form: `true` / `false` / `null`.
    pub fn to_wire(self) -> Option<bool> {
        match self {
            TriState::On => Some(true),
            TriState::Off => Some(false),
            TriState::Inherit => None,
        }
    }

    pub fn from_wire(value: Option<bool>) -> Self {
        match value {
            Some(true) => TriState::On,
            Some(false) => TriState::Off,
            None => TriState::Inherit,
        }
    }
}

// ---------------------------------------------------------------------------
// EmailFrequency
// ---------------------------------------------------------------------------

/// When email notifications are sent. Consulted by the email dispatcher,
/// never by the resolution engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailFrequency {
    #[default]
    Realtime,
    Daily,
    Weekly,
    #[serde(rename = "none", alias = "off")]
    Off,
}

impl EmailFrequency {
    pub fn as_str(self) -> &'static str {
        match self {
            EmailFrequency::Realtime => "realtime",
            EmailFrequency::Daily => "daily",
            EmailFrequency::Weekly => "weekly",
            EmailFrequency::Off => "none",
        }
    }
}

impl fmt::Display for EmailFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmailFrequency {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "realtime" => Ok(EmailFrequency::Realtime),
            "daily" => Ok(EmailFrequency::Daily),
            "weekly" => Ok(EmailFrequency::Weekly),
            "none" | "off" => Ok(EmailFrequency::Off),
            other => Err(CoreError::Validation(format!(
                "Unknown email frequency '{other}'. Expected one of: realtime, daily, weekly, none"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// QuietHours
// ---------------------------------------------------------------------------

/// A daily UTC window during which real-time pushes are held back.
///
/// When `start > end` the window wraps midnight (e.g. 22:00 - 08:00).
/// Both bounds are inclusive at minute granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuietHours {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl QuietHours {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Parse a pair of `HH:MM` (or `HH:MM:SS`) strings.
    pub fn parse(start: &str, end: &str) -> Result<Self, CoreError> {
        Ok(Self::new(parse_clock_time(start)?, parse_clock_time(end)?))
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        let now = minute_of_day(time);
        let start = minute_of_day(self.start);
        let end = minute_of_day(self.end);

        if start > end {
            now >= start || now <= end
        } else {
            now >= start && now <= end
        }
    }
}

fn minute_of_day(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

/// Parse `HH:MM` or `HH:MM:SS`.
pub fn parse_clock_time(value: &str) -> Result<NaiveTime, CoreError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| CoreError::Validation(format!("Invalid time '{value}'. Expected HH:MM")))
}

/// Format a time as `HH:MM`.
pub fn format_clock_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

// ---------------------------------------------------------------------------
// UserNotificationPreferences
// ---------------------------------------------------------------------------

/// All notification switches for one user.
///
/// Missing category entries read as enabled and missing overrides read as
/// [`TriState::Inherit`], so records written before a subcategory existed
/// stay valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserNotificationPreferences {
    pub global_in_app: bool,
    pub global_email: bool,
    pub email_frequency: EmailFrequency,
    pub category_enabled: BTreeMap<NotificationCategory, bool>,
    pub subcategory_override: BTreeMap<(NotificationSubcategory, Channel), TriState>,
    pub quiet_hours: Option<QuietHours>,
}

impl Default for UserNotificationPreferences {
    fn default() -> Self {
        Self {
            global_in_app: true,
            global_email: true,
            email_frequency: EmailFrequency::default(),
            category_enabled: BTreeMap::new(),
            subcategory_override: BTreeMap::new(),
            quiet_hours: None,
        }
    }
}

impl UserNotificationPreferences {
    pub fn global(&self, channel: Channel) -> bool {
        match channel {
            Channel::InApp => self.global_in_app,
            Channel::Email => self.global_email,
        }
    }

    pub fn set_global(&mut self, channel: Channel, enabled: bool) {
        match channel {
            Channel::InApp => self.global_in_app = enabled,
            Channel::Email => self.global_email = enabled,
        }
    }

    pub fn category_enabled(&self, category: NotificationCategory) -> bool {
        self.category_enabled.get(&category).copied().unwrap_or(true)
    }

    /// Toggle a category switch. Stored subcategory overrides are left as
    /// they are; only what `Inherit` evaluates to changes.
    pub fn set_category_enabled(&mut self, category: NotificationCategory, enabled: bool) {
        self.category_enabled.insert(category, enabled);
    }

    pub fn override_for(&self, subcategory: NotificationSubcategory, channel: Channel) -> TriState {
        self.subcategory_override
            .get(&(subcategory, channel))
            .copied()
            .unwrap_or_default()
    }

    /// Set an override. `Inherit` removes the entry, keeping the map sparse.
    pub fn set_override(
        &mut self,
        subcategory: NotificationSubcategory,
        channel: Channel,
        value: TriState,
    ) {
        match value {
            TriState::Inherit => {
                self.subcategory_override.remove(&(subcategory, channel));
            }
            explicit => {
                self.subcategory_override.insert((subcategory, channel), explicit);
            }
        }
    }

    pub fn in_quiet_hours(&self, now: Timestamp) -> bool {
        self.quiet_hours.is_some_and(|q| q.contains(now.time()))
    }
}
