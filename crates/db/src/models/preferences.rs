//! JSON wire format for user notification preferences.
//!
//! The document is a flat PascalCase object:
//!
//! ```text
//! EnableInAppNotifications / EnableEmailNotifications   global switches
//! EmailDigestFrequency                                  "none" | "realtime" | "daily" | "weekly"
//! QuietHoursStart / QuietHoursEnd                       "HH:MM" or null
//! Enable<Category>Updates (EnableSystemAlerts)          category switches
//! Enable<Subcategory> / Email<Subcategory>              true | false | null (inherit)
//! ```
//!
//! Shorter names (`EnableInApp`, `EnableEmail`, `EmailFrequency`,
//! `EnableProgress`, ...) are accepted on input.

use std::collections::BTreeMap;

use campus_core::channels::Channel;
use campus_core::error::CoreError;
use campus_core::preferences::{
    format_clock_time, EmailFrequency, QuietHours, TriState, UserNotificationPreferences,
};
use campus_core::taxonomy::{NotificationCategory, NotificationSubcategory};
use campus_core::types::DbId;
use serde::Serialize;
use serde_json::{Map, Value};

pub const FIELD_USER_ID: &str = "UserId";
pub const FIELD_IN_APP: &str = "EnableInAppNotifications";
pub const FIELD_EMAIL: &str = "EnableEmailNotifications";
pub const FIELD_FREQUENCY: &str = "EmailDigestFrequency";
pub const FIELD_QUIET_START: &str = "QuietHoursStart";
pub const FIELD_QUIET_END: &str = "QuietHoursEnd";

/// A document field, independent of which name it was sent under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Field {
    UserId,
    Global(Channel),
    Frequency,
    QuietStart,
    QuietEnd,
    Category(NotificationCategory),
    Override(NotificationSubcategory, Channel),
}

fn lookup_field(key: &str) -> Option<Field> {
    let fixed = match key {
        FIELD_USER_ID => Some(Field::UserId),
        FIELD_IN_APP | "EnableInApp" => Some(Field::Global(Channel::InApp)),
        FIELD_EMAIL | "EnableEmail" => Some(Field::Global(Channel::Email)),
        FIELD_FREQUENCY | "EmailFrequency" => Some(Field::Frequency),
        FIELD_QUIET_START => Some(Field::QuietStart),
        FIELD_QUIET_END => Some(Field::QuietEnd),
        _ => None,
    };
    if fixed.is_some() {
        return fixed;
    }

    if let Some(category) = NotificationCategory::ALL
        .into_iter()
        .find(|c| c.field_name() == key || c.field_alias() == key)
    {
        return Some(Field::Category(category));
    }

    Channel::ALL.into_iter().find_map(|channel| {
        let suffix = key.strip_prefix(channel.field_prefix())?;
        NotificationSubcategory::all()
            .find(|s| s.wire_name() == suffix)
            .map(|s| Field::Override(s, channel))
    })
}

fn override_field_name(subcategory: NotificationSubcategory, channel: Channel) -> String {
    format!("{}{}", channel.field_prefix(), subcategory.wire_name())
}

// ---------------------------------------------------------------------------
// Document (output)
// ---------------------------------------------------------------------------

/// The full preferences document returned to clients.
///
/// Every field is always present. Forced subcategories always read `true`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PreferencesDocument(pub Map<String, Value>);

impl PreferencesDocument {
    pub fn from_preferences(user_id: DbId, prefs: &UserNotificationPreferences) -> Self {
        let mut doc = Map::new();
        doc.insert(FIELD_USER_ID.into(), Value::from(user_id));
        doc.insert(FIELD_IN_APP.into(), Value::Bool(prefs.global_in_app));
        doc.insert(FIELD_EMAIL.into(), Value::Bool(prefs.global_email));
        doc.insert(
            FIELD_FREQUENCY.into(),
            Value::from(prefs.email_frequency.as_str()),
        );

        let (start, end) = match prefs.quiet_hours {
            Some(q) => (
                Value::from(format_clock_time(q.start)),
                Value::from(format_clock_time(q.end)),
            ),
            None => (Value::Null, Value::Null),
        };
        doc.insert(FIELD_QUIET_START.into(), start);
        doc.insert(FIELD_QUIET_END.into(), end);

        for category in NotificationCategory::ALL {
            doc.insert(
                category.field_name().into(),
                Value::Bool(prefs.category_enabled(category)),
            );
        }

        for subcategory in NotificationSubcategory::all() {
            for channel in Channel::ALL {
                let value = if subcategory.forces_delivery() {
                    Value::Bool(true)
                } else {
                    prefs
                        .override_for(subcategory, channel)
                        .to_wire()
                        .map_or(Value::Null, Value::Bool)
                };
                doc.insert(override_field_name(subcategory, channel), value);
            }
        }

        Self(doc)
    }
}

// ---------------------------------------------------------------------------
// Patch (input)
// ---------------------------------------------------------------------------

/// A validated partial update. Fields that were absent are `None` / missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreferencesPatch {
    pub global_in_app: Option<bool>,
    pub global_email: Option<bool>,
    pub email_frequency: Option<EmailFrequency>,
    /// `Some(None)` clears quiet hours.
    pub quiet_hours: Option<Option<QuietHours>>,
    pub categories: BTreeMap<NotificationCategory, bool>,
    pub overrides: BTreeMap<(NotificationSubcategory, Channel), TriState>,
}

fn expect_bool(key: &str, value: &Value) -> Result<bool, CoreError> {
    value
        .as_bool()
        .ok_or_else(|| CoreError::Validation(format!("Field '{key}' must be true or false")))
}

fn expect_clock_time(key: &str, value: &Value) -> Result<Option<String>, CoreError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        _ => Err(CoreError::Validation(format!(
            "Field '{key}' must be a \"HH:MM\" string or null"
        ))),
    }
}

impl PreferencesPatch {
    /// Validate a JSON object into a patch.
    ///
    /// Rejects unknown keys, the same field given under two names, `null` on
    /// non-tri-state fields, disabling a forced subcategory, and quiet hours
    /// given without their other half.
    pub fn from_json(body: &Value) -> Result<Self, CoreError> {
        let object = body.as_object().ok_or_else(|| {
            CoreError::Validation("Preferences update must be a JSON object".into())
        })?;

        let mut seen: BTreeMap<Field, &str> = BTreeMap::new();
        let mut patch = PreferencesPatch::default();
        let mut quiet_start: Option<Option<String>> = None;
        let mut quiet_end: Option<Option<String>> = None;

        for (key, value) in object {
            let field = lookup_field(key)
                .ok_or_else(|| CoreError::Validation(format!("Unknown preference field '{key}'")))?;
            if let Some(previous) = seen.insert(field, key) {
                return Err(CoreError::Validation(format!(
                    "Fields '{previous}' and '{key}' set the same preference"
                )));
            }

            match field {
                Field::UserId => {}
                Field::Global(Channel::InApp) => patch.global_in_app = Some(expect_bool(key, value)?),
                Field::Global(Channel::Email) => patch.global_email = Some(expect_bool(key, value)?),
                Field::Frequency => {
                    let raw = value.as_str().ok_or_else(|| {
                        CoreError::Validation(format!(
                            "Field '{key}' must be one of: none, realtime, daily, weekly"
                        ))
                    })?;
                    patch.email_frequency = Some(raw.parse()?);
                }
                Field::QuietStart => quiet_start = Some(expect_clock_time(key, value)?),
                Field::QuietEnd => quiet_end = Some(expect_clock_time(key, value)?),
                Field::Category(category) => {
                    patch.categories.insert(category, expect_bool(key, value)?);
                }
                Field::Override(subcategory, channel) => {
                    let wire = match value {
                        Value::Null => None,
                        Value::Bool(b) => Some(*b),
                        _ => {
                            return Err(CoreError::Validation(format!(
                                "Field '{key}' must be true, false or null"
                            )))
                        }
                    };
                    if subcategory.forces_delivery() {
                        if wire == Some(false) {
                            return Err(CoreError::Validation(format!(
                                "{subcategory} notifications cannot be disabled"
                            )));
                        }
                        continue;
                    }
                    patch
                        .overrides
                        .insert((subcategory, channel), TriState::from_wire(wire));
                }
            }
        }

        patch.quiet_hours = match (quiet_start, quiet_end) {
            (None, None) => None,
            (Some(None), Some(None)) => Some(None),
            (Some(Some(start)), Some(Some(end))) => Some(Some(QuietHours::parse(&start, &end)?)),
            _ => {
                return Err(CoreError::Validation(format!(
                    "'{FIELD_QUIET_START}' and '{FIELD_QUIET_END}' must be set or cleared together"
                )))
            }
        };

        Ok(patch)
    }

    pub fn is_empty(&self) -> bool {
        *self == PreferencesPatch::default()
    }

    /// Apply the patch. Category switches never touch stored overrides.
    pub fn apply(&self, prefs: &mut UserNotificationPreferences) {
        if let Some(enabled) = self.global_in_app {
            prefs.set_global(Channel::InApp, enabled);
        }
        if let Some(enabled) = self.global_email {
            prefs.set_global(Channel::Email, enabled);
        }
        if let Some(frequency) = self.email_frequency {
            prefs.email_frequency = frequency;
        }
        if let Some(quiet_hours) = self.quiet_hours {
            prefs.quiet_hours = quiet_hours;
        }
        for (&category, &enabled) in &self.categories {
            prefs.set_category_enabled(category, enabled);
        }
        for (&(subcategory, channel), &value) in &self.overrides {
            prefs.set_override(subcategory, channel, value);
        }
    }
}

// ---------------------------------------------------------------------------
// Taxonomy view
// ---------------------------------------------------------------------------

/// One subcategory as shown to clients rendering the preference toggles.
#[derive(Debug, Clone, Serialize)]
pub struct SubcategoryView {
    pub name: &'static str,
    pub label: &'static str,
    pub in_app_field: String,
    pub email_field: String,
    pub forced_delivery: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryView {
    pub name: &'static str,
    pub label: &'static str,
    pub field: &'static str,
    pub subcategories: Vec<SubcategoryView>,
}

/// The category tree with the document field backing every toggle.
pub fn taxonomy_view() -> Vec<CategoryView> {
    NotificationCategory::ALL
        .into_iter()
        .map(|category| CategoryView {
            name: category.as_str(),
            label: category.label(),
            field: category.field_name(),
            subcategories: category
                .subcategories()
                .map(|sub| {
                    let info = sub.info();
                    SubcategoryView {
                        name: info.name,
                        label: info.label,
                        in_app_field: override_field_name(sub, Channel::InApp),
                        email_field: override_field_name(sub, Channel::Email),
                        forced_delivery: info.forced_delivery,
                    }
                })
                .collect(),
        })
        .collect()
}
