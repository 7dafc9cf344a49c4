//! Preference resolution: decides whether a notification kind is delivered
//! on a channel for a given user.
//!
//! Evaluation order, first match wins:
//!
//! 1. Forced subcategories (security alerts) always deliver.
//! 2. The global switch for the channel is a ceiling.
//! 3. The owning category's switch is a ceiling.
//! 4. The subcategory override decides: `On` / `Off`, or `Inherit` the
//!    (already enabled) category.
//!
//! Lower levels can only narrow what higher levels allow; nothing below the
//! global switch can turn a channel back on.

use serde::Serialize;

use crate::channels::Channel;
use crate::preferences::{TriState, UserNotificationPreferences};
use crate::taxonomy::NotificationSubcategory;

/// Whether `subcategory` should be delivered to the user on `channel`.
pub fn should_deliver(
    prefs: &UserNotificationPreferences,
    subcategory: NotificationSubcategory,
    channel: Channel,
) -> bool {
    if subcategory.forces_delivery() {
        return true;
    }

    if !prefs.global(channel) {
        return false;
    }

    let category_on = prefs.category_enabled(subcategory.category());
    if !category_on {
        return false;
    }

    match prefs.override_for(subcategory, channel) {
        TriState::On => true,
        TriState::Off => false,
        TriState::Inherit => category_on,
    }
}

/// The outcome of resolving both channels for one notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChannelDecision {
    pub in_app: bool,
    pub email: bool,
}

/// Resolve every channel for `subcategory`, one independent call each.
pub fn resolve(
    prefs: &UserNotificationPreferences,
    subcategory: NotificationSubcategory,
) -> ChannelDecision {
    ChannelDecision {
        in_app: should_deliver(prefs, subcategory, Channel::InApp),
        email: should_deliver(prefs, subcategory, Channel::Email),
    }
}
