//! Storage for notification preferences, notification records and queued
//! digest entries.
//!
//! Everything lives in memory behind `tokio::sync::RwLock`s inside a single
//! [`Store`]. Repositories are zero-sized structs whose async methods take
//! `&Store` as their first argument.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use campus_core::preferences::UserNotificationPreferences;
use campus_core::types::DbId;
use tokio::sync::RwLock;

use crate::models::digest::DigestEntry;
use crate::models::notification::Notification;

pub mod models;
pub mod repositories;

/// Shared handle to the store, cloned into request state and background jobs.
pub type DbPool = Arc<Store>;

/// Backing tables.
#[derive(Debug)]
pub struct Store {
    pub(crate) preferences: RwLock<HashMap<DbId, Arc<UserNotificationPreferences>>>,
    pub(crate) notifications: RwLock<BTreeMap<DbId, Notification>>,
    pub(crate) digest_entries: RwLock<BTreeMap<DbId, DigestEntry>>,
    next_id: AtomicI64,
}

impl Default for Store {
    fn default() -> Self {
        Self {
            preferences: RwLock::new(HashMap::new()),
            notifications: RwLock::new(BTreeMap::new()),
            digest_entries: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Store {
    /// Allocate the next record id. Ids are unique across all tables.
    pub(crate) fn next_id(&self) -> DbId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

/// Create an empty store.
pub fn create_pool() -> DbPool {
    Arc::new(Store::default())
}

/// Record counts reported by the health endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct StoreStats {
    pub users_with_preferences: usize,
    pub notifications: usize,
    pub pending_digest_entries: usize,
}

/// Verify every table can be read and report its size.
pub async fn health_check(pool: &Store) -> StoreStats {
    let users_with_preferences = pool.preferences.read().await.len();
    let notifications = pool.notifications.read().await.len();
    let pending_digest_entries = pool
        .digest_entries
        .read()
        .await
        .values()
        .filter(|e| e.sent_at.is_none())
        .count();

    StoreStats {
        users_with_preferences,
        notifications,
        pending_digest_entries,
    }
}
