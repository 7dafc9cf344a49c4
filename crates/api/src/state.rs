use std::sync::Arc;

use campus_events::{EmailSender, EventBus};

use crate::config::ServerConfig;
use crate::notifications::NotificationDispatcher;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything inside is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub pool: campus_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Real-time notification events (the push transport subscribes here).
    pub event_bus: Arc<EventBus>,
    pub mailer: Arc<dyn EmailSender>,
    /// The delivery gate every outbound notification goes through.
    pub dispatcher: Arc<NotificationDispatcher>,
}

impl AppState {
    pub fn new(
        pool: campus_db::DbPool,
        config: ServerConfig,
        event_bus: Arc<EventBus>,
        mailer: Arc<dyn EmailSender>,
    ) -> Self {
        let dispatcher = Arc::new(NotificationDispatcher::new(
            Arc::clone(&pool),
            Arc::clone(&event_bus),
            Arc::clone(&mailer),
            config.email.clone(),
        ));

        Self {
            pool,
            config: Arc::new(config),
            event_bus,
            mailer,
            dispatcher,
        }
    }
}
