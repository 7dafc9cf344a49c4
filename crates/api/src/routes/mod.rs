pub mod health;
pub mod notification;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /notifications                              list (?unread_only, include_suppressed, limit, offset)
/// /notifications/unread-count                 unread count (GET)
/// /notifications/read-all                     mark all read (POST)
/// /notifications/{id}/read                    mark read (POST)
/// /notifications/{id}                         delete (DELETE)
/// /notifications/preferences                  get / partial update (GET, PATCH)
/// /notifications/resolve                      engine query (GET ?subcategory, channel)
/// /notifications/test                         dispatch a test notification (POST)
/// /notifications/triggers/*                   feature-flow triggers (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/notifications", notification::router())
}
