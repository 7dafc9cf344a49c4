//! Route definitions for the `/notifications` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::notification;
use crate::state::AppState;

/// Routes mounted at `/notifications`.
///
/// ```text
/// GET    /                          -> list_notifications
/// GET    /unread-count              -> unread_count
/// POST   /read-all                  -> mark_all_read
/// POST   /{id}/read                 -> mark_read
/// DELETE /{id}                      -> delete_notification
///
/// GET    /preferences               -> get_preferences
/// PATCH  /preferences               -> update_preferences
/// GET    /resolve                   -> resolve_preference
///
/// POST   /test                      -> send_test_notification
/// POST   /triggers/assessment-due   -> trigger_assessment_due
/// POST   /triggers/at-risk          -> trigger_at_risk
/// POST   /triggers/comment          -> trigger_comment
/// POST   /triggers/weekly-summary   -> trigger_weekly_summary
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        // Core notification endpoints
        .route("/", get(notification::list_notifications))
        .route("/unread-count", get(notification::unread_count))
        .route("/read-all", post(notification::mark_all_read))
        .route("/{id}/read", post(notification::mark_read))
        .route(
            "/{id}",
            axum::routing::delete(notification::delete_notification),
        )
        // Preferences
        .route(
            "/preferences",
            get(notification::get_preferences).patch(notification::update_preferences),
        )
        .route("/resolve", get(notification::resolve_preference))
        // Dispatch
        .route("/test", post(notification::send_test_notification))
        .route(
            "/triggers/assessment-due",
            post(notification::trigger_assessment_due),
        )
        .route("/triggers/at-risk", post(notification::trigger_at_risk))
        .route("/triggers/comment", post(notification::trigger_comment))
        .route(
            "/triggers/weekly-summary",
            post(notification::trigger_weekly_summary),
        )
}
