//! Handlers for the `/notifications` resource.
//!
//! All endpoints act on behalf of the [`ActingUser`].

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use campus_core::channels::Channel;
use campus_core::error::CoreError;
use campus_core::notification::{NotificationDraft, NotificationType, Priority};
use campus_core::resolution::{resolve, should_deliver, ChannelDecision};
use campus_core::taxonomy::NotificationSubcategory;
use campus_core::templates::{
    assessment_due_reminders, at_risk_alerts, new_comment_alerts, weekly_progress_summary,
    AtRiskStudent, CommentPosted, DueAssessment, WeeklyActivity,
};
use campus_core::types::{DbId, Timestamp};
use campus_db::models::notification::{Notification, NotificationListParams};
use campus_db::models::preferences::{
    taxonomy_view, CategoryView, PreferencesDocument, PreferencesPatch,
};
use campus_db::repositories::{NotificationPreferenceRepo, NotificationRepo};
use campus_events::bus::{
    EVENT_NOTIFICATIONS_ALL_READ, EVENT_NOTIFICATION_DELETED, EVENT_NOTIFICATION_READ,
    EVENT_PREFERENCES_UPDATED,
};
use campus_events::NotificationEvent;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::user::ActingUser;
use crate::notifications::DispatchOutcome;
use crate::response::DataResponse;
use crate::state::AppState;

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Notification",
        id,
    })
}

// ---------------------------------------------------------------------------
// Notification CRUD
// ---------------------------------------------------------------------------

/// GET /api/v1/notifications
pub async fn list_notifications(
    user: ActingUser,
    State(state): State<AppState>,
    Query(params): Query<NotificationListParams>,
) -> AppResult<Json<DataResponse<Vec<Notification>>>> {
    let notifications = NotificationRepo::list_for_user(&state.pool, user.user_id, &params).await;
    Ok(Json(DataResponse {
        data: notifications,
    }))
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub count: usize,
}

/// GET /api/v1/notifications/unread-count
pub async fn unread_count(
    user: ActingUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<UnreadCount>>> {
    let count = NotificationRepo::unread_count(&state.pool, user.user_id).await;
    Ok(Json(DataResponse {
        data: UnreadCount { count },
    }))
}

/// POST /api/v1/notifications/{id}/read
///
/// Returns 204 No Content, or 404 if the notification does not belong to
/// the acting user.
pub async fn mark_read(
    user: ActingUser,
    State(state): State<AppState>,
    Path(notification_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if !NotificationRepo::mark_read(&state.pool, notification_id, user.user_id).await {
        return Err(not_found(notification_id));
    }

    state.event_bus.publish(
        NotificationEvent::new(EVENT_NOTIFICATION_READ, user.user_id)
            .with_notification(notification_id),
    );
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct MarkedRead {
    pub marked_read: u64,
}

/// POST /api/v1/notifications/read-all
pub async fn mark_all_read(
    user: ActingUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<MarkedRead>>> {
    let count = NotificationRepo::mark_all_read(&state.pool, user.user_id).await;

    if count > 0 {
        state.event_bus.publish(
            NotificationEvent::new(EVENT_NOTIFICATIONS_ALL_READ, user.user_id)
                .with_payload(serde_json::json!({ "count": count })),
        );
    }
    Ok(Json(DataResponse {
        data: MarkedRead { marked_read: count },
    }))
}

/// DELETE /api/v1/notifications/{id}
pub async fn delete_notification(
    user: ActingUser,
    State(state): State<AppState>,
    Path(notification_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if !NotificationRepo::delete(&state.pool, notification_id, user.user_id).await {
        return Err(not_found(notification_id));
    }

    state.event_bus.publish(
        NotificationEvent::new(EVENT_NOTIFICATION_DELETED, user.user_id)
            .with_notification(notification_id),
    );
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Preferences
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct PreferencesView {
    pub preferences: PreferencesDocument,
    /// The category tree, so clients can render every toggle.
    pub taxonomy: Vec<CategoryView>,
}

/// GET /api/v1/notifications/preferences
pub async fn get_preferences(
    user: ActingUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<PreferencesView>>> {
    let prefs = NotificationPreferenceRepo::get(&state.pool, user.user_id).await;

    Ok(Json(DataResponse {
        data: PreferencesView {
            preferences: PreferencesDocument::from_preferences(user.user_id, &prefs),
            taxonomy: taxonomy_view(),
        },
    }))
}

/// PATCH /api/v1/notifications/preferences
///
/// Absent fields are left unchanged; the whole update is rejected if any
/// field is invalid.
pub async fn update_preferences(
    user: ActingUser,
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> AppResult<Json<DataResponse<PreferencesDocument>>> {
    let patch = PreferencesPatch::from_json(&body)?;
    let prefs = NotificationPreferenceRepo::apply_patch(&state.pool, user.user_id, &patch).await;

    tracing::info!(
        user_id = user.user_id,
        categories = patch.categories.len(),
        overrides = patch.overrides.len(),
        "Notification preferences updated"
    );
    state
        .event_bus
        .publish(NotificationEvent::new(EVENT_PREFERENCES_UPDATED, user.user_id));

    Ok(Json(DataResponse {
        data: PreferencesDocument::from_preferences(user.user_id, &prefs),
    }))
}

/// Query parameters for `GET /notifications/resolve`.
#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    /// Subcategory name or preference wire name.
    pub subcategory: String,
    /// `in_app` or `email`; both channels are resolved when absent.
    pub channel: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub subcategory: NotificationSubcategory,
    pub category: &'static str,
    pub forced_delivery: bool,
    pub channels: ChannelDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<Channel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deliver: Option<bool>,
}

/// GET /api/v1/notifications/resolve?subcategory=&channel=
///
/// Evaluates the acting user's preferences for one notification kind.
pub async fn resolve_preference(
    user: ActingUser,
    State(state): State<AppState>,
    Query(query): Query<ResolveQuery>,
) -> AppResult<Json<DataResponse<ResolveResponse>>> {
    let subcategory: NotificationSubcategory = query.subcategory.parse()?;
    let channel = query
        .channel
        .as_deref()
        .map(str::parse::<Channel>)
        .transpose()?;

    let prefs = NotificationPreferenceRepo::get(&state.pool, user.user_id).await;

    Ok(Json(DataResponse {
        data: ResolveResponse {
            subcategory,
            category: subcategory.category().as_str(),
            forced_delivery: subcategory.forces_delivery(),
            channels: resolve(&prefs, subcategory),
            channel,
            deliver: channel.map(|ch| should_deliver(&prefs, subcategory, ch)),
        },
    }))
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Body of `POST /notifications/test`. Every field is optional.
#[derive(Debug, Default, Deserialize)]
pub struct TestNotificationRequest {
    /// Defaults to `ProfileUpdates`.
    pub subcategory: Option<String>,
    pub title: Option<String>,
    pub message: Option<String>,
    pub priority: Option<Priority>,
    pub expires_in_hours: Option<i64>,
}

/// POST /api/v1/notifications/test
///
/// Sends a notification to the acting user through the delivery gate.
pub async fn send_test_notification(
    user: ActingUser,
    State(state): State<AppState>,
    Json(input): Json<TestNotificationRequest>,
) -> AppResult<Json<DataResponse<DispatchOutcome>>> {
    let subcategory = match input.subcategory.as_deref() {
        Some(raw) => raw.parse()?,
        None => NotificationSubcategory::ProfileUpdates,
    };

    let mut draft = NotificationDraft::new(
        user.user_id,
        subcategory,
        NotificationType::System,
        input.title.unwrap_or_else(|| "Test Notification".into()),
        input
            .message
            .unwrap_or_else(|| "This is a test notification from Campus.".into()),
    )
    .with_priority(input.priority.unwrap_or_default());

    if let Some(hours) = input.expires_in_hours {
        let expires_at = (hours > 0)
            .then(|| Duration::try_hours(hours))
            .flatten()
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .ok_or_else(|| {
                AppError::BadRequest("expires_in_hours must be a positive number of hours".into())
            })?;
        draft = draft.with_expiry(expires_at);
    }

    let outcome = state.dispatcher.dispatch(draft).await;
    Ok(Json(DataResponse { data: outcome }))
}

/// Result of a trigger endpoint.
#[derive(Debug, Serialize)]
pub struct TriggerResult {
    pub dispatched: usize,
    pub outcomes: Vec<DispatchOutcome>,
}

async fn dispatch_drafts(
    state: &AppState,
    trigger: &'static str,
    actor: ActingUser,
    drafts: Vec<NotificationDraft>,
) -> Json<DataResponse<TriggerResult>> {
    let outcomes = state.dispatcher.dispatch_all(drafts).await;
    tracing::info!(
        trigger,
        actor_id = actor.user_id,
        dispatched = outcomes.len(),
        "Notification trigger processed"
    );
    Json(DataResponse {
        data: TriggerResult {
            dispatched: outcomes.len(),
            outcomes,
        },
    })
}

#[derive(Debug, Deserialize)]
pub struct AssessmentDueRequest {
    pub assessments: Vec<DueAssessment>,
    /// Reference time; defaults to now.
    pub now: Option<Timestamp>,
}

/// POST /api/v1/notifications/triggers/assessment-due
pub async fn trigger_assessment_due(
    user: ActingUser,
    State(state): State<AppState>,
    Json(input): Json<AssessmentDueRequest>,
) -> AppResult<Json<DataResponse<TriggerResult>>> {
    let now = input.now.unwrap_or_else(Utc::now);
    let drafts = assessment_due_reminders(&input.assessments, now);
    Ok(dispatch_drafts(&state, "assessment_due", user, drafts).await)
}

/// POST /api/v1/notifications/triggers/at-risk
pub async fn trigger_at_risk(
    user: ActingUser,
    State(state): State<AppState>,
    Json(input): Json<AtRiskStudent>,
) -> AppResult<Json<DataResponse<TriggerResult>>> {
    let drafts = at_risk_alerts(&input);
    Ok(dispatch_drafts(&state, "at_risk", user, drafts).await)
}

/// POST /api/v1/notifications/triggers/comment
pub async fn trigger_comment(
    user: ActingUser,
    State(state): State<AppState>,
    Json(input): Json<CommentPosted>,
) -> AppResult<Json<DataResponse<TriggerResult>>> {
    let drafts = new_comment_alerts(&input);
    Ok(dispatch_drafts(&state, "comment", user, drafts).await)
}

#[derive(Debug, Deserialize)]
pub struct WeeklySummaryRequest {
    pub activities: Vec<WeeklyActivity>,
}

/// POST /api/v1/notifications/triggers/weekly-summary
///
/// Users without activity are skipped.
pub async fn trigger_weekly_summary(
    user: ActingUser,
    State(state): State<AppState>,
    Json(input): Json<WeeklySummaryRequest>,
) -> AppResult<Json<DataResponse<TriggerResult>>> {
    let drafts = input
        .activities
        .iter()
        .filter_map(weekly_progress_summary)
        .collect();
    Ok(dispatch_drafts(&state, "weekly_summary", user, drafts).await)
}
