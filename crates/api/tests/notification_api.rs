//! Integration tests for the `/api/v1/notifications` endpoints.

mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, get, get_as, patch_json, post_json, send_as, TestApp};
use serde_json::json;

const USER: i64 = 7;
const OTHER_USER: i64 = 8;

const PREFS: &str = "/api/v1/notifications/preferences";

// ---------------------------------------------------------------------------
// Acting user
// ---------------------------------------------------------------------------

#[tokio::test]
async fn requests_without_user_header_are_unauthorized() {
    let app = common::build_test_app();
    let response = get(app, "/api/v1/notifications").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn non_positive_user_header_is_unauthorized() {
    let app = common::build_test_app();
    let response = get_as(app, 0, PREFS).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Preferences
// ---------------------------------------------------------------------------

#[tokio::test]
async fn default_preferences_document() {
    let app = common::build_test_app();
    let response = get_as(app, USER, PREFS).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let prefs = &json["data"]["preferences"];
    assert_eq!(prefs["UserId"], USER);
    assert_eq!(prefs["EnableInAppNotifications"], true);
    assert_eq!(prefs["EnableEmailNotifications"], true);
    assert_eq!(prefs["EmailDigestFrequency"], "realtime");
    assert!(prefs["QuietHoursStart"].is_null());
    assert_eq!(prefs["EnableProgressUpdates"], true);
    assert_eq!(prefs["EnableSystemAlerts"], true);
    assert!(prefs["EnableLessonCompletion"].is_null());
    assert!(prefs["EmailComments"].is_null());
    assert_eq!(prefs["EnableSecurityAlerts"], true);
    assert_eq!(prefs["EmailSecurityAlerts"], true);

    let taxonomy = json["data"]["taxonomy"].as_array().unwrap();
    assert_eq!(taxonomy.len(), 5);
    assert_eq!(taxonomy[0]["field"], "EnableProgressUpdates");
}

#[tokio::test]
async fn patch_updates_only_given_fields() {
    let app = common::build_test_app();

    let response = patch_json(
        app.clone(),
        USER,
        PREFS,
        json!({
            "EmailFrequency": "daily",
            "EnableProgressUpdates": false,
            "EmailReplies": false,
            "QuietHoursStart": "22:00",
            "QuietHoursEnd": "07:30",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["EmailDigestFrequency"], "daily");
    assert_eq!(json["data"]["EnableProgressUpdates"], false);
    assert_eq!(json["data"]["EmailReplies"], false);
    assert_eq!(json["data"]["QuietHoursStart"], "22:00");
    assert_eq!(json["data"]["QuietHoursEnd"], "07:30");

    // Untouched fields keep their values and the update persists.
    let json = body_json(get_as(app.clone(), USER, PREFS).await).await;
    let prefs = &json["data"]["preferences"];
    assert_eq!(prefs["EnableInAppNotifications"], true);
    assert_eq!(prefs["EmailDigestFrequency"], "daily");
    assert!(prefs["EnableReplies"].is_null());

    // Null resets an override to inherit.
    let json = body_json(patch_json(app, USER, PREFS, json!({ "EmailReplies": null })).await).await;
    assert!(json["data"]["EmailReplies"].is_null());
}

#[tokio::test]
async fn patch_is_per_user() {
    let app = common::build_test_app();
    patch_json(app.clone(), USER, PREFS, json!({ "EnableEmail": false })).await;

    let json = body_json(get_as(app, OTHER_USER, PREFS).await).await;
    assert_eq!(json["data"]["preferences"]["EnableEmailNotifications"], true);
}

#[tokio::test]
async fn invalid_patches_are_rejected_without_changes() {
    let app = common::build_test_app();

    let invalid = [
        json!({ "EnableInApp": false, "NoSuchField": true }),
        json!({ "EnableInApp": false, "EnableInAppNotifications": false }),
        json!({ "EnableSecurityAlerts": false }),
        json!({ "QuietHoursStart": "22:00" }),
        json!({ "QuietHoursStart": "25:00", "QuietHoursEnd": "07:00" }),
        json!({ "EmailDigestFrequency": "hourly" }),
        json!({ "EnableInAppNotifications": null }),
        json!({ "EnableReplies": "yes" }),
        json!(["EnableInApp"]),
    ];

    for body in invalid {
        let response = patch_json(app.clone(), USER, PREFS, body.clone()).await;
        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "expected 400 for {body}"
        );
        let json = body_json(response).await;
        assert_eq!(json["code"], "VALIDATION_ERROR");
    }

    let json = body_json(get_as(app, USER, PREFS).await).await;
    assert_eq!(json["data"]["preferences"]["EnableInAppNotifications"], true);
}

#[tokio::test]
async fn forced_subcategory_accepts_true() {
    let app = common::build_test_app();
    let response = patch_json(app, USER, PREFS, json!({ "EnableSecurityAlerts": true })).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Resolve
// ---------------------------------------------------------------------------

#[tokio::test]
async fn resolve_follows_switch_order() {
    let app = common::build_test_app();
    patch_json(
        app.clone(),
        USER,
        PREFS,
        json!({
            "EnableProgressUpdates": false,
            "EnableLessonCompletion": true,
            "EmailComments": false,
        }),
    )
    .await;

    // Category off wins over a subcategory override.
    let json = body_json(
        get_as(
            app.clone(),
            USER,
            "/api/v1/notifications/resolve?subcategory=LessonCompletion",
        )
        .await,
    )
    .await;
    assert_eq!(json["data"]["category"], "progress");
    assert_eq!(json["data"]["channels"]["in_app"], false);
    assert_eq!(json["data"]["channels"]["email"], false);

    // Override off on one channel only.
    let json = body_json(
        get_as(
            app,
            USER,
            "/api/v1/notifications/resolve?subcategory=Comments&channel=email",
        )
        .await,
    )
    .await;
    assert_eq!(json["data"]["subcategory"], "NewComments");
    assert_eq!(json["data"]["deliver"], false);
    assert_eq!(json["data"]["channels"]["in_app"], true);
}

#[tokio::test]
async fn resolve_security_alerts_ignores_global_switches() {
    let app = common::build_test_app();
    patch_json(
        app.clone(),
        USER,
        PREFS,
        json!({ "EnableInApp": false, "EnableEmail": false, "EnableSystemAlerts": false }),
    )
    .await;

    let json = body_json(
        get_as(
            app,
            USER,
            "/api/v1/notifications/resolve?subcategory=SecurityAlerts&channel=in_app",
        )
        .await,
    )
    .await;
    assert_eq!(json["data"]["forced_delivery"], true);
    assert_eq!(json["data"]["deliver"], true);
    assert_eq!(json["data"]["channels"]["email"], true);
}

#[tokio::test]
async fn resolve_rejects_unknown_names() {
    let app = common::build_test_app();

    let response = get_as(
        app.clone(),
        USER,
        "/api/v1/notifications/resolve?subcategory=Bogus",
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = get_as(
        app,
        USER,
        "/api/v1/notifications/resolve?subcategory=Replies&channel=sms",
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Test dispatch and the bell
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_notification_lands_in_bell_and_inbox() {
    let test_app = TestApp::new();
    let app = test_app.app();
    let mut events = test_app.state.event_bus.subscribe();

    let response = post_json(app.clone(), USER, "/api/v1/notifications/test", json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["in_app"], true);
    assert_eq!(json["data"]["pushed"], true);
    assert_eq!(json["data"]["email"]["status"], "sent");
    let id = json["data"]["notification_id"].as_i64().unwrap();

    assert_eq!(test_app.mailer.sent_count(), 1);
    let event = events.recv().await.unwrap();
    assert_eq!(event.event_type, "notification.created");
    assert_eq!(event.notification_id, Some(id));

    let json = body_json(get_as(app.clone(), USER, "/api/v1/notifications").await).await;
    let list = json["data"].as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["title"], "Test Notification");
    assert_eq!(list[0]["subcategory"], "ProfileUpdates");
    assert_eq!(list[0]["email_status"]["status"], "sent");

    let json = body_json(get_as(app, USER, "/api/v1/notifications/unread-count").await).await;
    assert_eq!(json["data"]["count"], 1);
}

#[tokio::test]
async fn read_and_delete_are_owner_scoped() {
    let app = common::build_test_app();
    let json = body_json(post_json(app.clone(), USER, "/api/v1/notifications/test", json!({})).await).await;
    let id = json["data"]["notification_id"].as_i64().unwrap();
    let read_uri = format!("/api/v1/notifications/{id}/read");
    let item_uri = format!("/api/v1/notifications/{id}");

    let response = send_as(app.clone(), Method::POST, OTHER_USER, &read_uri).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = send_as(app.clone(), Method::DELETE, OTHER_USER, &item_uri).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send_as(app.clone(), Method::POST, USER, &read_uri).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    // Idempotent.
    let response = send_as(app.clone(), Method::POST, USER, &read_uri).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let json = body_json(get_as(app.clone(), USER, "/api/v1/notifications/unread-count").await).await;
    assert_eq!(json["data"]["count"], 0);

    let response = send_as(app.clone(), Method::DELETE, USER, &item_uri).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = send_as(app.clone(), Method::DELETE, USER, &item_uri).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_json(get_as(app, USER, "/api/v1/notifications").await).await;
    assert!(json["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn mark_all_read_reports_count() {
    let app = common::build_test_app();
    for _ in 0..3 {
        post_json(app.clone(), USER, "/api/v1/notifications/test", json!({})).await;
    }

    let response = send_as(app.clone(), Method::POST, USER, "/api/v1/notifications/read-all").await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["marked_read"], 3);

    let json = body_json(
        get_as(app, USER, "/api/v1/notifications?unread_only=true").await,
    )
    .await;
    assert!(json["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn suppressed_in_app_is_stored_but_hidden() {
    let test_app = TestApp::new();
    let app = test_app.app();
    patch_json(app.clone(), USER, PREFS, json!({ "EnableProfileUpdates": false })).await;

    let json = body_json(post_json(app.clone(), USER, "/api/v1/notifications/test", json!({})).await).await;
    assert_eq!(json["data"]["in_app"], false);
    assert_eq!(json["data"]["pushed"], false);
    // Email still follows its own channel.
    assert_eq!(json["data"]["email"]["status"], "sent");

    let json = body_json(get_as(app.clone(), USER, "/api/v1/notifications").await).await;
    assert!(json["data"].as_array().unwrap().is_empty());

    let json = body_json(
        get_as(app.clone(), USER, "/api/v1/notifications?include_suppressed=true").await,
    )
    .await;
    let list = json["data"].as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["in_app_delivered"], false);

    let json = body_json(get_as(app, USER, "/api/v1/notifications/unread-count").await).await;
    assert_eq!(json["data"]["count"], 0);
}

#[tokio::test]
async fn email_disabled_globally_is_suppressed() {
    let test_app = TestApp::new();
    let app = test_app.app();
    patch_json(app.clone(), USER, PREFS, json!({ "EnableEmail": false })).await;

    let json = body_json(post_json(app, USER, "/api/v1/notifications/test", json!({})).await).await;
    assert_eq!(json["data"]["email"]["status"], "suppressed");
    assert_eq!(test_app.mailer.sent_count(), 0);
}

#[tokio::test]
async fn daily_frequency_queues_for_digest() {
    let test_app = TestApp::new();
    let app = test_app.app();
    patch_json(app.clone(), USER, PREFS, json!({ "EmailDigestFrequency": "daily" })).await;

    let json = body_json(post_json(app.clone(), USER, "/api/v1/notifications/test", json!({})).await).await;
    assert_eq!(json["data"]["email"]["status"], "queued");
    assert!(json["data"]["email"]["scheduled_for"].is_string());
    assert_eq!(test_app.mailer.sent_count(), 0);

    let json = body_json(get(app, "/health").await).await;
    assert_eq!(json["store"]["pending_digest_entries"], 1);
}

#[tokio::test]
async fn test_notification_validates_input() {
    let app = common::build_test_app();

    let response = post_json(
        app.clone(),
        USER,
        "/api/v1/notifications/test",
        json!({ "subcategory": "Nope" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    for hours in [0_i64, -3, 9_000_000_000_000, i64::MAX] {
        let response = post_json(
            app.clone(),
            USER,
            "/api/v1/notifications/test",
            json!({ "expires_in_hours": hours }),
        )
        .await;
        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "expected 400 for expires_in_hours={hours}"
        );
        assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
    }

    let response = post_json(
        app,
        USER,
        "/api/v1/notifications/test",
        json!({ "expires_in_hours": 48 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Triggers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn assessment_due_trigger_reminds_unsubmitted_students() {
    let app = common::build_test_app();
    let response = post_json(
        app.clone(),
        1,
        "/api/v1/notifications/triggers/assessment-due",
        json!({
            "now": "2026-03-02T09:00:00Z",
            "assessments": [
                {
                    "assessment_id": 5, "assessment_title": "Quiz 1",
                    "due_date": "2026-03-03T17:00:00Z", "course_id": 2, "lesson_id": 3,
                    "user_id": USER
                },
                {
                    "assessment_id": 5, "assessment_title": "Quiz 1",
                    "due_date": "2026-03-03T17:00:00Z", "course_id": 2, "lesson_id": 3,
                    "user_id": OTHER_USER, "submitted": true
                },
                {
                    "assessment_id": 6, "assessment_title": "Final",
                    "due_date": "2026-03-20T17:00:00Z", "course_id": 2, "lesson_id": 4,
                    "user_id": USER
                }
            ]
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["dispatched"], 1);
    assert_eq!(json["data"]["outcomes"][0]["user_id"], USER);

    let json = body_json(get_as(app, USER, "/api/v1/notifications").await).await;
    assert_eq!(json["data"][0]["subcategory"], "AssessmentDueReminder");
}

#[tokio::test]
async fn assessment_due_trigger_with_reference_time_at_calendar_end() {
    let app = common::build_test_app();
    let response = post_json(
        app,
        1,
        "/api/v1/notifications/triggers/assessment-due",
        json!({
            "now": "+262142-12-31T23:00:00Z",
            "assessments": [{
                "assessment_id": 5, "assessment_title": "Quiz 1",
                "due_date": "+262142-12-31T23:30:00Z", "course_id": 2, "lesson_id": 3,
                "user_id": USER
            }]
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["dispatched"], 0);
}

#[tokio::test]
async fn at_risk_trigger_alerts_student_and_instructor() {
    let app = common::build_test_app();
    let response = post_json(
        app.clone(),
        1,
        "/api/v1/notifications/triggers/at-risk",
        json!({
            "student_id": USER, "student_name": "Sam", "course_id": 4,
            "course_name": "Rust 101", "instructor_id": 99,
            "risk_level": "high", "risk_score": 0.82,
            "risk_factors": ["low engagement"]
        }),
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["dispatched"], 2);

    let json = body_json(get_as(app.clone(), 99, "/api/v1/notifications").await).await;
    assert_eq!(json["data"][0]["notification_type"], "intervention");

    // Low risk raises nothing.
    let response = post_json(
        app,
        1,
        "/api/v1/notifications/triggers/at-risk",
        json!({
            "student_id": USER, "student_name": "Sam", "course_id": 4,
            "course_name": "Rust 101", "instructor_id": 99,
            "risk_level": "low", "risk_score": 0.1
        }),
    )
    .await;
    assert_eq!(body_json(response).await["data"]["dispatched"], 0);
}

#[tokio::test]
async fn comment_trigger_respects_reply_preferences() {
    let app = common::build_test_app();
    patch_json(app.clone(), OTHER_USER, PREFS, json!({ "EnableReplies": false })).await;

    let response = post_json(
        app.clone(),
        USER,
        "/api/v1/notifications/triggers/comment",
        json!({
            "comment_id": 11, "author_id": USER, "author_name": "Sam",
            "content": "Thanks!", "entity_title": "Lesson 2",
            "action_url": "/lessons/2#comment-11",
            "instructor_id": 99, "parent_author_id": OTHER_USER
        }),
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["dispatched"], 2);

    let json = body_json(get_as(app.clone(), OTHER_USER, "/api/v1/notifications").await).await;
    assert!(json["data"].as_array().unwrap().is_empty());

    let json = body_json(get_as(app, 99, "/api/v1/notifications").await).await;
    assert_eq!(json["data"][0]["title"], "New comment on Lesson 2");
}

#[tokio::test]
async fn weekly_summary_skips_inactive_users() {
    let app = common::build_test_app();
    let response = post_json(
        app,
        1,
        "/api/v1/notifications/triggers/weekly-summary",
        json!({
            "activities": [
                { "user_id": USER, "lessons_completed": 3, "videos_watched": 2,
                  "assessments_submitted": 1, "minutes_spent": 95, "courses_active": 1 },
                { "user_id": OTHER_USER, "lessons_completed": 0, "videos_watched": 0,
                  "assessments_submitted": 0, "minutes_spent": 0, "courses_active": 0 }
            ]
        }),
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["dispatched"], 1);
    assert_eq!(json["data"]["outcomes"][0]["user_id"], USER);
}
