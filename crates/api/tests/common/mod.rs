#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use campus_api::config::{LogFormat, ServerConfig};
use campus_api::middleware::user::USER_ID_HEADER;
use campus_api::router::build_app_router;
use campus_api::state::AppState;
use campus_events::{EmailConfig, EmailError, EmailSender, EventBus, OutgoingEmail};

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default)
/// and a 30-second request timeout.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        digest_check_interval_secs: 300,
        notification_retention_interval_secs: 3600,
        log_format: LogFormat::Text,
        email: EmailConfig::default(),
    }
}

/// Mailer that records every email instead of sending it.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingEmail>>,
    pub fail: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl EmailSender for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError> {
        if self.fail {
            return Err(EmailError::Transport("relay unavailable".into()));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

/// A fresh store, event bus and recording mailer behind the production router.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub mailer: Arc<RecordingMailer>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_mailer(RecordingMailer::default())
    }

    pub fn with_mailer(mailer: RecordingMailer) -> Self {
        let config = test_config();
        let mailer = Arc::new(mailer);
        let state = AppState::new(
            campus_db::create_pool(),
            config.clone(),
            Arc::new(EventBus::default()),
            Arc::clone(&mailer) as Arc<dyn EmailSender>,
        );
        let router = build_app_router(state.clone(), &config);
        Self {
            router,
            state,
            mailer,
        }
    }

    pub fn app(&self) -> Router {
        self.router.clone()
    }
}

/// Build the full application router with all middleware layers.
pub fn build_test_app() -> Router {
    TestApp::new().router
}

async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

/// Send an unauthenticated GET request.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

/// Send a GET request on behalf of `user_id`.
pub async fn get_as(app: Router, user_id: i64, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header(USER_ID_HEADER, user_id.to_string())
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

async fn json_request(
    app: Router,
    method: Method,
    user_id: i64,
    uri: &str,
    body: serde_json::Value,
) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(USER_ID_HEADER, user_id.to_string())
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_json(
    app: Router,
    user_id: i64,
    uri: &str,
    body: serde_json::Value,
) -> Response<Body> {
    json_request(app, Method::POST, user_id, uri, body).await
}

pub async fn patch_json(
    app: Router,
    user_id: i64,
    uri: &str,
    body: serde_json::Value,
) -> Response<Body> {
    json_request(app, Method::PATCH, user_id, uri, body).await
}

/// Send a body-less request with the given method on behalf of `user_id`.
pub async fn send_as(app: Router, method: Method, user_id: i64, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(USER_ID_HEADER, user_id.to_string())
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
