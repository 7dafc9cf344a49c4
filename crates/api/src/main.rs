use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use campus_api::background::notification_retention;
use campus_api::config::{LogFormat, ServerConfig};
use campus_api::router::build_app_router;
use campus_api::state::AppState;
use campus_events::{DigestScheduler, EmailSender, EventBus, LogMailer};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = ServerConfig::from_env().expect("Invalid server configuration");

    // --- Tracing ---
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "campus_api=debug,campus_events=debug,tower_http=debug".into());
    let (text_layer, json_layer) = match config.log_format {
        LogFormat::Text => (Some(tracing_subscriber::fmt::layer()), None),
        LogFormat::Json => (None, Some(tracing_subscriber::fmt::layer().json())),
    };
    tracing_subscriber::registry()
        .with(env_filter)
        .with(text_layer)
        .with(json_layer)
        .init();

    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Store ---
    let pool = campus_db::create_pool();
    let stats = campus_db::health_check(&pool).await;
    tracing::info!(?stats, "Notification store ready");

    // --- Event bus and mailer ---
    let event_bus = Arc::new(EventBus::default());
    let mailer: Arc<dyn EmailSender> = Arc::new(LogMailer::new(config.email.clone()));
    tracing::info!(from = %config.email.from_address, "Email delivery configured");

    // --- Background tasks ---
    let cancel = CancellationToken::new();

    let digest_scheduler = DigestScheduler::new(
        Arc::clone(&pool),
        Arc::clone(&mailer),
        Arc::clone(&event_bus),
        config.email.clone(),
    )
    .with_interval(Duration::from_secs(config.digest_check_interval_secs));
    let digest_cancel = cancel.clone();
    let digest_handle = tokio::spawn(async move {
        digest_scheduler.run(digest_cancel).await;
    });

    let retention_handle = tokio::spawn(notification_retention::run(
        Arc::clone(&pool),
        Duration::from_secs(config.notification_retention_interval_secs),
        cancel.clone(),
    ));

    tracing::info!("Background services started (digest scheduler, notification retention)");

    // --- App ---
    let shutdown_timeout = Duration::from_secs(config.shutdown_timeout_secs);
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    let state = AppState::new(pool, config.clone(), event_bus, mailer);
    let app = build_app_router(state, &config);

    // --- Start server ---
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    cancel.cancel();
    await_task("Digest scheduler", digest_handle, shutdown_timeout).await;
    await_task("Notification retention", retention_handle, shutdown_timeout).await;

    tracing::info!("Graceful shutdown complete");
}

/// Wait up to `timeout` for a background task, reporting how it ended.
async fn await_task(name: &'static str, handle: JoinHandle<()>, timeout: Duration) {
    match tokio::time::timeout(timeout, handle).await {
        Ok(Ok(())) => tracing::info!(task = name, "Background task stopped"),
        Ok(Err(e)) => tracing::error!(task = name, error = %e, "Background task failed"),
        Err(_) => tracing::warn!(task = name, "Background task did not stop in time"),
    }
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
