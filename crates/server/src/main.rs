//! devtodo-rs server entry point.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{Json, Router, extract::DefaultBodyLimit, middleware, routing::get};
use chrono::Utc;
use devtodo_api::{AppState, router as api_router};
use devtodo_common::{Config, LocalStorage, SystemClock};
use devtodo_core::{NotificationService, TodoService, UserService};
use devtodo_db::repositories::{NotificationRepository, TodoRepository, UserRepository};
use devtodo_scheduler::{SweepExecutor, SweepSchedule, run_scheduler};
use serde::Serialize;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    message: &'static str,
    timestamp: String,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        message: "devtodo-rs API is running",
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Adapts the notification service to the scheduler's executor trait.
struct SweepRunner {
    notifications: NotificationService,
}

#[async_trait::async_trait]
impl SweepExecutor for SweepRunner {
    async fn run_due_soon_sweep(&self) -> Result<u64, Box<dyn std::error::Error + Send + Sync>> {
        let outcome = self.notifications.run_due_soon_sweep().await?;
        Ok(outcome.created)
    }

    async fn run_overdue_sweep(&self) -> Result<u64, Box<dyn std::error::Error + Send + Sync>> {
        let outcome = self.notifications.run_overdue_sweep().await?;
        Ok(outcome.created)
    }
}

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "devtodo=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting devtodo-rs server...");

    // Load configuration
    let config = Config::load()?;

    // Fail fast on an unusable sweep schedule
    let schedule = SweepSchedule::from_config(&config.scheduler)?;

    // Connect to database and run migrations
    let db = devtodo_db::init(&config).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    devtodo_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let todo_repo = TodoRepository::new(Arc::clone(&db));
    let notification_repo = NotificationRepository::new(Arc::clone(&db));

    // Initialize services
    let user_service = UserService::new(user_repo);
    let notification_service = NotificationService::new(
        notification_repo,
        todo_repo.clone(),
        Arc::new(SystemClock),
        schedule.timezone,
    );
    let todo_service = TodoService::new(todo_repo, notification_service.clone());

    let storage = Arc::new(LocalStorage::new(
        PathBuf::from(&config.storage.path),
        config.storage.base_url.clone(),
    ));

    let state = AppState {
        user_service,
        todo_service,
        notification_service: notification_service.clone(),
        storage,
    };

    // Start the daily sweeps
    if config.scheduler.enabled {
        run_scheduler(
            schedule,
            Arc::new(SweepRunner {
                notifications: notification_service,
            }),
        );
    } else {
        info!("Notification sweeps disabled by configuration");
    }

    // Build router
    let app = Router::new()
        .route("/health", get(health))
        .nest("/api", api_router())
        .nest_service("/uploads", ServeDir::new(&config.storage.path))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            devtodo_api::middleware::auth_middleware,
        ))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
