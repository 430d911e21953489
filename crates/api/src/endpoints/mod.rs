//! API endpoints.

mod auth;
mod notifications;
mod todos;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/todos", todos::router())
        .nest("/notifications", notifications::router())
}
