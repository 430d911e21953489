//! API middleware.

use std::sync::Arc;

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use devtodo_common::StorageBackend;
use devtodo_core::{NotificationService, TodoService, UserService};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    /// User and auth business logic.
    pub user_service: UserService,
    /// Todo business logic.
    pub todo_service: TodoService,
    /// Notification business logic.
    pub notification_service: NotificationService,
    /// Avatar file storage.
    pub storage: Arc<dyn StorageBackend>,
}

/// Authentication middleware.
///
/// Resolves a `Bearer` token to its user and stashes the user in request
/// extensions; handlers opt in through the `AuthUser` extractor.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
        && let Ok(user) = state.user_service.authenticate_by_token(token).await
    {
        req.extensions_mut().insert(user);
    }

    next.run(req).await
}
