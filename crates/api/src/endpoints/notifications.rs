//! Notification endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, patch},
};
use chrono::{DateTime, FixedOffset};
use devtodo_common::AppResult;
use devtodo_db::entities::{
    notification::{self, NotificationType},
    todo,
};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{MessageResponse, Pagination},
};

/// List query parameters.
#[derive(Debug, Deserialize)]
pub struct ListNotificationsQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub read: Option<bool>,
}

const fn default_page() -> u64 {
    1
}

const fn default_limit() -> u64 {
    10
}

/// `{id, title}` of the todo a notification points at.
#[derive(Debug, Serialize)]
pub struct TodoRef {
    pub id: String,
    pub title: String,
}

/// Notification payload in API responses.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: String,
    pub user_id: String,
    pub todo_id: Option<String>,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub todo: Option<TodoRef>,
    pub created_at: DateTime<FixedOffset>,
}

impl NotificationResponse {
    fn new(n: notification::Model, linked: Option<todo::Model>) -> Self {
        Self {
            id: n.id,
            user_id: n.user_id,
            todo_id: n.todo_id,
            notification_type: n.notification_type,
            title: n.title,
            message: n.message,
            read: n.is_read,
            todo: linked.map(|t| TodoRef {
                id: t.id,
                title: t.title,
            }),
            created_at: n.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListNotificationsResponse {
    pub notifications: Vec<NotificationResponse>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct NotificationMutationResponse {
    pub message: String,
    pub notification: NotificationResponse,
}

/// Create the notifications router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/{id}/read", patch(mark_as_read))
        .route("/mark-all-read", patch(mark_all_as_read))
        .route("/{id}", delete(delete_notification))
}

/// List the user's notifications with pagination.
async fn list(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    Query(query): Query<ListNotificationsQuery>,
) -> AppResult<Json<ListNotificationsResponse>> {
    let page = query.page.max(1);
    let limit = query.limit.clamp(1, 100);

    let (items, total) = state
        .notification_service
        .list(&current.id, query.read, page, limit)
        .await?;

    Ok(Json(ListNotificationsResponse {
        notifications: items
            .into_iter()
            .map(|(n, linked)| NotificationResponse::new(n, linked))
            .collect(),
        pagination: Pagination::new(page, limit, total),
    }))
}

/// Mark a notification as read.
async fn mark_as_read(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<NotificationMutationResponse>> {
    let updated = state
        .notification_service
        .mark_as_read(&current.id, &id)
        .await?;

    Ok(Json(NotificationMutationResponse {
        message: "Notification marked as read".to_string(),
        notification: NotificationResponse::new(updated, None),
    }))
}

/// Mark all of the user's notifications as read.
async fn mark_all_as_read(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
) -> AppResult<Json<MessageResponse>> {
    state.notification_service.mark_all_as_read(&current.id).await?;

    Ok(Json(MessageResponse::new("All notifications marked as read")))
}

/// Delete a notification.
async fn delete_notification(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state.notification_service.delete(&current.id, &id).await?;

    Ok(Json(MessageResponse::new("Notification deleted successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_notification_response_shape() {
        let n = notification::Model {
            id: "n1".to_string(),
            user_id: "u1".to_string(),
            todo_id: Some("t1".to_string()),
            notification_type: NotificationType::Deadline,
            title: "Tarefa vencida!".to_string(),
            message: "A tarefa \"Pay rent\" está atrasada.".to_string(),
            is_read: false,
            day_bucket: None,
            created_at: Utc::now().into(),
        };
        let t = todo::Model {
            id: "t1".to_string(),
            user_id: "u1".to_string(),
            title: "Pay rent".to_string(),
            description: None,
            priority: todo::Priority::High,
            completed: false,
            due_date: None,
            created_at: Utc::now().into(),
            updated_at: None,
        };

        let json = serde_json::to_value(NotificationResponse::new(n, Some(t))).unwrap();

        assert_eq!(json["type"], "DEADLINE");
        assert_eq!(json["read"], false);
        assert_eq!(json["todo"]["title"], "Pay rent");
        assert!(json.get("dayBucket").is_none());
        assert!(json.get("isRead").is_none());
    }

    #[test]
    fn test_list_query_defaults() {
        let query: ListNotificationsQuery =
            serde_json::from_value(serde_json::json!({})).unwrap();

        assert_eq!(query.page, 1);
        assert_eq!(query.limit, 10);
        assert!(query.read.is_none());
    }
}
