//! Todo endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, put},
};
use chrono::{DateTime, FixedOffset};
use devtodo_common::AppResult;
use devtodo_core::{CreateTodoInput, UpdateTodoInput};
use devtodo_db::{
    entities::todo::{self, Priority},
    repositories::TodoFilter,
};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{MessageResponse, Pagination},
};

/// List query parameters.
#[derive(Debug, Deserialize)]
pub struct ListTodosQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
    pub search: Option<String>,
}

const fn default_page() -> u64 {
    1
}

const fn default_limit() -> u64 {
    10
}

/// Todo payload in API responses.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoResponse {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub completed: bool,
    pub due_date: Option<DateTime<FixedOffset>>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: Option<DateTime<FixedOffset>>,
}

impl From<todo::Model> for TodoResponse {
    fn from(t: todo::Model) -> Self {
        Self {
            id: t.id,
            user_id: t.user_id,
            title: t.title,
            description: t.description,
            priority: t.priority,
            completed: t.completed,
            due_date: t.due_date,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListTodosResponse {
    pub todos: Vec<TodoResponse>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct TodoMutationResponse {
    pub message: String,
    pub todo: TodoResponse,
}

/// Create the todos router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", put(update).delete(delete_todo))
        .route("/{id}/toggle", patch(toggle))
}

/// List the user's todos with filters and pagination.
async fn list(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    Query(query): Query<ListTodosQuery>,
) -> AppResult<Json<ListTodosResponse>> {
    let page = query.page.max(1);
    let limit = query.limit.clamp(1, 100);

    let filter = TodoFilter {
        completed: query.completed,
        priority: query.priority,
        search: query.search,
    };

    let (todos, total) = state
        .todo_service
        .list(&current.id, filter, page, limit)
        .await?;

    Ok(Json(ListTodosResponse {
        todos: todos.into_iter().map(Into::into).collect(),
        pagination: Pagination::new(page, limit, total),
    }))
}

/// Create a new todo.
async fn create(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    Json(req): Json<CreateTodoInput>,
) -> AppResult<(StatusCode, Json<TodoMutationResponse>)> {
    let created = state.todo_service.create(&current.id, req).await?;

    Ok((
        StatusCode::CREATED,
        Json(TodoMutationResponse {
            message: "Todo created successfully".to_string(),
            todo: created.into(),
        }),
    ))
}

/// Replace a todo's fields.
async fn update(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateTodoInput>,
) -> AppResult<Json<TodoMutationResponse>> {
    let updated = state.todo_service.update(&current.id, &id, req).await?;

    Ok(Json(TodoMutationResponse {
        message: "Todo updated successfully".to_string(),
        todo: updated.into(),
    }))
}

/// Flip a todo's completion state.
async fn toggle(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<TodoMutationResponse>> {
    let updated = state.todo_service.toggle(&current.id, &id).await?;

    let message = if updated.completed {
        "Todo marked as complete"
    } else {
        "Todo marked as incomplete"
    };

    Ok(Json(TodoMutationResponse {
        message: message.to_string(),
        todo: updated.into(),
    }))
}

/// Delete a todo.
async fn delete_todo(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state.todo_service.delete(&current.id, &id).await?;

    Ok(Json(MessageResponse::new("Todo deleted successfully")))
}
