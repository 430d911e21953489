//! Todo service.

use chrono::{DateTime, Utc};
use devtodo_common::{AppError, AppResult, IdGenerator};
use devtodo_db::{
    entities::todo::{self, Priority},
    repositories::{TodoFilter, TodoRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use crate::services::notification::NotificationService;

/// Input for creating a new todo.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodoInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[validate(length(max = 1000))]
    pub description: Option<String>,

    /// Defaults to `MEDIUM` when absent.
    pub priority: Option<Priority>,

    pub due_date: Option<DateTime<Utc>>,
}

/// Input for replacing a todo's fields. Absent optional fields are cleared.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodoInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[validate(length(max = 1000))]
    pub description: Option<String>,

    pub priority: Option<Priority>,

    pub due_date: Option<DateTime<Utc>>,
}

/// Todo service for business logic.
#[derive(Clone)]
pub struct TodoService {
    todo_repo: TodoRepository,
    notification_service: NotificationService,
    id_gen: IdGenerator,
}

impl TodoService {
    /// Create a new todo service.
    #[must_use]
    pub fn new(todo_repo: TodoRepository, notification_service: NotificationService) -> Self {
        Self {
            todo_repo,
            notification_service,
            id_gen: IdGenerator::new(),
        }
    }

    /// List a user's todos, newest first. Returns the page and total count.
    pub async fn list(
        &self,
        user_id: &str,
        filter: TodoFilter,
        page: u64,
        limit: u64,
    ) -> AppResult<(Vec<todo::Model>, u64)> {
        let page = page.max(1);
        let limit = limit.clamp(1, 100);

        let todos = self
            .todo_repo
            .list(user_id, filter.clone(), page, limit)
            .await?;
        let total = self.todo_repo.count(user_id, filter).await?;

        Ok((todos, total))
    }

    /// Create a new todo.
    pub async fn create(&self, user_id: &str, input: CreateTodoInput) -> AppResult<todo::Model> {
        input.validate()?;

        let model = todo::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            title: Set(input.title),
            description: Set(input.description),
            priority: Set(input.priority.unwrap_or(Priority::Medium)),
            completed: Set(false),
            due_date: Set(input.due_date.map(Into::into)),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        self.todo_repo.create(model).await
    }

    /// Replace a todo's fields, scoped to its owner.
    pub async fn update(
        &self,
        user_id: &str,
        id: &str,
        input: UpdateTodoInput,
    ) -> AppResult<todo::Model> {
        input.validate()?;

        let existing = self
            .todo_repo
            .find_by_id_and_user(id, user_id)
            .await?
            .ok_or_else(|| AppError::TodoNotFound(id.to_string()))?;

        let mut active: todo::ActiveModel = existing.into();
        active.title = Set(input.title);
        active.description = Set(input.description);
        active.priority = Set(input.priority.unwrap_or(Priority::Medium));
        active.due_date = Set(input.due_date.map(Into::into));
        active.updated_at = Set(Some(Utc::now().into()));

        self.todo_repo.update(active).await
    }

    /// Flip a todo's completion state.
    ///
    /// The incomplete-to-complete edge triggers a congratulation
    /// notification; a notification failure never fails the toggle.
    pub async fn toggle(&self, user_id: &str, id: &str) -> AppResult<todo::Model> {
        let existing = self
            .todo_repo
            .find_by_id_and_user(id, user_id)
            .await?
            .ok_or_else(|| AppError::TodoNotFound(id.to_string()))?;

        let was_completed = existing.completed;

        let mut active: todo::ActiveModel = existing.into();
        active.completed = Set(!was_completed);
        active.updated_at = Set(Some(Utc::now().into()));

        let updated = self.todo_repo.update(active).await?;

        if updated.completed && !was_completed {
            if let Err(e) = self.notification_service.notify_todo_completed(&updated).await {
                tracing::warn!(todo_id = %updated.id, error = %e, "Completion notification failed");
            }
        }

        Ok(updated)
    }

    /// Delete a todo, scoped to its owner.
    pub async fn delete(&self, user_id: &str, id: &str) -> AppResult<()> {
        let rows = self.todo_repo.delete_by_id_and_user(id, user_id).await?;
        if rows == 0 {
            return Err(AppError::TodoNotFound(id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::UTC;
    use devtodo_common::SystemClock;
    use devtodo_db::repositories::NotificationRepository;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn mock_todo(id: &str, user_id: &str, completed: bool) -> todo::Model {
        todo::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            title: "Pay rent".to_string(),
            description: None,
            priority: Priority::Medium,
            completed,
            due_date: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn service(todo_db: MockDatabase, notification_db: MockDatabase) -> TodoService {
        let todo_repo = TodoRepository::new(Arc::new(todo_db.into_connection()));
        let sweep_todo_db = MockDatabase::new(DatabaseBackend::Postgres);
        let notification_service = NotificationService::new(
            NotificationRepository::new(Arc::new(notification_db.into_connection())),
            TodoRepository::new(Arc::new(sweep_todo_db.into_connection())),
            Arc::new(SystemClock),
            UTC,
        );
        TodoService::new(todo_repo, notification_service)
    }

    #[tokio::test]
    async fn test_toggle_unknown_todo_is_not_found() {
        let todo_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<todo::Model>::new()]);
        let svc = service(todo_db, MockDatabase::new(DatabaseBackend::Postgres));

        let result = svc.toggle("u1", "missing").await;

        assert!(matches!(result, Err(AppError::TodoNotFound(_))));
    }

    #[tokio::test]
    async fn test_toggle_to_completed_notifies() {
        let todo_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![mock_todo("t1", "u1", false)]])
            .append_query_results([vec![mock_todo("t1", "u1", true)]]);
        let notification_db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([
            vec![devtodo_db::entities::notification::Model {
                id: "n1".to_string(),
                user_id: "u1".to_string(),
                todo_id: Some("t1".to_string()),
                notification_type:
                    devtodo_db::entities::notification::NotificationType::Completed,
                title: "Tarefa concluída! 🎉".to_string(),
                message: "Parabéns! Você concluiu \"Pay rent\".".to_string(),
                is_read: false,
                day_bucket: None,
                created_at: Utc::now().into(),
            }],
        ]);

        let svc = service(todo_db, notification_db);

        let updated = svc.toggle("u1", "t1").await.unwrap();

        assert!(updated.completed);
    }

    #[tokio::test]
    async fn test_toggle_back_to_incomplete() {
        let todo_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![mock_todo("t1", "u1", true)]])
            .append_query_results([vec![mock_todo("t1", "u1", false)]]);

        let svc = service(todo_db, MockDatabase::new(DatabaseBackend::Postgres));

        let updated = svc.toggle("u1", "t1").await.unwrap();

        assert!(!updated.completed);
    }

    #[tokio::test]
    async fn test_delete_unknown_todo_is_not_found() {
        let todo_db = MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            },
        ]);

        let svc = service(todo_db, MockDatabase::new(DatabaseBackend::Postgres));

        let result = svc.delete("u1", "missing").await;

        assert!(matches!(result, Err(AppError::TodoNotFound(_))));
    }

    #[tokio::test]
    async fn test_list_returns_page_and_total() {
        let todo_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![mock_todo("t1", "u1", false)]])
            .append_query_results([[maplit::btreemap! {
                "num_items" => sea_orm::Value::BigInt(Some(5))
            }]]);

        let svc = service(todo_db, MockDatabase::new(DatabaseBackend::Postgres));

        let (todos, total) = svc.list("u1", TodoFilter::default(), 1, 1).await.unwrap();

        assert_eq!(todos.len(), 1);
        assert_eq!(total, 5);
    }

    #[tokio::test]
    async fn test_create_rejects_empty_title() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let input = CreateTodoInput {
            title: String::new(),
            description: None,
            priority: None,
            due_date: None,
        };

        let result = svc.create("u1", input).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
