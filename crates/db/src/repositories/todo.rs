//! Todo repository.

use std::sync::Arc;

use crate::entities::{Todo, todo};
use chrono::{DateTime, Utc};
use devtodo_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};

/// Filters for listing a user's todos.
#[derive(Debug, Clone, Default)]
pub struct TodoFilter {
    /// Completion state filter.
    pub completed: Option<bool>,
    /// Priority filter.
    pub priority: Option<todo::Priority>,
    /// Substring match on title or description.
    pub search: Option<String>,
}

impl TodoFilter {
    fn into_condition(self, user_id: &str) -> Condition {
        let mut cond = Condition::all().add(todo::Column::UserId.eq(user_id));

        if let Some(completed) = self.completed {
            cond = cond.add(todo::Column::Completed.eq(completed));
        }
        if let Some(priority) = self.priority {
            cond = cond.add(todo::Column::Priority.eq(priority));
        }
        if let Some(search) = self.search {
            cond = cond.add(
                Condition::any()
                    .add(todo::Column::Title.contains(&search))
                    .add(todo::Column::Description.contains(&search)),
            );
        }

        cond
    }
}

/// Todo repository for database operations.
#[derive(Clone)]
pub struct TodoRepository {
    db: Arc<DatabaseConnection>,
}

impl TodoRepository {
    /// Create a new todo repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a todo by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<todo::Model>> {
        Todo::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a todo by ID scoped to its owner.
    pub async fn find_by_id_and_user(
        &self,
        id: &str,
        user_id: &str,
    ) -> AppResult<Option<todo::Model>> {
        Todo::find_by_id(id)
            .filter(todo::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find todos by IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<todo::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Todo::find()
            .filter(todo::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List a user's todos, newest first (paginated).
    pub async fn list(
        &self,
        user_id: &str,
        filter: TodoFilter,
        page: u64,
        limit: u64,
    ) -> AppResult<Vec<todo::Model>> {
        Todo::find()
            .filter(filter.into_condition(user_id))
            .order_by_desc(todo::Column::CreatedAt)
            .offset((page - 1) * limit)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count a user's todos under the same filter as [`Self::list`].
    pub async fn count(&self, user_id: &str, filter: TodoFilter) -> AppResult<u64> {
        Todo::find()
            .filter(filter.into_condition(user_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Incomplete todos across all users with a due date inside the window.
    pub async fn find_due_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<todo::Model>> {
        Todo::find()
            .filter(todo::Column::Completed.eq(false))
            .filter(todo::Column::DueDate.gte(start))
            .filter(todo::Column::DueDate.lte(end))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Incomplete todos across all users whose due date has passed.
    pub async fn find_overdue(&self, before: DateTime<Utc>) -> AppResult<Vec<todo::Model>> {
        Todo::find()
            .filter(todo::Column::Completed.eq(false))
            .filter(todo::Column::DueDate.lt(before))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new todo.
    pub async fn create(&self, model: todo::ActiveModel) -> AppResult<todo::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a todo.
    pub async fn update(&self, model: todo::ActiveModel) -> AppResult<todo::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a todo scoped to its owner; returns the number of rows removed.
    pub async fn delete_by_id_and_user(&self, id: &str, user_id: &str) -> AppResult<u64> {
        let result = Todo::delete_many()
            .filter(todo::Column::Id.eq(id))
            .filter(todo::Column::UserId.eq(user_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }
}
