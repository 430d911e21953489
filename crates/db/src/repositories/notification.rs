//! Notification repository.

use std::sync::Arc;

use crate::entities::{Notification, notification, notification::NotificationType};
use chrono::{DateTime, Utc};
use devtodo_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, sea_query::Expr,
};

/// Notification repository for database operations.
#[derive(Clone)]
pub struct NotificationRepository {
    db: Arc<DatabaseConnection>,
}

impl NotificationRepository {
    /// Create a new notification repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Create a new notification.
    ///
    /// A unique-index collision surfaces as [`AppError::Conflict`]; the
    /// overdue sweep treats it as "already notified today".
    pub async fn create(&self, model: notification::ActiveModel) -> AppResult<notification::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| {
            if matches!(e.sql_err(), Some(sea_orm::SqlErr::UniqueConstraintViolation(_))) {
                AppError::Conflict("Duplicate notification".to_string())
            } else {
                AppError::Database(e.to_string())
            }
        })
    }

    /// Get notifications for a user, newest first (paginated), optionally
    /// filtered by read state.
    pub async fn find_by_user(
        &self,
        user_id: &str,
        read: Option<bool>,
        page: u64,
        limit: u64,
    ) -> AppResult<Vec<notification::Model>> {
        let mut query = Notification::find()
            .filter(notification::Column::UserId.eq(user_id))
            .order_by_desc(notification::Column::CreatedAt);

        if let Some(read) = read {
            query = query.filter(notification::Column::IsRead.eq(read));
        }

        query
            .offset((page - 1) * limit)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count a user's notifications, optionally filtered by read state.
    pub async fn count_by_user(&self, user_id: &str, read: Option<bool>) -> AppResult<u64> {
        let mut query = Notification::find().filter(notification::Column::UserId.eq(user_id));

        if let Some(read) = read {
            query = query.filter(notification::Column::IsRead.eq(read));
        }

        query
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Most recent DEADLINE notification for a todo created at or after `since`.
    pub async fn find_recent_deadline_for_todo(
        &self,
        todo_id: &str,
        since: DateTime<Utc>,
    ) -> AppResult<Option<notification::Model>> {
        Notification::find()
            .filter(notification::Column::TodoId.eq(todo_id))
            .filter(notification::Column::NotificationType.eq(NotificationType::Deadline))
            .filter(notification::Column::CreatedAt.gte(since))
            .order_by_desc(notification::Column::CreatedAt)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark a notification as read, scoped to its owner.
    /// Returns the number of rows updated (zero on ownership mismatch).
    pub async fn mark_as_read(&self, id: &str, user_id: &str) -> AppResult<u64> {
        let result = Notification::update_many()
            .filter(notification::Column::Id.eq(id))
            .filter(notification::Column::UserId.eq(user_id))
            .col_expr(notification::Column::IsRead, Expr::value(true))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Mark all of a user's unread notifications as read.
    pub async fn mark_all_as_read(&self, user_id: &str) -> AppResult<u64> {
        let result = Notification::update_many()
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::IsRead.eq(false))
            .col_expr(notification::Column::IsRead, Expr::value(true))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Find a notification by ID scoped to its owner.
    pub async fn find_by_id_and_user(
        &self,
        id: &str,
        user_id: &str,
    ) -> AppResult<Option<notification::Model>> {
        Notification::find_by_id(id)
            .filter(notification::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a notification scoped to its owner.
    /// Returns the number of rows removed (zero on ownership mismatch).
    pub async fn delete(&self, id: &str, user_id: &str) -> AppResult<u64> {
        let result = Notification::delete_many()
            .filter(notification::Column::Id.eq(id))
            .filter(notification::Column::UserId.eq(user_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }
}
