//! Notification entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Notification types.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    #[sea_orm(string_value = "REMINDER")]
    Reminder,
    #[sea_orm(string_value = "DEADLINE")]
    Deadline,
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notification")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The user receiving the notification.
    pub user_id: String,

    /// Associated task. Nullable and kept as `SET NULL` on task deletion,
    /// so an old notification may outlive its task.
    #[sea_orm(nullable)]
    pub todo_id: Option<String>,

    pub notification_type: NotificationType,

    pub title: String,

    pub message: String,

    /// Has this notification been read? The only mutable field.
    #[sea_orm(default_value = false)]
    pub is_read: bool,

    /// Local calendar date stamped by the overdue sweep. Participates in the
    /// unique dedup index; NULL for all other notifications.
    #[sea_orm(nullable)]
    pub day_bucket: Option<Date>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,

    #[sea_orm(
        belongs_to = "super::todo::Entity",
        from = "Column::TodoId",
        to = "super::todo::Column::Id",
        on_delete = "SetNull"
    )]
    Todo,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::todo::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Todo.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_type_serializes_uppercase() {
        let json = serde_json::to_string(&NotificationType::Deadline).unwrap();
        assert_eq!(json, "\"DEADLINE\"");
        let back: NotificationType = serde_json::from_str("\"REMINDER\"").unwrap();
        assert_eq!(back, NotificationType::Reminder);
    }
}
