//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Unique login/contact email.
    #[sea_orm(unique)]
    pub email: String,

    pub username: String,

    /// Lowercased username for case-insensitive lookups.
    #[sea_orm(unique)]
    pub username_lower: String,

    /// Display name.
    #[sea_orm(nullable)]
    pub name: Option<String>,

    /// URL of the uploaded avatar, if any.
    #[sea_orm(nullable)]
    pub avatar_url: Option<String>,

    /// Argon2 password hash.
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Opaque API token.
    #[sea_orm(nullable)]
    #[serde(skip_serializing)]
    pub token: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::todo::Entity")]
    Todo,

    #[sea_orm(has_many = "super::notification::Entity")]
    Notification,
}

impl Related<super::todo::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Todo.def()
    }
}

impl Related<super::notification::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notification.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
