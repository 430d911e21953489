//! Create notification table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Notification::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Notification::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Notification::UserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Notification::TodoId).string_len(32))
                    .col(
                        ColumnDef::new(Notification::NotificationType)
                            .string_len(16)
                            .not_null()
                            .default("REMINDER"),
                    )
                    .col(ColumnDef::new(Notification::Title).string_len(200).not_null())
                    .col(
                        ColumnDef::new(Notification::Message)
                            .string_len(1000)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Notification::IsRead)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Notification::DayBucket).date())
                    .col(
                        ColumnDef::new(Notification::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notification_user")
                            .from(Notification::Table, Notification::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notification_todo")
                            .from(Notification::Table, Notification::TodoId)
                            .to(Todo::Table, Todo::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: user_id (for listing a user's notifications)
        manager
            .create_index(
                Index::create()
                    .name("idx_notification_user_id")
                    .table(Notification::Table)
                    .col(Notification::UserId)
                    .to_owned(),
            )
            .await?;

        // Index: (user_id, is_read) (for unread filters and mark-all-read)
        manager
            .create_index(
                Index::create()
                    .name("idx_notification_user_is_read")
                    .table(Notification::Table)
                    .col(Notification::UserId)
                    .col(Notification::IsRead)
                    .to_owned(),
            )
            .await?;

        // Index: created_at (for pagination and the 24h dedup lookback)
        manager
            .create_index(
                Index::create()
                    .name("idx_notification_created_at")
                    .table(Notification::Table)
                    .col(Notification::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Unique index backing overdue-sweep dedup. day_bucket is NULL for
        // everything except overdue alerts, and NULLs never collide, so only
        // one overdue DEADLINE row per task per local calendar day can exist
        // even when two sweeps race past the read check.
        manager
            .create_index(
                Index::create()
                    .name("uq_notification_todo_type_day")
                    .table(Notification::Table)
                    .col(Notification::TodoId)
                    .col(Notification::NotificationType)
                    .col(Notification::DayBucket)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Notification::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Notification {
    Table,
    Id,
    UserId,
    TodoId,
    NotificationType,
    Title,
    Message,
    IsRead,
    DayBucket,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

#[derive(Iden)]
enum Todo {
    Table,
    Id,
}
