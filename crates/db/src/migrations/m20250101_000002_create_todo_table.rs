//! Create todo table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Todo::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Todo::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Todo::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Todo::Title).string_len(200).not_null())
                    .col(ColumnDef::new(Todo::Description).string_len(1000))
                    .col(
                        ColumnDef::new(Todo::Priority)
                            .string_len(16)
                            .not_null()
                            .default("MEDIUM"),
                    )
                    .col(
                        ColumnDef::new(Todo::Completed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Todo::DueDate).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Todo::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Todo::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_todo_user")
                            .from(Todo::Table, Todo::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: user_id (for listing a user's tasks)
        manager
            .create_index(
                Index::create()
                    .name("idx_todo_user_id")
                    .table(Todo::Table)
                    .col(Todo::UserId)
                    .to_owned(),
            )
            .await?;

        // Index: (completed, due_date) (for the notification sweeps)
        manager
            .create_index(
                Index::create()
                    .name("idx_todo_completed_due_date")
                    .table(Todo::Table)
                    .col(Todo::Completed)
                    .col(Todo::DueDate)
                    .to_owned(),
            )
            .await?;

        // Index: created_at (for pagination)
        manager
            .create_index(
                Index::create()
                    .name("idx_todo_created_at")
                    .table(Todo::Table)
                    .col(Todo::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Todo::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Todo {
    Table,
    Id,
    UserId,
    Title,
    Description,
    Priority,
    Completed,
    DueDate,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
