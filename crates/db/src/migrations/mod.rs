//! Database migrations.

pub mod m20250101_000001_create_user_table;
pub mod m20250101_000002_create_todo_table;
pub mod m20250101_000003_create_notification_table;

use sea_orm_migration::prelude::*;

/// Migration runner.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_user_table::Migration),
            Box::new(m20250101_000002_create_todo_table::Migration),
            Box::new(m20250101_000003_create_notification_table::Migration),
        ]
    }
}
