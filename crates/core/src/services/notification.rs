//! Notification service.
//!
//! Owns the creation primitive, the daily due-soon and overdue sweeps, and
//! read-state management. Sweep windows are calendar days in the configured
//! timezone, computed from an injected [`Clock`] so they are deterministic
//! under test.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use devtodo_common::{AppError, AppResult, Clock, IdGenerator};
use devtodo_db::{
    entities::{
        notification::{self, NotificationType},
        todo,
    },
    repositories::{NotificationRepository, TodoRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

const DUE_SOON_TITLE: &str = "Prazo se aproximando!";
const OVERDUE_TITLE: &str = "Tarefa vencida!";
const COMPLETED_TITLE: &str = "Tarefa concluída! 🎉";

fn due_soon_message(todo_title: &str) -> String {
    format!("A tarefa \"{todo_title}\" vence amanhã.")
}

fn overdue_message(todo_title: &str) -> String {
    format!("A tarefa \"{todo_title}\" está atrasada.")
}

fn completed_message(todo_title: &str) -> String {
    format!("Parabéns! Você concluiu \"{todo_title}\".")
}

/// Interpret a naive local time in `tz`, resolving DST edges deterministically.
///
/// An ambiguous time (clocks rolled back) takes the earlier instant; a
/// skipped time (clocks rolled forward) lands on the following hour.
fn resolve_local(tz: Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    match tz.from_local_datetime(&naive) {
        chrono::LocalResult::Single(dt) | chrono::LocalResult::Ambiguous(dt, _) => {
            dt.with_timezone(&Utc)
        }
        chrono::LocalResult::None => tz
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest()
            .map_or_else(
                || Utc.from_utc_datetime(&naive),
                |dt| dt.with_timezone(&Utc),
            ),
    }
}

/// UTC bounds of a local calendar day: 00:00:00.000 through 23:59:59.999.
fn local_day_window(date: NaiveDate, tz: Tz) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_hms_opt(0, 0, 0).unwrap_or_default();
    let end = date.and_hms_milli_opt(23, 59, 59, 999).unwrap_or_default();
    (resolve_local(tz, start), resolve_local(tz, end))
}

/// Input for creating a notification.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateNotificationInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[validate(length(min = 1, max = 1000))]
    pub message: String,

    /// Defaults to `REMINDER` when absent.
    pub notification_type: Option<NotificationType>,

    pub user_id: String,

    pub todo_id: Option<String>,
}

/// Counts reported by a sweep run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    /// Notifications created.
    pub created: u64,
    /// Todos skipped because a recent notification already covers them.
    pub skipped: u64,
    /// Todos that failed with an error other than the dedup conflict.
    pub failed: u64,
}

/// Notification service for business logic.
#[derive(Clone)]
pub struct NotificationService {
    notification_repo: NotificationRepository,
    todo_repo: TodoRepository,
    clock: Arc<dyn Clock>,
    timezone: Tz,
    id_gen: IdGenerator,
}

impl NotificationService {
    /// Create a new notification service.
    ///
    /// Construction wires dependencies only; sweeps run when the scheduler
    /// (or a caller) invokes them explicitly.
    #[must_use]
    pub fn new(
        notification_repo: NotificationRepository,
        todo_repo: TodoRepository,
        clock: Arc<dyn Clock>,
        timezone: Tz,
    ) -> Self {
        Self {
            notification_repo,
            todo_repo,
            clock,
            timezone,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a notification, returning it with the associated todo if any.
    pub async fn create(
        &self,
        input: CreateNotificationInput,
    ) -> AppResult<(notification::Model, Option<todo::Model>)> {
        input.validate()?;

        let notification_type = input.notification_type.unwrap_or(NotificationType::Reminder);
        let created = self
            .create_internal(
                &input.user_id,
                input.todo_id.as_deref(),
                notification_type,
                input.title,
                input.message,
                None,
            )
            .await?;

        let linked_todo = match &created.todo_id {
            Some(todo_id) => self.todo_repo.find_by_id(todo_id).await?,
            None => None,
        };

        Ok((created, linked_todo))
    }

    /// Internal helper to persist notifications.
    async fn create_internal(
        &self,
        user_id: &str,
        todo_id: Option<&str>,
        notification_type: NotificationType,
        title: String,
        message: String,
        day_bucket: Option<NaiveDate>,
    ) -> AppResult<notification::Model> {
        let model = notification::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            todo_id: Set(todo_id.map(std::string::ToString::to_string)),
            notification_type: Set(notification_type),
            title: Set(title),
            message: Set(message),
            is_read: Set(false),
            day_bucket: Set(day_bucket),
            created_at: Set(self.clock.now().into()),
        };

        let created = self.notification_repo.create(model).await?;

        // Push delivery placeholder.
        tracing::debug!(
            notification_id = %created.id,
            user_id = %created.user_id,
            title = %created.title,
            "Push delivery not configured; notification stored only"
        );

        Ok(created)
    }

    /// Notify every incomplete todo due tomorrow (local calendar day).
    ///
    /// Intentionally has no dedup; the scheduler runs it once per day.
    pub async fn run_due_soon_sweep(&self) -> AppResult<SweepOutcome> {
        let now = self.clock.now();
        let today = now.with_timezone(&self.timezone).date_naive();
        let tomorrow = today
            .succ_opt()
            .ok_or_else(|| AppError::Internal("calendar overflow".to_string()))?;
        let (start, end) = local_day_window(tomorrow, self.timezone);

        let due_todos = self.todo_repo.find_due_between(start, end).await?;

        let mut outcome = SweepOutcome::default();
        for item in due_todos {
            let result = self
                .create_internal(
                    &item.user_id,
                    Some(&item.id),
                    NotificationType::Deadline,
                    DUE_SOON_TITLE.to_string(),
                    due_soon_message(&item.title),
                    None,
                )
                .await;

            match result {
                Ok(_) => outcome.created += 1,
                Err(e) => {
                    outcome.failed += 1;
                    tracing::warn!(todo_id = %item.id, error = %e, "Due-soon notification failed");
                }
            }
        }

        tracing::info!(
            created = outcome.created,
            failed = outcome.failed,
            "Due-soon sweep finished"
        );
        Ok(outcome)
    }

    /// Notify every incomplete todo whose due date has passed.
    ///
    /// At most one `DEADLINE` notification per todo per rolling 24 hours: a
    /// read check skips already-notified todos, and the unique index on
    /// `(todo_id, type, day_bucket)` turns a concurrent double-insert into a
    /// conflict that is counted as a skip.
    pub async fn run_overdue_sweep(&self) -> AppResult<SweepOutcome> {
        let now = self.clock.now();
        let today = now.with_timezone(&self.timezone).date_naive();
        let (boundary, _) = local_day_window(today, self.timezone);
        let since = now - Duration::hours(24);

        let overdue_todos = self.todo_repo.find_overdue(boundary).await?;

        let mut outcome = SweepOutcome::default();
        for item in overdue_todos {
            match self.notify_overdue(&item, since, today).await {
                Ok(true) => outcome.created += 1,
                Ok(false) | Err(AppError::Conflict(_)) => outcome.skipped += 1,
                Err(e) => {
                    outcome.failed += 1;
                    tracing::warn!(todo_id = %item.id, error = %e, "Overdue notification failed");
                }
            }
        }

        tracing::info!(
            created = outcome.created,
            skipped = outcome.skipped,
            failed = outcome.failed,
            "Overdue sweep finished"
        );
        Ok(outcome)
    }

    /// Returns `Ok(true)` if a notification was created, `Ok(false)` if a
    /// recent one already covers the todo.
    async fn notify_overdue(
        &self,
        item: &todo::Model,
        since: DateTime<Utc>,
        day_bucket: NaiveDate,
    ) -> AppResult<bool> {
        let existing = self
            .notification_repo
            .find_recent_deadline_for_todo(&item.id, since)
            .await?;
        if existing.is_some() {
            return Ok(false);
        }

        self.create_internal(
            &item.user_id,
            Some(&item.id),
            NotificationType::Deadline,
            OVERDUE_TITLE.to_string(),
            overdue_message(&item.title),
            Some(day_bucket),
        )
        .await?;

        Ok(true)
    }

    /// Congratulate the owner when a todo transitions to completed.
    pub async fn notify_todo_completed(
        &self,
        item: &todo::Model,
    ) -> AppResult<notification::Model> {
        self.create_internal(
            &item.user_id,
            Some(&item.id),
            NotificationType::Completed,
            COMPLETED_TITLE.to_string(),
            completed_message(&item.title),
            None,
        )
        .await
    }

    /// Get a page of a user's notifications, newest first, each joined with
    /// its todo (when it still exists). Returns the page and the total count.
    pub async fn list(
        &self,
        user_id: &str,
        read: Option<bool>,
        page: u64,
        limit: u64,
    ) -> AppResult<(Vec<(notification::Model, Option<todo::Model>)>, u64)> {
        let page = page.max(1);
        let limit = limit.clamp(1, 100);

        let notifications = self
            .notification_repo
            .find_by_user(user_id, read, page, limit)
            .await?;
        let total = self.notification_repo.count_by_user(user_id, read).await?;

        let todo_ids: Vec<String> = notifications
            .iter()
            .filter_map(|n| n.todo_id.clone())
            .collect();
        let todos_by_id: HashMap<String, todo::Model> = self
            .todo_repo
            .find_by_ids(&todo_ids)
            .await?
            .into_iter()
            .map(|t| (t.id.clone(), t))
            .collect();

        let joined = notifications
            .into_iter()
            .map(|n| {
                let linked = n.todo_id.as_ref().and_then(|id| todos_by_id.get(id).cloned());
                (n, linked)
            })
            .collect();

        Ok((joined, total))
    }

    /// Mark a notification as read and return it.
    ///
    /// A notification that does not exist or belongs to another user is a
    /// not-found outcome, not a silent no-op.
    pub async fn mark_as_read(&self, user_id: &str, id: &str) -> AppResult<notification::Model> {
        let rows = self.notification_repo.mark_as_read(id, user_id).await?;
        if rows == 0 {
            return Err(AppError::NotificationNotFound(id.to_string()));
        }

        self.notification_repo
            .find_by_id_and_user(id, user_id)
            .await?
            .ok_or_else(|| AppError::NotificationNotFound(id.to_string()))
    }

    /// Mark all of a user's unread notifications as read. Idempotent.
    pub async fn mark_all_as_read(&self, user_id: &str) -> AppResult<u64> {
        self.notification_repo.mark_all_as_read(user_id).await
    }

    /// Delete a notification, scoped to its owner.
    pub async fn delete(&self, user_id: &str, id: &str) -> AppResult<()> {
        let rows = self.notification_repo.delete(id, user_id).await?;
        if rows == 0 {
            return Err(AppError::NotificationNotFound(id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use devtodo_db::entities::todo::Priority;
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult};

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn mock_todo(id: &str, user_id: &str, title: &str) -> todo::Model {
        todo::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            title: title.to_string(),
            description: None,
            priority: Priority::Medium,
            completed: false,
            due_date: Some(Utc::now().into()),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn mock_notification(id: &str, user_id: &str, todo_id: Option<&str>) -> notification::Model {
        notification::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            todo_id: todo_id.map(ToString::to_string),
            notification_type: NotificationType::Deadline,
            title: OVERDUE_TITLE.to_string(),
            message: overdue_message("Pay rent"),
            is_read: false,
            day_bucket: None,
            created_at: Utc::now().into(),
        }
    }

    fn service(
        notification_db: MockDatabase,
        todo_db: MockDatabase,
        now: DateTime<Utc>,
        tz: Tz,
    ) -> NotificationService {
        NotificationService::new(
            NotificationRepository::new(Arc::new(notification_db.into_connection())),
            TodoRepository::new(Arc::new(todo_db.into_connection())),
            Arc::new(FixedClock(now)),
            tz,
        )
    }

    #[test]
    fn test_templates() {
        assert_eq!(
            due_soon_message("Pay rent"),
            "A tarefa \"Pay rent\" vence amanhã."
        );
        assert_eq!(
            overdue_message("Pay rent"),
            "A tarefa \"Pay rent\" está atrasada."
        );
        assert_eq!(
            completed_message("Pay rent"),
            "Parabéns! Você concluiu \"Pay rent\"."
        );
        assert_eq!(DUE_SOON_TITLE, "Prazo se aproximando!");
        assert_eq!(COMPLETED_TITLE, "Tarefa concluída! 🎉");
    }

    #[test]
    fn test_local_day_window_utc() {
        let date = NaiveDate::from_ymd_opt(2026, 6, 10).unwrap();
        let (start, end) = local_day_window(date, chrono_tz::UTC);

        assert_eq!(start, Utc.with_ymd_and_hms(2026, 6, 10, 0, 0, 0).unwrap());
        assert_eq!(
            end,
            Utc.with_ymd_and_hms(2026, 6, 10, 23, 59, 59).unwrap() + Duration::milliseconds(999)
        );
    }

    #[test]
    fn test_local_day_window_offset_timezone() {
        // Sao Paulo is UTC-3 year-round since 2019.
        let date = NaiveDate::from_ymd_opt(2026, 6, 10).unwrap();
        let (start, end) = local_day_window(date, chrono_tz::America::Sao_Paulo);

        assert_eq!(start, Utc.with_ymd_and_hms(2026, 6, 10, 3, 0, 0).unwrap());
        assert_eq!(
            end,
            Utc.with_ymd_and_hms(2026, 6, 11, 2, 59, 59).unwrap() + Duration::milliseconds(999)
        );
    }

    #[tokio::test]
    async fn test_create_joins_linked_todo() {
        let notification_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[mock_notification("n1", "u1", Some("t1"))]]);
        let todo_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[mock_todo("t1", "u1", "Pay rent")]]);

        let svc = service(notification_db, todo_db, Utc::now(), chrono_tz::UTC);

        let (created, linked) = svc
            .create(CreateNotificationInput {
                title: "Lembrete".to_string(),
                message: "Não esqueça.".to_string(),
                notification_type: None,
                user_id: "u1".to_string(),
                todo_id: Some("t1".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(created.id, "n1");
        assert_eq!(linked.map(|t| t.title), Some("Pay rent".to_string()));
    }

    #[tokio::test]
    async fn test_due_soon_sweep_creates_one_per_todo() {
        let t1 = mock_todo("t1", "u1", "Pay rent");
        let t2 = mock_todo("t2", "u2", "Buy milk");

        let todo_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[t1, t2]]);
        let notification_db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([
            vec![mock_notification("n1", "u1", Some("t1"))],
            vec![mock_notification("n2", "u2", Some("t2"))],
        ]);

        let now = Utc.with_ymd_and_hms(2026, 6, 9, 9, 0, 0).unwrap();
        let svc = service(notification_db, todo_db, now, chrono_tz::UTC);

        let outcome = svc.run_due_soon_sweep().await.unwrap();

        assert_eq!(outcome.created, 2);
        assert_eq!(outcome.skipped, 0);
        assert_eq!(outcome.failed, 0);
    }

    #[tokio::test]
    async fn test_due_soon_sweep_empty_window() {
        let todo_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<todo::Model>::new()]);
        let notification_db = MockDatabase::new(DatabaseBackend::Postgres);

        let now = Utc.with_ymd_and_hms(2026, 6, 9, 9, 0, 0).unwrap();
        let svc = service(notification_db, todo_db, now, chrono_tz::UTC);

        let outcome = svc.run_due_soon_sweep().await.unwrap();

        assert_eq!(outcome, SweepOutcome::default());
    }

    #[tokio::test]
    async fn test_due_soon_sweep_continues_after_insert_failure() {
        let t1 = mock_todo("t1", "u1", "Pay rent");
        let t2 = mock_todo("t2", "u2", "Buy milk");

        let todo_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[t1, t2]]);
        // t1's insert fails; t2 still gets its notification.
        let notification_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([DbErr::Custom("insert failed".to_string())])
            .append_query_results([[mock_notification("n1", "u2", Some("t2"))]]);

        let now = Utc.with_ymd_and_hms(2026, 6, 9, 9, 0, 0).unwrap();
        let svc = service(notification_db, todo_db, now, chrono_tz::UTC);

        let outcome = svc.run_due_soon_sweep().await.unwrap();

        assert_eq!(outcome.created, 1);
        assert_eq!(outcome.failed, 1);
    }

    #[tokio::test]
    async fn test_overdue_sweep_skips_recently_notified() {
        let t1 = mock_todo("t1", "u1", "Pay rent");
        let t2 = mock_todo("t2", "u1", "Buy milk");

        let todo_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[t1, t2]]);
        // t1: a recent deadline notification exists; t2: none, insert succeeds.
        let notification_db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([
            vec![mock_notification("n0", "u1", Some("t1"))],
            Vec::<notification::Model>::new(),
            vec![mock_notification("n1", "u1", Some("t2"))],
        ]);

        let now = Utc.with_ymd_and_hms(2026, 6, 9, 10, 0, 0).unwrap();
        let svc = service(notification_db, todo_db, now, chrono_tz::UTC);

        let outcome = svc.run_overdue_sweep().await.unwrap();

        assert_eq!(outcome.created, 1);
        assert_eq!(outcome.skipped, 1);
        assert_eq!(outcome.failed, 0);
    }

    #[tokio::test]
    async fn test_overdue_sweep_continues_after_insert_failure() {
        let t1 = mock_todo("t1", "u1", "Pay rent");
        let t2 = mock_todo("t2", "u1", "Buy milk");

        let todo_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[t1, t2]]);
        let notification_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<notification::Model>::new()])
            .append_query_errors([DbErr::Custom("insert failed".to_string())])
            .append_query_results([
                Vec::<notification::Model>::new(),
                vec![mock_notification("n1", "u1", Some("t2"))],
            ]);

        let now = Utc.with_ymd_and_hms(2026, 6, 9, 10, 0, 0).unwrap();
        let svc = service(notification_db, todo_db, now, chrono_tz::UTC);

        let outcome = svc.run_overdue_sweep().await.unwrap();

        assert_eq!(outcome.created, 1);
        assert_eq!(outcome.failed, 1);
    }

    #[tokio::test]
    async fn test_mark_as_read_not_found_on_ownership_mismatch() {
        let notification_db = MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            },
        ]);
        let todo_db = MockDatabase::new(DatabaseBackend::Postgres);

        let svc = service(notification_db, todo_db, Utc::now(), chrono_tz::UTC);

        let result = svc.mark_as_read("u2", "n1").await;

        assert!(matches!(result, Err(AppError::NotificationNotFound(_))));
    }

    #[tokio::test]
    async fn test_mark_as_read_returns_notification() {
        let mut read = mock_notification("n1", "u1", None);
        read.is_read = true;

        let notification_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_results([[read]]);
        let todo_db = MockDatabase::new(DatabaseBackend::Postgres);

        let svc = service(notification_db, todo_db, Utc::now(), chrono_tz::UTC);

        let result = svc.mark_as_read("u1", "n1").await.unwrap();

        assert!(result.is_read);
        assert_eq!(result.id, "n1");
    }

    #[tokio::test]
    async fn test_mark_all_as_read_returns_rows_affected() {
        let notification_db = MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 3,
            },
        ]);
        let todo_db = MockDatabase::new(DatabaseBackend::Postgres);

        let svc = service(notification_db, todo_db, Utc::now(), chrono_tz::UTC);

        assert_eq!(svc.mark_all_as_read("u1").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_mark_all_as_read_is_idempotent() {
        let notification_db = MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 3,
            },
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            },
        ]);
        let todo_db = MockDatabase::new(DatabaseBackend::Postgres);

        let svc = service(notification_db, todo_db, Utc::now(), chrono_tz::UTC);

        assert_eq!(svc.mark_all_as_read("u1").await.unwrap(), 3);
        // Everything is already read; a second run succeeds touching nothing.
        assert_eq!(svc.mark_all_as_read("u1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_not_found_on_ownership_mismatch() {
        let notification_db = MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            },
        ]);
        let todo_db = MockDatabase::new(DatabaseBackend::Postgres);

        let svc = service(notification_db, todo_db, Utc::now(), chrono_tz::UTC);

        let result = svc.delete("u2", "n1").await;

        assert!(matches!(result, Err(AppError::NotificationNotFound(_))));
    }

    #[tokio::test]
    async fn test_list_joins_todos() {
        let n1 = mock_notification("n1", "u1", Some("t1"));
        let n2 = mock_notification("n2", "u1", None);

        let notification_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![n1, n2]])
            .append_query_results([[maplit::btreemap! {
                "num_items" => sea_orm::Value::BigInt(Some(2))
            }]]);
        let todo_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[mock_todo("t1", "u1", "Pay rent")]]);

        let svc = service(notification_db, todo_db, Utc::now(), chrono_tz::UTC);

        let (items, total) = svc.list("u1", None, 1, 10).await.unwrap();

        assert_eq!(total, 2);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].1.as_ref().map(|t| t.id.as_str()), Some("t1"));
        assert!(items[1].1.is_none());
    }
}
