//! Business logic services.

pub mod notification;
pub mod todo;
pub mod user;

pub use notification::{CreateNotificationInput, NotificationService, SweepOutcome};
pub use todo::{CreateTodoInput, TodoService, UpdateTodoInput};
pub use user::{LoginInput, RegisterInput, UpdateProfileInput, UserService};
