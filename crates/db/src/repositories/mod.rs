//! Repository layer wrapping database access per entity.

mod notification;
mod todo;
mod user;

pub use notification::NotificationRepository;
pub use todo::{TodoFilter, TodoRepository};
pub use user::UserRepository;
