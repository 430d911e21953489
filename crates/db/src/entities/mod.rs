//! Database entities.

pub mod notification;
pub mod todo;
pub mod user;

pub use notification::Entity as Notification;
pub use todo::Entity as Todo;
pub use user::Entity as User;
