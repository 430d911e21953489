//! HTTP API layer for devtodo-rs.
//!
//! - **Endpoints**: auth/profile, todos, notifications
//! - **Extractors**: authenticated user
//! - **Middleware**: bearer-token authentication, application state
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::AppState;
