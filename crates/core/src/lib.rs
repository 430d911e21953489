//! Core business logic for devtodo-rs.

pub mod services;

pub use services::*;
