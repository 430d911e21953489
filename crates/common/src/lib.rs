//! Common utilities and shared types for devtodo-rs.
//!
//! This crate provides foundational components used across all devtodo-rs crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Clock**: Injectable wall-clock abstraction via [`Clock`]
//! - **Storage**: Local file storage backend for avatar uploads
//!
//! # Example
//!
//! ```no_run
//! use devtodo_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("Generated ID: {}", id);
//!     Ok(())
//! }
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod id;
pub mod storage;

pub use clock::{Clock, SystemClock};
pub use config::{Config, SchedulerConfig, StorageConfig};
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
pub use storage::{LocalStorage, StorageBackend, StoredFile, generate_avatar_key};
