//! SQLite backend for the lost-and-found registry.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Status transitions execute inside a
//! single `BEGIN IMMEDIATE` transaction per call.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
