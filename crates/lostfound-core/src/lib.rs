//! Core types and trait definitions for the lost-and-found registry.
//!
//! This crate is deliberately free of HTTP and database dependencies. It owns
//! the item/claim data model, the status-transition tables, submission
//! validation, and the [`store::RegistryStore`] abstraction every backend
//! implements.

// Backends implement `RegistryStore` with native `async fn`.
#![allow(async_fn_in_trait)]

pub mod claim;
pub mod error;
pub mod intake;
pub mod item;
pub mod lifecycle;
pub mod store;

pub use error::{Classify, Error, ErrorKind, Result};
