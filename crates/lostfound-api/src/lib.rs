//! JSON REST API for the lost-and-found registry.
//!
//! Exposes an axum [`Router`] backed by any
//! [`lostfound_core::store::RegistryStore`]. Public routes accept submissions
//! and serve approved listings; `/admin` routes sit behind the
//! [`gateway::AdminGateway`]. TLS and transport concerns are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", lostfound_api::api_router(state))
//! ```

pub mod admin;
pub mod claims;
pub mod error;
pub mod gateway;
pub mod items;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use lostfound_core::store::RegistryStore;

pub use error::ApiError;
pub use gateway::AdminGateway;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct ApiState<S> {
  pub store:   Arc<S>,
  pub gateway: Arc<AdminGateway>,
}

impl<S> ApiState<S> {
  pub fn new(store: S, gateway: AdminGateway) -> Self {
    Self { store: Arc::new(store), gateway: Arc::new(gateway) }
  }
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), gateway: Arc::clone(&self.gateway) }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: ApiState<S>) -> Router<()>
where
  S: RegistryStore + 'static,
{
  Router::new()
    // Public
    .route("/items", get(items::list::<S>).post(items::create::<S>))
    .route("/items/{id}", get(items::get_one::<S>))
    .route("/claims", post(claims::create::<S>))
    // Admin
    .route("/admin/data", get(admin::data::<S>))
    .route("/admin/items/{id}", get(admin::get_item::<S>))
    .route("/admin/claims/{id}", get(admin::get_claim::<S>))
    .route("/admin/item/{id}", put(admin::review_item::<S>))
    .route("/admin/claim/{id}", put(admin::review_claim::<S>))
    .with_state(state)
}
