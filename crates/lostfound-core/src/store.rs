//! The `RegistryStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `lostfound-store-sqlite`).
//! Higher layers (`lostfound-api`, `lostfound-server`) depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::{
  Classify,
  claim::{Claim, ClaimId, ClaimStatus},
  intake::{NewClaim, NewItem, Validated},
  item::{Item, ItemId, ItemStatus},
  lifecycle::{ClaimTransition, Dashboard},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Listing order by the day an item was found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FoundOrder {
  #[default]
  Newest,
  Oldest,
}

/// Parameters for [`RegistryStore::list_items`]. Only `Approved` items are
/// ever listed.
#[derive(Debug, Clone, Default)]
pub struct ItemQuery {
  /// Case-insensitive substring matched against name and description.
  pub text:   Option<String>,
  pub sort:   FoundOrder,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a registry storage backend.
///
/// Items and claims are never deleted. Their statuses change only through
/// [`transition_item`](Self::transition_item) and
/// [`transition_claim`](Self::transition_claim), which must apply the rules in
/// [`crate::lifecycle`] atomically with respect to concurrent callers.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait RegistryStore: Send + Sync {
  type Error: std::error::Error + Classify + Send + Sync + 'static;

  // ── Intake ────────────────────────────────────────────────────────────

  /// Persist a new item in `PendingReview`. `created_at` is set by the store.
  fn create_item(
    &self,
    input: Validated<NewItem>,
  ) -> impl Future<Output = Result<Item, Self::Error>> + Send + '_;

  /// Persist a new claim in `NewClaim`.
  ///
  /// Fails with `ItemNotFound` if `input.item_id` does not exist; in that case
  /// nothing is written.
  fn create_claim(
    &self,
    input: Validated<NewClaim>,
  ) -> impl Future<Output = Result<Claim, Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Retrieve an item by id in any status. Returns `None` if not found.
  fn get_item(
    &self,
    id: ItemId,
  ) -> impl Future<Output = Result<Option<Item>, Self::Error>> + Send + '_;

  /// Retrieve a claim by id in any status. Returns `None` if not found.
  fn get_claim(
    &self,
    id: ClaimId,
  ) -> impl Future<Output = Result<Option<Claim>, Self::Error>> + Send + '_;

  /// List `Approved` items matching `query`, ordered by found date.
  fn list_items<'a>(
    &'a self,
    query: &'a ItemQuery,
  ) -> impl Future<Output = Result<Vec<Item>, Self::Error>> + Send + 'a;

  /// Every item and every claim (joined with its item), read as one snapshot.
  fn dashboard(
    &self,
  ) -> impl Future<Output = Result<Dashboard, Self::Error>> + Send + '_;

  // ── Transitions ───────────────────────────────────────────────────────

  /// Apply an administrator decision to an item.
  ///
  /// The item must be in `PendingReview` and `target` must be `Approved` or
  /// `Rejected`; otherwise `InvalidItemTransition` and nothing changes.
  fn transition_item(
    &self,
    id: ItemId,
    target: ItemStatus,
  ) -> impl Future<Output = Result<Item, Self::Error>> + Send + '_;

  /// Apply an administrator decision to a claim.
  ///
  /// Approval also moves the referenced item to `Claimed`. The claim write,
  /// the item re-check, and the item write commit together or not at all.
  fn transition_claim(
    &self,
    id: ClaimId,
    target: ClaimStatus,
  ) -> impl Future<Output = Result<ClaimTransition, Self::Error>> + Send + '_;
}
