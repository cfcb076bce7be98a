//! Handlers for `/admin` endpoints. Every handler takes [`AdminAccess`], so a
//! request without a valid admin key never reaches the store.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/admin/data` | Every item and claim, with pending counts |
//! | `GET`  | `/admin/items/{id}` | Any status |
//! | `GET`  | `/admin/claims/{id}` | Any status |
//! | `PUT`  | `/admin/item/{id}` | Body: `{"status":"approved"\|"rejected"}` |
//! | `PUT`  | `/admin/claim/{id}` | Body: `{"status":"approved"\|"rejected"}` |

use axum::{
  Json,
  extract::{
    Path, State,
    rejection::{JsonRejection, PathRejection},
  },
};
use lostfound_core::{
  claim::{Claim, ClaimId, ClaimStatus},
  item::{Item, ItemId, ItemStatus},
  lifecycle::Dashboard,
  store::RegistryStore,
};
use serde::{Deserialize, Serialize};

use crate::{ApiState, error::ApiError, gateway::AdminAccess};

// ─── Reads ────────────────────────────────────────────────────────────────────

/// `GET /admin/data`
pub async fn data<S>(
  _: AdminAccess,
  State(state): State<ApiState<S>>,
) -> Result<Json<Dashboard>, ApiError>
where
  S: RegistryStore + 'static,
{
  let dashboard = state.store.dashboard().await.map_err(ApiError::store)?;
  Ok(Json(dashboard))
}

/// `GET /admin/items/{id}`
pub async fn get_item<S>(
  _: AdminAccess,
  State(state): State<ApiState<S>>,
  id: Result<Path<ItemId>, PathRejection>,
) -> Result<Json<Item>, ApiError>
where
  S: RegistryStore + 'static,
{
  let Path(id) = id?;
  let item = state
    .store
    .get_item(id)
    .await
    .map_err(ApiError::store)?
    .ok_or(lostfound_core::Error::ItemNotFound(id))?;
  Ok(Json(item))
}

/// `GET /admin/claims/{id}`
pub async fn get_claim<S>(
  _: AdminAccess,
  State(state): State<ApiState<S>>,
  id: Result<Path<ClaimId>, PathRejection>,
) -> Result<Json<Claim>, ApiError>
where
  S: RegistryStore + 'static,
{
  let Path(id) = id?;
  let claim = state
    .store
    .get_claim(id)
    .await
    .map_err(ApiError::store)?
    .ok_or(lostfound_core::Error::ClaimNotFound(id))?;
  Ok(Json(claim))
}

// ─── Decisions ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ItemDecision {
  pub status: ItemStatus,
}

impl ItemDecision {
  /// The decided status, if it is one an administrator may choose.
  pub fn target(&self) -> Result<ItemStatus, ApiError> {
    if self.status.is_review_outcome() {
      Ok(self.status)
    } else {
      Err(not_a_decision(self.status.as_str()))
    }
  }
}

fn not_a_decision(status: &str) -> ApiError {
  lostfound_core::Error::Validation(vec![format!(
    "status must be \"approved\" or \"rejected\", not \"{status}\""
  )])
  .into()
}

#[derive(Debug, Serialize)]
pub struct ItemDecided {
  pub message: String,
  pub item:    Item,
}

/// `PUT /admin/item/{id}`
pub async fn review_item<S>(
  _: AdminAccess,
  State(state): State<ApiState<S>>,
  id: Result<Path<ItemId>, PathRejection>,
  body: Result<Json<ItemDecision>, JsonRejection>,
) -> Result<Json<ItemDecided>, ApiError>
where
  S: RegistryStore + 'static,
{
  let Path(id) = id?;
  let Json(body) = body?;
  let target = body.target()?;

  let item = state
    .store
    .transition_item(id, target)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(item_id = id, status = %item.status, "item reviewed");

  Ok(Json(ItemDecided {
    message: format!("Item {id} is now {}.", item.status),
    item,
  }))
}

/// Body of `PUT /admin/claim/{id}`. Older clients also send `itemId`; it is
/// ignored because the cascade always follows the claim's stored item.
#[derive(Debug, Deserialize)]
pub struct ClaimDecision {
  pub status: ClaimStatus,
}

impl ClaimDecision {
  /// The decided status, if it is one an administrator may choose.
  pub fn target(&self) -> Result<ClaimStatus, ApiError> {
    if self.status.is_review_outcome() {
      Ok(self.status)
    } else {
      Err(not_a_decision(self.status.as_str()))
    }
  }
}

#[derive(Debug, Serialize)]
pub struct ClaimDecided {
  pub message:  String,
  pub claim:    Claim,
  pub item:     Option<Item>,
  pub cascaded: bool,
}

/// `PUT /admin/claim/{id}`
pub async fn review_claim<S>(
  _: AdminAccess,
  State(state): State<ApiState<S>>,
  id: Result<Path<ClaimId>, PathRejection>,
  body: Result<Json<ClaimDecision>, JsonRejection>,
) -> Result<Json<ClaimDecided>, ApiError>
where
  S: RegistryStore + 'static,
{
  let Path(id) = id?;
  let Json(body) = body?;
  let target = body.target()?;

  let outcome = state
    .store
    .transition_claim(id, target)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(
    claim_id = id,
    item_id = outcome.claim.item_id,
    status = %outcome.claim.status,
    cascaded = outcome.cascaded,
    "claim reviewed"
  );

  let message = if outcome.cascaded {
    format!("Claim {id} approved; item {} marked claimed.", outcome.claim.item_id)
  } else {
    format!("Claim {id} is now {}.", outcome.claim.status)
  };

  Ok(Json(ClaimDecided {
    message,
    claim: outcome.claim,
    item: outcome.item,
    cascaded: outcome.cascaded,
  }))
}
