//! Handler for public claim submission.

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use lostfound_core::{intake::NewClaim, store::RegistryStore};
use serde_json::json;

use crate::{ApiState, error::ApiError};

/// `POST /claims`: returns 201 + `{"message", "claim"}`.
///
/// Claims may be filed against an item in any status; approval is where the
/// item's status matters.
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  body: Result<Json<NewClaim>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RegistryStore + 'static,
{
  let Json(body) = body?;
  let input = body.validate()?;

  let claim = state.store.create_claim(input).await.map_err(ApiError::store)?;
  tracing::info!(claim_id = claim.id, item_id = claim.item_id, "claim submitted");

  Ok((
    StatusCode::CREATED,
    Json(json!({
      "message": "Claim submitted. An administrator will review it.",
      "claim":   claim,
    })),
  ))
}
