//! Handlers for public `/items` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/items` | Body: [`NewItem`]; returns 201 + item in `pending_review` |
//! | `GET`  | `/items` | Optional `?query`, `sort=newest\|oldest`, `limit`, `offset` |
//! | `GET`  | `/items/{id}` | 404 unless the item is `approved` |

use axum::{
  Json,
  extract::{
    Path, Query, State,
    rejection::{JsonRejection, PathRejection, QueryRejection},
  },
  http::StatusCode,
  response::IntoResponse,
};
use lostfound_core::{
  intake::NewItem,
  item::{Item, ItemId, ItemStatus},
  store::{FoundOrder, ItemQuery, RegistryStore},
};
use serde::Deserialize;

use crate::{ApiState, error::ApiError};

/// Upper bound on `limit` for public listing.
pub const MAX_PAGE: usize = 500;

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /items`
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  body: Result<Json<NewItem>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RegistryStore + 'static,
{
  let Json(body) = body?;
  let input = body.validate()?;

  let item = state.store.create_item(input).await.map_err(ApiError::store)?;
  tracing::info!(item_id = item.id, "item reported");
  Ok((StatusCode::CREATED, Json(item)))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  /// Substring matched against name and description.
  pub query:  Option<String>,
  #[serde(default)]
  pub sort:   FoundOrder,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

impl From<ListParams> for ItemQuery {
  fn from(p: ListParams) -> Self {
    ItemQuery {
      text:   p.query,
      sort:   p.sort,
      limit:  Some(p.limit.unwrap_or(MAX_PAGE).min(MAX_PAGE)),
      offset: p.offset,
    }
  }
}

/// `GET /items[?query=...][&sort=newest|oldest][&limit=N][&offset=N]`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<Item>>, ApiError>
where
  S: RegistryStore + 'static,
{
  let Query(params) = params?;
  let query = ItemQuery::from(params);
  let items = state.store.list_items(&query).await.map_err(ApiError::store)?;
  Ok(Json(items))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /items/{id}`
pub async fn get_one<S>(
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
    .filter(|item| item.status == ItemStatus::Approved)
    .ok_or(lostfound_core::Error::ItemNotFound(id))?;
  Ok(Json(item))
}
