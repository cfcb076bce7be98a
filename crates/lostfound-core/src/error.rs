//! Error types for `lostfound-core`.

use serde::{Deserialize, Serialize};
use strum::Display;
use thiserror::Error;

use crate::{
  claim::{ClaimId, ClaimStatus},
  item::{ItemId, ItemStatus},
};

/// Stable, caller-facing classification of every failure the registry can
/// report. Serialised into API error bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
  /// Missing or malformed input; the caller must fix it and resubmit.
  Validation,
  NotFound,
  /// The entity is not in the source status the transition requires.
  InvalidTransition,
  Unauthorized,
  /// The atomic claim cascade aborted and was rolled back.
  CascadeFailure,
  /// Storage is unreachable or busy. Nothing was committed; retrying is safe.
  StoreUnavailable,
  Internal,
}

impl ErrorKind {
  pub fn is_retryable(self) -> bool { matches!(self, Self::StoreUnavailable) }
}

/// Implemented by every error a [`crate::store::RegistryStore`] can return.
pub trait Classify {
  fn kind(&self) -> ErrorKind;
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid submission: {}", .0.join("; "))]
  Validation(Vec<String>),

  #[error("item not found: {0}")]
  ItemNotFound(ItemId),

  #[error("claim not found: {0}")]
  ClaimNotFound(ClaimId),

  #[error("item {id} cannot move from {from} to {to}")]
  InvalidItemTransition {
    id:   ItemId,
    from: ItemStatus,
    to:   ItemStatus,
  },

  #[error("claim {id} cannot move from {from} to {to}")]
  InvalidClaimTransition {
    id:   ClaimId,
    from: ClaimStatus,
    to:   ClaimStatus,
  },

  #[error("claim {claim_id} cannot resolve item {item_id} while it is {status}")]
  ItemNotClaimable {
    claim_id: ClaimId,
    item_id:  ItemId,
    status:   ItemStatus,
  },

  #[error("unauthorized")]
  Unauthorized,

  #[error("cascade to item {item_id} failed: {reason}")]
  CascadeFailure { item_id: ItemId, reason: String },

  #[error("store unavailable: {0}")]
  StoreUnavailable(String),
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Self::Validation(_) => ErrorKind::Validation,
      Self::ItemNotFound(_) | Self::ClaimNotFound(_) => ErrorKind::NotFound,
      Self::InvalidItemTransition { .. }
      | Self::InvalidClaimTransition { .. }
      | Self::ItemNotClaimable { .. } => ErrorKind::InvalidTransition,
      Self::Unauthorized => ErrorKind::Unauthorized,
      Self::CascadeFailure { .. } => ErrorKind::CascadeFailure,
      Self::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
