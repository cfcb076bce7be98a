//! Claims: ownership inquiries against a specific item.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::item::{ItemId, ItemStatus};

/// Store-assigned numeric identity of a [`Claim`]. Never reused.
pub type ClaimId = i64;

/// Review status of a claim. Both outcomes are terminal.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(ascii_case_insensitive)]
pub enum ClaimStatus {
  #[serde(alias = "New Claim")]
  #[strum(to_string = "New Claim", serialize = "new_claim")]
  NewClaim,
  #[serde(alias = "Approved")]
  #[strum(to_string = "Approved", serialize = "approved")]
  Approved,
  #[serde(alias = "Rejected")]
  #[strum(to_string = "Rejected", serialize = "rejected")]
  Rejected,
}

impl ClaimStatus {
  /// The snake_case form stored in the `status` column.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::NewClaim => "new_claim",
      Self::Approved => "approved",
      Self::Rejected => "rejected",
    }
  }
}

/// An ownership claim as recorded by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
  pub id:            ClaimId,
  pub item_id:       ItemId,
  pub claimer_name:  String,
  pub claimer_email: String,
  /// Free-text proof of ownership.
  pub match_details: String,
  pub submitted_at:  DateTime<Utc>,
  /// Set when the claim leaves `NewClaim`.
  pub reviewed_at:   Option<DateTime<Utc>>,
  pub status:        ClaimStatus,
}

/// A claim joined with the item it references, for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimSummary {
  #[serde(flatten)]
  pub claim:       Claim,
  pub item_name:   String,
  pub item_status: ItemStatus,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn new_claim_label() {
    assert_eq!(ClaimStatus::NewClaim.to_string(), "New Claim");
    assert_eq!("New Claim".parse::<ClaimStatus>().unwrap(), ClaimStatus::NewClaim);
    let s: ClaimStatus = serde_json::from_str("\"Rejected\"").unwrap();
    assert_eq!(s, ClaimStatus::Rejected);
  }
}
