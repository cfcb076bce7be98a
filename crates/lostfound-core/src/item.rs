//! Items: reported found objects and their review status.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::claim::ClaimId;

/// Store-assigned numeric identity of an [`Item`]. Never reused.
pub type ItemId = i64;

// ─── Status ──────────────────────────────────────────────────────────────────

/// Review status of an item.
///
/// `Display` renders the human label; `FromStr` accepts both the label and the
/// snake_case form used on the wire and in the database.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(ascii_case_insensitive)]
pub enum ItemStatus {
  /// Newly reported; awaiting an administrator.
  #[serde(alias = "Pending Review")]
  #[strum(to_string = "Pending Review", serialize = "pending_review")]
  PendingReview,
  /// Visible in the public listing and open to claims.
  #[serde(alias = "Approved")]
  #[strum(to_string = "Approved", serialize = "approved")]
  Approved,
  /// Declined by an administrator. Terminal.
  #[serde(alias = "Rejected")]
  #[strum(to_string = "Rejected", serialize = "rejected")]
  Rejected,
  /// Returned to its owner through an approved claim. Terminal.
  #[serde(alias = "Claimed")]
  #[strum(to_string = "Claimed", serialize = "claimed")]
  Claimed,
}

impl ItemStatus {
  /// The snake_case form stored in the `status` column.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::PendingReview => "pending_review",
      Self::Approved => "approved",
      Self::Rejected => "rejected",
      Self::Claimed => "claimed",
    }
  }
}

// ─── Item ────────────────────────────────────────────────────────────────────

/// A found object as recorded by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
  pub id:             ItemId,
  pub name:           String,
  pub description:    String,
  pub location_found: Option<String>,
  /// How the finder can be reached; shown to administrators only.
  pub contact_info:   String,
  /// Reference to an uploaded photo. The registry never stores image data.
  pub photo_url:      Option<String>,
  /// The day the object was found; listings are ordered by it.
  pub date_found:     NaiveDate,
  /// Server-assigned; never changes after creation.
  pub created_at:     DateTime<Utc>,
  /// Set when an administrator approves the posting.
  pub approved_at:    Option<DateTime<Utc>>,
  pub status:         ItemStatus,
  /// The claim whose approval resolved this item. Present iff `Claimed`.
  pub claim_id:       Option<ClaimId>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn status_parses_labels_and_wire_form() {
    assert_eq!("Pending Review".parse::<ItemStatus>().unwrap(), ItemStatus::PendingReview);
    assert_eq!("pending_review".parse::<ItemStatus>().unwrap(), ItemStatus::PendingReview);
    assert_eq!("claimed".parse::<ItemStatus>().unwrap(), ItemStatus::Claimed);
    assert!("archived".parse::<ItemStatus>().is_err());
  }

  #[test]
  fn status_display_is_human_label() {
    assert_eq!(ItemStatus::PendingReview.to_string(), "Pending Review");
    assert_eq!(ItemStatus::Claimed.to_string(), "Claimed");
  }

  #[test]
  fn status_serde_accepts_legacy_labels() {
    let s: ItemStatus = serde_json::from_str("\"Approved\"").unwrap();
    assert_eq!(s, ItemStatus::Approved);
    let s: ItemStatus = serde_json::from_str("\"Pending Review\"").unwrap();
    assert_eq!(s, ItemStatus::PendingReview);
    assert_eq!(
      serde_json::to_string(&ItemStatus::PendingReview).unwrap(),
      "\"pending_review\""
    );
  }

  #[test]
  fn as_str_round_trips_through_from_str() {
    for status in [
      ItemStatus::PendingReview,
      ItemStatus::Approved,
      ItemStatus::Rejected,
      ItemStatus::Claimed,
    ] {
      assert_eq!(status.as_str().parse::<ItemStatus>().unwrap(), status);
    }
  }
}
