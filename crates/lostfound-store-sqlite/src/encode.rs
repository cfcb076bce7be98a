//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, found dates as `YYYY-MM-DD`,
//! and statuses as their snake_case names.

use chrono::{DateTime, NaiveDate, Utc};
use lostfound_core::{
  claim::{Claim, ClaimStatus, ClaimSummary},
  item::{Item, ItemStatus},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Statuses ────────────────────────────────────────────────────────────────

pub fn decode_item_status(s: &str) -> Result<ItemStatus> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown item status: {s:?}")))
}

pub fn decode_claim_status(s: &str) -> Result<ClaimStatus> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown claim status: {s:?}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawItem::from_row`].
pub const ITEM_COLUMNS: &str = "id, name, description, location_found, \
  contact_info, photo_url, date_found, created_at, approved_at, status, claim_id";

/// Column list matching [`RawClaim::from_row`].
pub const CLAIM_COLUMNS: &str = "id, item_id, claimer_name, claimer_email, \
  match_details, submitted_at, reviewed_at, status";

/// Raw values read directly from an `items` row.
pub struct RawItem {
  pub id:             i64,
  pub name:           String,
  pub description:    String,
  pub location_found: Option<String>,
  pub contact_info:   String,
  pub photo_url:      Option<String>,
  pub date_found:     String,
  pub created_at:     String,
  pub approved_at:    Option<String>,
  pub status:         String,
  pub claim_id:       Option<i64>,
}

impl RawItem {
  /// Read from a row selected with [`ITEM_COLUMNS`], starting at `offset`.
  pub fn from_row(row: &rusqlite::Row<'_>, offset: usize) -> rusqlite::Result<Self> {
    Ok(RawItem {
      id:             row.get(offset)?,
      name:           row.get(offset + 1)?,
      description:    row.get(offset + 2)?,
      location_found: row.get(offset + 3)?,
      contact_info:   row.get(offset + 4)?,
      photo_url:      row.get(offset + 5)?,
      date_found:     row.get(offset + 6)?,
      created_at:     row.get(offset + 7)?,
      approved_at:    row.get(offset + 8)?,
      status:         row.get(offset + 9)?,
      claim_id:       row.get(offset + 10)?,
    })
  }

  pub fn into_item(self) -> Result<Item> {
    Ok(Item {
      id:             self.id,
      name:           self.name,
      description:    self.description,
      location_found: self.location_found,
      contact_info:   self.contact_info,
      photo_url:      self.photo_url,
      date_found:     decode_date(&self.date_found)?,
      created_at:     decode_dt(&self.created_at)?,
      approved_at:    self.approved_at.as_deref().map(decode_dt).transpose()?,
      status:         decode_item_status(&self.status)?,
      claim_id:       self.claim_id,
    })
  }
}

/// Raw values read directly from a `claims` row.
pub struct RawClaim {
  pub id:            i64,
  pub item_id:       i64,
  pub claimer_name:  String,
  pub claimer_email: String,
  pub match_details: String,
  pub submitted_at:  String,
  pub reviewed_at:   Option<String>,
  pub status:        String,
}

impl RawClaim {
  /// Read from a row selected with [`CLAIM_COLUMNS`], starting at column 0.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawClaim {
      id:            row.get(0)?,
      item_id:       row.get(1)?,
      claimer_name:  row.get(2)?,
      claimer_email: row.get(3)?,
      match_details: row.get(4)?,
      submitted_at:  row.get(5)?,
      reviewed_at:   row.get(6)?,
      status:        row.get(7)?,
    })
  }

  pub fn into_claim(self) -> Result<Claim> {
    Ok(Claim {
      id:            self.id,
      item_id:       self.item_id,
      claimer_name:  self.claimer_name,
      claimer_email: self.claimer_email,
      match_details: self.match_details,
      submitted_at:  decode_dt(&self.submitted_at)?,
      reviewed_at:   self.reviewed_at.as_deref().map(decode_dt).transpose()?,
      status:        decode_claim_status(&self.status)?,
    })
  }
}

/// A `claims` row joined with its item's name and status.
pub struct RawClaimSummary {
  pub claim:       RawClaim,
  pub item_name:   String,
  pub item_status: String,
}

impl RawClaimSummary {
  pub fn into_summary(self) -> Result<ClaimSummary> {
    Ok(ClaimSummary {
      claim:       self.claim.into_claim()?,
      item_name:   self.item_name,
      item_status: decode_item_status(&self.item_status)?,
    })
  }
}
