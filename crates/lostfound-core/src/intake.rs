//! Submission intake: validation of new items and claims.
//!
//! Raw submissions deserialise leniently (missing strings become empty) so
//! that every problem is reported at once as a single
//! [`Error::Validation`](crate::Error::Validation). Stores only accept the
//! [`Validated`] wrapper, which can be obtained solely through `validate()`.

use std::ops::Deref;

use chrono::{Days, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};

use crate::{Error, Result, item::ItemId};

const NAME_MAX: usize = 200;
const TEXT_MAX: usize = 5000;
const URL_MAX: usize = 2048;

// ─── Validated ───────────────────────────────────────────────────────────────

/// Proof that a submission passed intake validation.
#[derive(Debug, Clone)]
pub struct Validated<T>(T);

impl<T> Validated<T> {
  pub fn into_inner(self) -> T { self.0 }
}

impl<T> Deref for Validated<T> {
  type Target = T;

  fn deref(&self) -> &T { &self.0 }
}

// ─── Items ───────────────────────────────────────────────────────────────────

/// A found-item report as submitted by the public.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewItem {
  #[serde(default)]
  pub name:           String,
  #[serde(default)]
  pub description:    String,
  pub location_found: Option<String>,
  #[serde(default)]
  pub contact_info:   String,
  pub photo_url:      Option<String>,
  /// Defaults to the creation date when absent.
  pub date_found:     Option<NaiveDate>,
}

impl NewItem {
  /// Trim every field and check required ones; the resulting item starts in
  /// `PendingReview`.
  pub fn validate(self) -> Result<Validated<NewItem>> {
    let mut problems = Vec::new();

    let name = required("name", self.name, NAME_MAX, &mut problems);
    let description =
      required("description", self.description, TEXT_MAX, &mut problems);
    let contact_info =
      required("contact_info", self.contact_info, NAME_MAX, &mut problems);
    let location_found =
      optional("location_found", self.location_found, NAME_MAX, &mut problems);
    let photo_url = optional("photo_url", self.photo_url, URL_MAX, &mut problems);

    if let Some(date) = self.date_found {
      // One day of slack for reporters ahead of UTC.
      let latest = Utc::now().date_naive() + Days::new(1);
      if date > latest {
        problems.push("date_found cannot be in the future".to_owned());
      }
    }

    if !problems.is_empty() {
      return Err(Error::Validation(problems));
    }

    Ok(Validated(NewItem {
      name,
      description,
      location_found,
      contact_info,
      photo_url,
      date_found: self.date_found,
    }))
  }
}

// ─── Claims ──────────────────────────────────────────────────────────────────

/// An ownership claim as submitted by the public.
#[derive(Debug, Clone, Deserialize)]
pub struct NewClaim {
  /// Accepts a JSON number or a numeric string, as HTML forms send it.
  #[serde(deserialize_with = "id_from_number_or_string")]
  pub item_id:       ItemId,
  #[serde(default)]
  pub claimer_name:  String,
  #[serde(default)]
  pub claimer_email: String,
  #[serde(default)]
  pub match_details: String,
}

impl NewClaim {
  pub fn new(item_id: ItemId) -> Self {
    Self {
      item_id,
      claimer_name: String::new(),
      claimer_email: String::new(),
      match_details: String::new(),
    }
  }

  /// Trim every field and check required ones; the resulting claim starts in
  /// `NewClaim`. Whether `item_id` exists is checked by the store at insert.
  pub fn validate(self) -> Result<Validated<NewClaim>> {
    let mut problems = Vec::new();

    if self.item_id <= 0 {
      problems.push("item_id must be a positive item id".to_owned());
    }
    let claimer_name =
      required("claimer_name", self.claimer_name, NAME_MAX, &mut problems);
    let claimer_email =
      required("claimer_email", self.claimer_email, NAME_MAX, &mut problems);
    if !claimer_email.is_empty() && !looks_like_email(&claimer_email) {
      problems.push("claimer_email is not a valid email address".to_owned());
    }
    let match_details =
      required("match_details", self.match_details, TEXT_MAX, &mut problems);

    if !problems.is_empty() {
      return Err(Error::Validation(problems));
    }

    Ok(Validated(NewClaim {
      item_id: self.item_id,
      claimer_name,
      claimer_email,
      match_details,
    }))
  }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn required(
  field: &str,
  value: String,
  max: usize,
  problems: &mut Vec<String>,
) -> String {
  let value = value.trim();
  if value.is_empty() {
    problems.push(format!("{field} is required"));
  } else if value.chars().count() > max {
    problems.push(format!("{field} exceeds {max} characters"));
  }
  value.to_owned()
}

fn optional(
  field: &str,
  value: Option<String>,
  max: usize,
  problems: &mut Vec<String>,
) -> Option<String> {
  let value = value?;
  let value = value.trim();
  if value.is_empty() {
    return None;
  }
  if value.chars().count() > max {
    problems.push(format!("{field} exceeds {max} characters"));
  }
  Some(value.to_owned())
}

fn looks_like_email(s: &str) -> bool {
  match s.split_once('@') {
    Some((local, domain)) => {
      !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && !s.chars().any(char::is_whitespace)
    }
    None => false,
  }
}

fn id_from_number_or_string<'de, D>(deserializer: D) -> Result<ItemId, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum RawId {
    Number(ItemId),
    Text(String),
  }

  match RawId::deserialize(deserializer)? {
    RawId::Number(n) => Ok(n),
    RawId::Text(s) => s
      .trim()
      .parse()
      .map_err(|_| serde::de::Error::custom(format!("invalid item id: {s:?}"))),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn item() -> NewItem {
    NewItem {
      name: "  Blue umbrella ".into(),
      description: "Compact, wooden handle".into(),
      location_found: Some("   ".into()),
      contact_info: "front desk".into(),
      photo_url: None,
      date_found: None,
    }
  }

  fn claim() -> NewClaim {
    NewClaim {
      item_id:       7,
      claimer_name:  "Dana".into(),
      claimer_email: "dana@example.com".into(),
      match_details: "Initials carved on the handle".into(),
    }
  }

  #[test]
  fn item_fields_are_trimmed_and_blank_optionals_dropped() {
    let v = item().validate().unwrap();
    assert_eq!(v.name, "Blue umbrella");
    assert_eq!(v.location_found, None);
  }

  #[test]
  fn item_reports_every_missing_field() {
    let err = NewItem::default().validate().unwrap_err();
    let Error::Validation(problems) = err else { panic!("expected validation error") };
    assert_eq!(problems.len(), 3);
    assert!(problems.iter().any(|p| p.contains("name")));
    assert!(problems.iter().any(|p| p.contains("description")));
    assert!(problems.iter().any(|p| p.contains("contact_info")));
  }

  #[test]
  fn item_rejects_future_date() {
    let mut input = item();
    input.date_found = Some(Utc::now().date_naive() + Days::new(30));
    assert!(matches!(input.validate(), Err(Error::Validation(_))));
  }

  #[test]
  fn item_rejects_overlong_name() {
    let mut input = item();
    input.name = "x".repeat(NAME_MAX + 1);
    assert!(matches!(input.validate(), Err(Error::Validation(_))));
  }

  #[test]
  fn claim_requires_all_fields() {
    let err = NewClaim::new(3).validate().unwrap_err();
    let Error::Validation(problems) = err else { panic!("expected validation error") };
    assert_eq!(problems.len(), 3);
  }

  #[test]
  fn claim_rejects_bad_email_and_id() {
    let mut input = claim();
    input.item_id = 0;
    input.claimer_email = "not-an-email".into();
    let Error::Validation(problems) = input.validate().unwrap_err() else {
      panic!("expected validation error")
    };
    assert_eq!(problems.len(), 2);
  }

  #[test]
  fn claim_accepts_valid_input() {
    let v = claim().validate().unwrap();
    assert_eq!(v.item_id, 7);
  }

  #[test]
  fn claim_item_id_accepts_numeric_string() {
    let c: NewClaim = serde_json::from_str(
      r#"{"item_id":"12","claimer_name":"a","claimer_email":"a@b","match_details":"m"}"#,
    )
    .unwrap();
    assert_eq!(c.item_id, 12);

    let bad = serde_json::from_str::<NewClaim>(r#"{"item_id":"twelve"}"#);
    assert!(bad.is_err());
  }
}
