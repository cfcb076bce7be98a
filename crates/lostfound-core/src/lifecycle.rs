//! Status-transition rules for items and claims.
//!
//! The rules are pure: they take the current rows and a requested target and
//! return the writes to perform. Stores call them inside the same transaction
//! that read those rows, so the checks and the writes commit as one unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  claim::{Claim, ClaimId, ClaimStatus, ClaimSummary},
  item::{Item, ItemId, ItemStatus},
};

// ─── Transition tables ───────────────────────────────────────────────────────

/// What caused an item status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
  /// An administrator decision on the item itself.
  Review,
  /// Cascade from approving a claim on the item.
  ClaimApproval,
}

/// Every permitted item transition. Anything absent is invalid.
pub const ITEM_TRANSITIONS: &[(ItemStatus, ItemStatus, Trigger)] = &[
  (ItemStatus::PendingReview, ItemStatus::Approved, Trigger::Review),
  (ItemStatus::PendingReview, ItemStatus::Rejected, Trigger::Review),
  (ItemStatus::PendingReview, ItemStatus::Claimed, Trigger::ClaimApproval),
  (ItemStatus::Approved, ItemStatus::Claimed, Trigger::ClaimApproval),
];

/// Every permitted claim transition. Anything absent is invalid.
pub const CLAIM_TRANSITIONS: &[(ClaimStatus, ClaimStatus)] = &[
  (ClaimStatus::NewClaim, ClaimStatus::Approved),
  (ClaimStatus::NewClaim, ClaimStatus::Rejected),
];

impl ItemStatus {
  pub fn can_transition(self, to: ItemStatus, via: Trigger) -> bool {
    ITEM_TRANSITIONS
      .iter()
      .any(|&(from, target, trigger)| from == self && target == to && trigger == via)
  }

  /// Whether approving a claim may resolve an item in this status.
  pub fn accepts_claim_approval(self) -> bool {
    self.can_transition(ItemStatus::Claimed, Trigger::ClaimApproval)
  }

  /// Whether an administrator may name this status as an item decision.
  pub fn is_review_outcome(self) -> bool {
    ITEM_TRANSITIONS
      .iter()
      .any(|&(_, target, trigger)| target == self && trigger == Trigger::Review)
  }
}

impl ClaimStatus {
  pub fn can_transition(self, to: ClaimStatus) -> bool {
    CLAIM_TRANSITIONS
      .iter()
      .any(|&(from, target)| from == self && target == to)
  }

  /// Whether an administrator may name this status as a claim decision.
  pub fn is_review_outcome(self) -> bool {
    CLAIM_TRANSITIONS.iter().any(|&(_, target)| target == self)
  }
}

// ─── Planned writes ──────────────────────────────────────────────────────────

/// The full new state of an item row's mutable columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemUpdate {
  pub id:          ItemId,
  pub status:      ItemStatus,
  pub approved_at: Option<DateTime<Utc>>,
  pub claim_id:    Option<ClaimId>,
}

/// The full new state of a claim row's mutable columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimUpdate {
  pub id:          ClaimId,
  pub status:      ClaimStatus,
  pub reviewed_at: DateTime<Utc>,
}

/// Writes for a claim decision: the claim itself, plus the item cascade when
/// the claim is approved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimPlan {
  pub claim:   ClaimUpdate,
  pub cascade: Option<ItemUpdate>,
}

/// Result of a claim decision as returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimTransition {
  pub claim:    Claim,
  /// The referenced item after the decision.
  pub item:     Option<Item>,
  /// Whether the item was resolved to `Claimed` by this decision.
  pub cascaded: bool,
}

impl Item {
  /// Return this item with `update` applied.
  pub fn with_update(mut self, update: &ItemUpdate) -> Self {
    debug_assert_eq!(self.id, update.id);
    self.status = update.status;
    self.approved_at = update.approved_at;
    self.claim_id = update.claim_id;
    self
  }
}

impl Claim {
  /// Return this claim with `update` applied.
  pub fn with_update(mut self, update: &ClaimUpdate) -> Self {
    debug_assert_eq!(self.id, update.id);
    self.status = update.status;
    self.reviewed_at = Some(update.reviewed_at);
    self
  }
}

// ─── Planning ────────────────────────────────────────────────────────────────

/// Plan an administrator decision on an item.
///
/// Only `PendingReview` items can be decided, and only to `Approved` or
/// `Rejected`; re-deciding is refused so a `Claimed` item is never
/// overwritten. Approval stamps `approved_at` with `now`.
pub fn plan_item_review(
  item: &Item,
  target: ItemStatus,
  now: DateTime<Utc>,
) -> Result<ItemUpdate> {
  if !item.status.can_transition(target, Trigger::Review) {
    return Err(Error::InvalidItemTransition {
      id:   item.id,
      from: item.status,
      to:   target,
    });
  }

  Ok(ItemUpdate {
    id:          item.id,
    status:      target,
    approved_at: if target == ItemStatus::Approved { Some(now) } else { item.approved_at },
    claim_id:    item.claim_id,
  })
}

/// Plan an administrator decision on a claim.
///
/// `item` must be the referenced item as read inside the caller's
/// transaction; `None` means it no longer exists. Approval cascades the item
/// to `Claimed` and records the claim on it, and is refused if the item has
/// already been resolved or rejected.
pub fn plan_claim_review(
  claim: &Claim,
  item: Option<&Item>,
  target: ClaimStatus,
  now: DateTime<Utc>,
) -> Result<ClaimPlan> {
  if !claim.status.can_transition(target) {
    return Err(Error::InvalidClaimTransition {
      id:   claim.id,
      from: claim.status,
      to:   target,
    });
  }

  let item = item.ok_or(Error::ItemNotFound(claim.item_id))?;
  debug_assert_eq!(item.id, claim.item_id);

  let update = ClaimUpdate { id: claim.id, status: target, reviewed_at: now };

  if target != ClaimStatus::Approved {
    return Ok(ClaimPlan { claim: update, cascade: None });
  }

  if !item.status.accepts_claim_approval() {
    return Err(Error::ItemNotClaimable {
      claim_id: claim.id,
      item_id:  item.id,
      status:   item.status,
    });
  }

  Ok(ClaimPlan {
    claim:   update,
    cascade: Some(ItemUpdate {
      id:          item.id,
      status:      ItemStatus::Claimed,
      approved_at: item.approved_at,
      claim_id:    Some(claim.id),
    }),
  })
}

// ─── Dashboard & audit ───────────────────────────────────────────────────────

/// Everything an administrator reviews: all items and all claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
  /// Newest first by `created_at`.
  pub items:         Vec<Item>,
  /// Newest first by `submitted_at`.
  pub claims:        Vec<ClaimSummary>,
  /// Number of items in `PendingReview`.
  pub pending_items: usize,
  /// Number of claims in `NewClaim`.
  pub new_claims:    usize,
}

impl Dashboard {
  pub fn new(items: Vec<Item>, claims: Vec<ClaimSummary>) -> Self {
    let pending_items = items
      .iter()
      .filter(|i| i.status == ItemStatus::PendingReview)
      .count();
    let new_claims = claims
      .iter()
      .filter(|c| c.claim.status == ClaimStatus::NewClaim)
      .count();
    Self { items, claims, pending_items, new_claims }
  }
}

/// A violated cross-entity invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inconsistency {
  /// `Claimed` items need exactly one approved claim; others need none.
  ApprovedClaimCount { item_id: ItemId, status: ItemStatus, approved: usize },
  /// A `Claimed` item's `claim_id` does not name its approved claim.
  BackReference { item_id: ItemId, claim_id: Option<ClaimId> },
  MissingApprovalStamp { item_id: ItemId },
  /// `reviewed_at` must be set exactly when a claim has left `NewClaim`.
  ReviewStamp { claim_id: ClaimId },
  DanglingClaim { claim_id: ClaimId, item_id: ItemId },
}

/// Check the item/claim invariants over a full snapshot.
pub fn audit(dashboard: &Dashboard) -> Vec<Inconsistency> {
  let mut found = Vec::new();
  let claims: Vec<&Claim> = dashboard.claims.iter().map(|s| &s.claim).collect();

  for claim in &claims {
    if !dashboard.items.iter().any(|i| i.id == claim.item_id) {
      found.push(Inconsistency::DanglingClaim {
        claim_id: claim.id,
        item_id:  claim.item_id,
      });
    }
    if claim.reviewed_at.is_some() != (claim.status != ClaimStatus::NewClaim) {
      found.push(Inconsistency::ReviewStamp { claim_id: claim.id });
    }
  }

  for item in &dashboard.items {
    let approved: Vec<&&Claim> = claims
      .iter()
      .filter(|c| c.item_id == item.id && c.status == ClaimStatus::Approved)
      .collect();

    let expected = usize::from(item.status == ItemStatus::Claimed);
    if approved.len() != expected {
      found.push(Inconsistency::ApprovedClaimCount {
        item_id:  item.id,
        status:   item.status,
        approved: approved.len(),
      });
    }

    let back_ref_ok = match (item.status, approved.as_slice()) {
      (ItemStatus::Claimed, [only]) => item.claim_id == Some(only.id),
      _ => item.claim_id.is_none(),
    };
    if !back_ref_ok {
      found.push(Inconsistency::BackReference {
        item_id:  item.id,
        claim_id: item.claim_id,
      });
    }

    if item.status == ItemStatus::Approved && item.approved_at.is_none() {
      found.push(Inconsistency::MissingApprovalStamp { item_id: item.id });
    }
  }

  found
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;

  fn item(id: ItemId, status: ItemStatus) -> Item {
    Item {
      id,
      name: format!("item {id}"),
      description: "found near the fountain".into(),
      location_found: None,
      contact_info: "desk".into(),
      photo_url: None,
      date_found: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
      created_at: Utc::now(),
      approved_at: (status == ItemStatus::Approved).then(Utc::now),
      status,
      claim_id: None,
    }
  }

  fn claim(id: ClaimId, item_id: ItemId, status: ClaimStatus) -> Claim {
    Claim {
      id,
      item_id,
      claimer_name: "Sam".into(),
      claimer_email: "sam@example.com".into(),
      match_details: "scratch on the lid".into(),
      submitted_at: Utc::now(),
      reviewed_at: (status != ClaimStatus::NewClaim).then(Utc::now),
      status,
    }
  }

  fn summary(c: Claim, i: &Item) -> ClaimSummary {
    ClaimSummary { claim: c, item_name: i.name.clone(), item_status: i.status }
  }

  #[test]
  fn claimed_is_not_reachable_by_review() {
    assert!(!ItemStatus::PendingReview.can_transition(ItemStatus::Claimed, Trigger::Review));
    assert!(ItemStatus::PendingReview.can_transition(ItemStatus::Claimed, Trigger::ClaimApproval));
  }

  #[test]
  fn decisions_are_approve_or_reject() {
    assert!(ItemStatus::Approved.is_review_outcome());
    assert!(ItemStatus::Rejected.is_review_outcome());
    assert!(!ItemStatus::PendingReview.is_review_outcome());
    assert!(!ItemStatus::Claimed.is_review_outcome());

    assert!(ClaimStatus::Approved.is_review_outcome());
    assert!(ClaimStatus::Rejected.is_review_outcome());
    assert!(!ClaimStatus::NewClaim.is_review_outcome());
  }

  #[test]
  fn terminal_statuses() {
    let every = [
      ItemStatus::PendingReview,
      ItemStatus::Approved,
      ItemStatus::Rejected,
      ItemStatus::Claimed,
    ];
    for to in every {
      for via in [Trigger::Review, Trigger::ClaimApproval] {
        assert!(!ItemStatus::Rejected.can_transition(to, via));
        assert!(!ItemStatus::Claimed.can_transition(to, via));
      }
    }
  }

  #[test]
  fn approving_item_stamps_time() {
    let now = Utc::now();
    let i = item(1, ItemStatus::PendingReview);
    let update = plan_item_review(&i, ItemStatus::Approved, now).unwrap();
    assert_eq!(update.status, ItemStatus::Approved);
    assert_eq!(update.approved_at, Some(now));

    let rejected = plan_item_review(&i, ItemStatus::Rejected, now).unwrap();
    assert_eq!(rejected.approved_at, None);
  }

  #[test]
  fn item_review_requires_pending() {
    for status in [ItemStatus::Approved, ItemStatus::Rejected, ItemStatus::Claimed] {
      let i = item(1, status);
      let err = plan_item_review(&i, ItemStatus::Approved, Utc::now()).unwrap_err();
      assert!(matches!(err, Error::InvalidItemTransition { from, .. } if from == status));
    }
  }

  #[test]
  fn item_review_cannot_target_claimed() {
    let i = item(1, ItemStatus::PendingReview);
    assert!(plan_item_review(&i, ItemStatus::Claimed, Utc::now()).is_err());
  }

  #[test]
  fn claim_approval_cascades() {
    let i = item(4, ItemStatus::Approved);
    let c = claim(9, 4, ClaimStatus::NewClaim);
    let plan = plan_claim_review(&c, Some(&i), ClaimStatus::Approved, Utc::now()).unwrap();
    let cascade = plan.cascade.unwrap();
    assert_eq!(cascade.status, ItemStatus::Claimed);
    assert_eq!(cascade.claim_id, Some(9));
    assert_eq!(cascade.approved_at, i.approved_at);
  }

  #[test]
  fn claim_rejection_does_not_cascade() {
    let i = item(4, ItemStatus::Claimed);
    let c = claim(9, 4, ClaimStatus::NewClaim);
    let plan = plan_claim_review(&c, Some(&i), ClaimStatus::Rejected, Utc::now()).unwrap();
    assert!(plan.cascade.is_none());
  }

  #[test]
  fn claim_approval_refused_for_resolved_or_rejected_item() {
    for status in [ItemStatus::Claimed, ItemStatus::Rejected] {
      let i = item(4, status);
      let c = claim(9, 4, ClaimStatus::NewClaim);
      let err = plan_claim_review(&c, Some(&i), ClaimStatus::Approved, Utc::now()).unwrap_err();
      assert!(matches!(err, Error::ItemNotClaimable { .. }));
    }
  }

  #[test]
  fn claim_review_requires_new_claim() {
    let i = item(4, ItemStatus::Approved);
    let c = claim(9, 4, ClaimStatus::Rejected);
    let err = plan_claim_review(&c, Some(&i), ClaimStatus::Approved, Utc::now()).unwrap_err();
    assert!(matches!(err, Error::InvalidClaimTransition { .. }));
  }

  #[test]
  fn claim_review_needs_item() {
    let c = claim(9, 4, ClaimStatus::NewClaim);
    let err = plan_claim_review(&c, None, ClaimStatus::Approved, Utc::now()).unwrap_err();
    assert!(matches!(err, Error::ItemNotFound(4)));
  }

  #[test]
  fn audit_accepts_consistent_snapshot() {
    let mut claimed = item(1, ItemStatus::Claimed);
    claimed.claim_id = Some(10);
    let open = item(2, ItemStatus::Approved);
    let claims = vec![
      summary(claim(10, 1, ClaimStatus::Approved), &claimed),
      summary(claim(11, 1, ClaimStatus::Rejected), &claimed),
      summary(claim(12, 2, ClaimStatus::NewClaim), &open),
    ];
    let d = Dashboard::new(vec![claimed, open], claims);
    assert!(audit(&d).is_empty());
    assert_eq!(d.new_claims, 1);
    assert_eq!(d.pending_items, 0);
  }

  #[test]
  fn audit_flags_claimed_item_without_approved_claim() {
    let mut claimed = item(1, ItemStatus::Claimed);
    claimed.claim_id = Some(10);
    let claims = vec![summary(claim(10, 1, ClaimStatus::NewClaim), &claimed)];
    let found = audit(&Dashboard::new(vec![claimed], claims));
    assert!(found.contains(&Inconsistency::ApprovedClaimCount {
      item_id:  1,
      status:   ItemStatus::Claimed,
      approved: 0,
    }));
  }

  #[test]
  fn audit_flags_approved_claim_on_open_item() {
    let open = item(2, ItemStatus::Approved);
    let claims = vec![summary(claim(12, 2, ClaimStatus::Approved), &open)];
    let found = audit(&Dashboard::new(vec![open], claims));
    assert_eq!(found.len(), 1);
    assert!(matches!(found[0], Inconsistency::ApprovedClaimCount { approved: 1, .. }));
  }
}
