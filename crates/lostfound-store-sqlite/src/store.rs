//! [`SqliteStore`]: the SQLite implementation of [`RegistryStore`].

use std::{
  path::Path,
  sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
  },
  time::{Duration, Instant},
};

use chrono::Utc;
use rusqlite::{OptionalExtension as _, Transaction, TransactionBehavior};

use lostfound_core::{
  claim::{Claim, ClaimId, ClaimStatus},
  intake::{NewClaim, NewItem, Validated},
  item::{Item, ItemId, ItemStatus},
  lifecycle::{
    ClaimTransition, ClaimUpdate, Dashboard, ItemUpdate, plan_claim_review,
    plan_item_review,
  },
  store::{FoundOrder, ItemQuery, RegistryStore},
};

use crate::{
  Error, Result,
  encode::{
    CLAIM_COLUMNS, ITEM_COLUMNS, RawClaim, RawClaimSummary, RawItem, encode_date,
    encode_dt,
  },
  schema::SCHEMA,
};

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_LIST_LIMIT: usize = 100;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A registry store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn:         tokio_rusqlite::Connection,
  write_budget: Duration,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  ///
  /// `busy_timeout` bounds how long a write waits for a lock held by another
  /// connection before failing as `StoreUnavailable`. It is also the initial
  /// write budget; see [`SqliteStore::with_write_budget`].
  pub async fn open(path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, write_budget: busy_timeout };
    store.init(busy_timeout).await?;
    Ok(store)
  }

  /// Open a private in-memory store. Used by tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, write_budget: DEFAULT_BUSY_TIMEOUT };
    store.init(DEFAULT_BUSY_TIMEOUT).await?;
    Ok(store)
  }

  /// Bound every write call to `budget`, measured from when the call is
  /// issued. A write that only obtains the write lock after its budget has
  /// run out rolls back and fails as `StoreUnavailable`, as does a write whose
  /// caller stopped waiting for it.
  pub fn with_write_budget(mut self, budget: Duration) -> Self {
    self.write_budget = budget;
    self
  }

  fn write_ticket(&self) -> (WriteTicket, AbandonOnDrop) {
    let abandoned = Arc::new(AtomicBool::new(false));
    let ticket = WriteTicket {
      deadline:  Instant::now() + self.write_budget,
      abandoned: abandoned.clone(),
    };
    (ticket, AbandonOnDrop(abandoned))
  }

  async fn init(&self, busy_timeout: Duration) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.busy_timeout(busy_timeout)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run raw SQL against the connection, bypassing every rule. Tests use it
  /// to simulate out-of-band changes.
  #[cfg(test)]
  pub(crate) async fn execute_raw(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Write tickets ───────────────────────────────────────────────────────────

/// Limits for one write call. Checked on the connection thread once the
/// transaction holds the write lock, and again right before commit.
struct WriteTicket {
  deadline:  Instant,
  abandoned: Arc<AtomicBool>,
}

impl WriteTicket {
  fn check(&self) -> Result<()> {
    let reason = if self.abandoned.load(Ordering::Acquire) {
      "caller stopped waiting before the write ran"
    } else if Instant::now() >= self.deadline {
      "write budget ran out before the write could commit"
    } else {
      return Ok(());
    };
    tracing::warn!(reason, "abandoning write; rolling back");
    Err(lostfound_core::Error::StoreUnavailable(reason.to_owned()).into())
  }
}

/// Flags its ticket as abandoned when the future that issued the write is
/// dropped, so a queued write does not commit after its caller gave up.
struct AbandonOnDrop(Arc<AtomicBool>);

impl Drop for AbandonOnDrop {
  fn drop(&mut self) { self.0.store(true, Ordering::Release); }
}

fn begin_write<'c>(
  conn: &'c mut rusqlite::Connection,
  ticket: &WriteTicket,
) -> Result<Transaction<'c>> {
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
  ticket.check()?;
  Ok(tx)
}

fn commit_write(tx: Transaction<'_>, ticket: &WriteTicket) -> Result<()> {
  ticket.check()?;
  tx.commit()?;
  Ok(())
}

// ─── Row access (runs on the connection thread) ──────────────────────────────

fn select_item(conn: &rusqlite::Connection, id: ItemId) -> Result<Option<Item>> {
  conn
    .query_row(
      &format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1"),
      rusqlite::params![id],
      |row| RawItem::from_row(row, 0),
    )
    .optional()?
    .map(RawItem::into_item)
    .transpose()
}

fn select_claim(conn: &rusqlite::Connection, id: ClaimId) -> Result<Option<Claim>> {
  conn
    .query_row(
      &format!("SELECT {CLAIM_COLUMNS} FROM claims WHERE id = ?1"),
      rusqlite::params![id],
      RawClaim::from_row,
    )
    .optional()?
    .map(RawClaim::into_claim)
    .transpose()
}

fn write_item_update(
  conn: &rusqlite::Connection,
  update: &ItemUpdate,
) -> rusqlite::Result<usize> {
  conn.execute(
    "UPDATE items SET status = ?1, approved_at = ?2, claim_id = ?3 WHERE id = ?4",
    rusqlite::params![
      update.status.as_str(),
      update.approved_at.map(encode_dt),
      update.claim_id,
      update.id,
    ],
  )
}

fn write_claim_update(
  conn: &rusqlite::Connection,
  update: &ClaimUpdate,
) -> rusqlite::Result<usize> {
  conn.execute(
    "UPDATE claims SET status = ?1, reviewed_at = ?2 WHERE id = ?3",
    rusqlite::params![update.status.as_str(), encode_dt(update.reviewed_at), update.id],
  )
}

/// Read, plan, and write an item decision inside one immediate transaction.
fn review_item(
  conn: &mut rusqlite::Connection,
  id: ItemId,
  target: ItemStatus,
  ticket: &WriteTicket,
) -> Result<Item> {
  let tx = begin_write(conn, ticket)?;

  let item = select_item(&tx, id)?.ok_or(lostfound_core::Error::ItemNotFound(id))?;
  let update = plan_item_review(&item, target, Utc::now())?;
  write_item_update(&tx, &update)?;

  commit_write(tx, ticket)?;
  Ok(item.with_update(&update))
}

/// Read, plan, and write a claim decision and its item cascade inside one
/// immediate transaction.
///
/// The item is re-read here rather than trusted from any earlier request, so
/// two approvals racing for the same item serialise on the write lock and the
/// second one sees `Claimed`. Returning early drops `tx`, which rolls back
/// every write made so far.
fn review_claim(
  conn: &mut rusqlite::Connection,
  id: ClaimId,
  target: ClaimStatus,
  ticket: &WriteTicket,
) -> Result<ClaimTransition> {
  let tx = begin_write(conn, ticket)?;

  let claim = select_claim(&tx, id)?.ok_or(lostfound_core::Error::ClaimNotFound(id))?;
  let item = select_item(&tx, claim.item_id)?;
  let plan = plan_claim_review(&claim, item.as_ref(), target, Utc::now())?;

  write_claim_update(&tx, &plan.claim)?;

  let item = match (&plan.cascade, item) {
    (Some(update), Some(item)) => match write_item_update(&tx, update) {
      Ok(1) => Some(item.with_update(update)),
      Ok(_) => return Err(lostfound_core::Error::ItemNotFound(update.id).into()),
      Err(e) => {
        tracing::warn!(
          claim_id = id,
          item_id = update.id,
          error = %e,
          "claim cascade failed; rolling back"
        );
        return Err(
          lostfound_core::Error::CascadeFailure {
            item_id: update.id,
            reason:  e.to_string(),
          }
          .into(),
        );
      }
    },
    (_, item) => item,
  };

  commit_write(tx, ticket)?;

  Ok(ClaimTransition {
    claim: claim.with_update(&plan.claim),
    cascaded: plan.cascade.is_some(),
    item,
  })
}

/// Insert a claim after confirming its item exists, in one transaction.
fn insert_claim(
  conn: &mut rusqlite::Connection,
  input: &NewClaim,
  submitted_at: &str,
  ticket: &WriteTicket,
) -> Result<ClaimId> {
  let tx = begin_write(conn, ticket)?;

  let exists = tx
    .query_row(
      "SELECT 1 FROM items WHERE id = ?1",
      rusqlite::params![input.item_id],
      |_| Ok(()),
    )
    .optional()?
    .is_some();
  if !exists {
    return Err(lostfound_core::Error::ItemNotFound(input.item_id).into());
  }

  tx.execute(
    "INSERT INTO claims (item_id, claimer_name, claimer_email, match_details, submitted_at, status)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    rusqlite::params![
      input.item_id,
      input.claimer_name,
      input.claimer_email,
      input.match_details,
      submitted_at,
      ClaimStatus::NewClaim.as_str(),
    ],
  )?;
  let id = tx.last_insert_rowid();

  commit_write(tx, ticket)?;
  Ok(id)
}

fn insert_item(
  conn: &mut rusqlite::Connection,
  input: &NewItem,
  date_found: &str,
  created_at: &str,
  ticket: &WriteTicket,
) -> Result<ItemId> {
  let tx = begin_write(conn, ticket)?;

  tx.execute(
    "INSERT INTO items (
       name, description, location_found, contact_info, photo_url,
       date_found, created_at, status
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    rusqlite::params![
      input.name,
      input.description,
      input.location_found,
      input.contact_info,
      input.photo_url,
      date_found,
      created_at,
      ItemStatus::PendingReview.as_str(),
    ],
  )?;
  let id = tx.last_insert_rowid();

  commit_write(tx, ticket)?;
  Ok(id)
}

/// Escape `LIKE` wildcards so user text matches literally.
fn like_pattern(text: &str) -> String {
  let mut escaped = String::with_capacity(text.len() + 2);
  escaped.push('%');
  for c in text.chars() {
    if matches!(c, '%' | '_' | '\\') {
      escaped.push('\\');
    }
    escaped.push(c);
  }
  escaped.push('%');
  escaped
}

// ─── RegistryStore impl ──────────────────────────────────────────────────────

impl RegistryStore for SqliteStore {
  type Error = Error;

  // ── Intake ────────────────────────────────────────────────────────────────

  async fn create_item(&self, input: Validated<NewItem>) -> Result<Item> {
    let input      = input.into_inner();
    let created_at = Utc::now();
    let date_found = input.date_found.unwrap_or_else(|| created_at.date_naive());

    let row         = input.clone();
    let date_str    = encode_date(date_found);
    let created_str = encode_dt(created_at);

    let (ticket, _guard) = self.write_ticket();
    let id = self
      .conn
      .call(move |conn| Ok(insert_item(conn, &row, &date_str, &created_str, &ticket)))
      .await??;

    Ok(Item {
      id,
      name: input.name,
      description: input.description,
      location_found: input.location_found,
      contact_info: input.contact_info,
      photo_url: input.photo_url,
      date_found,
      created_at,
      approved_at: None,
      status: ItemStatus::PendingReview,
      claim_id: None,
    })
  }

  async fn create_claim(&self, input: Validated<NewClaim>) -> Result<Claim> {
    let input        = input.into_inner();
    let submitted_at = Utc::now();
    let row          = input.clone();
    let at_str       = encode_dt(submitted_at);

    let (ticket, _guard) = self.write_ticket();
    let id = self
      .conn
      .call(move |conn| Ok(insert_claim(conn, &row, &at_str, &ticket)))
      .await??;

    Ok(Claim {
      id,
      item_id: input.item_id,
      claimer_name: input.claimer_name,
      claimer_email: input.claimer_email,
      match_details: input.match_details,
      submitted_at,
      reviewed_at: None,
      status: ClaimStatus::NewClaim,
    })
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn get_item(&self, id: ItemId) -> Result<Option<Item>> {
    self.conn.call(move |conn| Ok(select_item(conn, id))).await?
  }

  async fn get_claim(&self, id: ClaimId) -> Result<Option<Claim>> {
    self.conn.call(move |conn| Ok(select_claim(conn, id))).await?
  }

  async fn list_items(&self, query: &ItemQuery) -> Result<Vec<Item>> {
    let pattern = query
      .text
      .as_deref()
      .map(str::trim)
      .filter(|t| !t.is_empty())
      .map(like_pattern);
    let direction = match query.sort {
      FoundOrder::Newest => "DESC",
      FoundOrder::Oldest => "ASC",
    };
    // SQLite reads a negative OFFSET as zero, so saturate instead of wrapping.
    let limit_val  = i64::try_from(query.limit.unwrap_or(DEFAULT_LIST_LIMIT)).unwrap_or(i64::MAX);
    let offset_val = i64::try_from(query.offset.unwrap_or(0)).unwrap_or(i64::MAX);

    let raws: Vec<RawItem> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {ITEM_COLUMNS}
           FROM items
           WHERE status = ?1
             AND (?2 IS NULL
                  OR name        LIKE ?2 ESCAPE '\\'
                  OR description LIKE ?2 ESCAPE '\\')
           ORDER BY date_found {direction}, id {direction}
           LIMIT ?3 OFFSET ?4"
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![
              ItemStatus::Approved.as_str(),
              pattern.as_deref(),
              limit_val,
              offset_val,
            ],
            |row| RawItem::from_row(row, 0),
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawItem::into_item).collect()
  }

  async fn dashboard(&self) -> Result<Dashboard> {
    let (raw_items, raw_claims): (Vec<RawItem>, Vec<RawClaimSummary>) = self
      .conn
      .call(|conn| {
        // One read transaction so items and claims come from the same snapshot.
        let tx = conn.transaction()?;

        let items = tx
          .prepare(&format!(
            "SELECT {ITEM_COLUMNS} FROM items ORDER BY created_at DESC, id DESC"
          ))?
          .query_map([], |row| RawItem::from_row(row, 0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let claims = tx
          .prepare(
            "SELECT
               c.id, c.item_id, c.claimer_name, c.claimer_email,
               c.match_details, c.submitted_at, c.reviewed_at, c.status,
               i.name   AS item_name,
               i.status AS item_status
             FROM claims c
             JOIN items i ON i.id = c.item_id
             ORDER BY c.submitted_at DESC, c.id DESC",
          )?
          .query_map([], |row| {
            Ok(RawClaimSummary {
              claim:       RawClaim::from_row(row)?,
              item_name:   row.get(8)?,
              item_status: row.get(9)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        tx.commit()?;
        Ok((items, claims))
      })
      .await?;

    let items = raw_items
      .into_iter()
      .map(RawItem::into_item)
      .collect::<Result<Vec<_>>>()?;
    let claims = raw_claims
      .into_iter()
      .map(RawClaimSummary::into_summary)
      .collect::<Result<Vec<_>>>()?;

    Ok(Dashboard::new(items, claims))
  }

  // ── Transitions ───────────────────────────────────────────────────────────

  async fn transition_item(&self, id: ItemId, target: ItemStatus) -> Result<Item> {
    let (ticket, _guard) = self.write_ticket();
    self
      .conn
      .call(move |conn| Ok(review_item(conn, id, target, &ticket)))
      .await?
  }

  async fn transition_claim(
    &self,
    id: ClaimId,
    target: ClaimStatus,
  ) -> Result<ClaimTransition> {
    let (ticket, _guard) = self.write_ticket();
    self
      .conn
      .call(move |conn| Ok(review_claim(conn, id, target, &ticket)))
      .await?
  }
}
