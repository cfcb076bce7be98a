//! Error type for `lostfound-store-sqlite`.

use lostfound_core::{Classify, ErrorKind};
use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] lostfound_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A column held a value outside its domain (e.g. an unknown status).
  #[error("decode error: {0}")]
  Decode(String),
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Error::Core(e) => e.kind(),
      Error::Database(tokio_rusqlite::Error::Rusqlite(e)) | Error::Sqlite(e) => {
        sqlite_kind(e)
      }
      Error::Database(tokio_rusqlite::Error::ConnectionClosed) => {
        ErrorKind::StoreUnavailable
      }
      Error::Database(_) | Error::DateParse(_) | Error::Decode(_) => ErrorKind::Internal,
    }
  }
}

fn sqlite_kind(e: &rusqlite::Error) -> ErrorKind {
  match e.sqlite_error_code() {
    Some(
      ErrorCode::DatabaseBusy
      | ErrorCode::DatabaseLocked
      | ErrorCode::CannotOpen
      | ErrorCode::SystemIoFailure,
    ) => ErrorKind::StoreUnavailable,
    _ => ErrorKind::Internal,
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn busy_and_closed_are_retryable() {
    let busy = Error::Sqlite(rusqlite::Error::SqliteFailure(
      rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
      None,
    ));
    assert_eq!(busy.kind(), ErrorKind::StoreUnavailable);
    assert!(busy.kind().is_retryable());

    let closed = Error::Database(tokio_rusqlite::Error::ConnectionClosed);
    assert_eq!(closed.kind(), ErrorKind::StoreUnavailable);
  }

  #[test]
  fn constraint_failures_are_internal() {
    let err = Error::Sqlite(rusqlite::Error::SqliteFailure(
      rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CONSTRAINT),
      None,
    ));
    assert_eq!(err.kind(), ErrorKind::Internal);
  }

  #[test]
  fn core_errors_keep_their_kind() {
    let err = Error::from(lostfound_core::Error::ItemNotFound(3));
    assert_eq!(err.kind(), ErrorKind::NotFound);
  }
}
