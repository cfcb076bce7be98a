//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every failure is rendered as `{"error": <message>, "kind": <kind>,
//! "retryable": <bool>}` with a status code chosen from its [`ErrorKind`].

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection, QueryRejection},
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use lostfound_core::{Classify, ErrorKind};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Core(#[from] lostfound_core::Error),

  /// The request could not be decoded (bad JSON, bad query, bad path).
  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("{source}")]
  Store {
    kind:   ErrorKind,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },
}

impl ApiError {
  /// Wrap a backend error, keeping its classification.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Classify + Send + Sync + 'static,
  {
    ApiError::Store { kind: e.kind(), source: Box::new(e) }
  }
}

impl Classify for ApiError {
  fn kind(&self) -> ErrorKind {
    match self {
      ApiError::Core(e) => e.kind(),
      ApiError::BadRequest(_) => ErrorKind::Validation,
      ApiError::Store { kind, .. } => *kind,
    }
  }
}

/// HTTP status for an error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
  match kind {
    ErrorKind::Validation => StatusCode::BAD_REQUEST,
    ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
    ErrorKind::NotFound => StatusCode::NOT_FOUND,
    ErrorKind::InvalidTransition => StatusCode::CONFLICT,
    ErrorKind::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
    ErrorKind::CascadeFailure | ErrorKind::Internal => {
      StatusCode::INTERNAL_SERVER_ERROR
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let kind   = self.kind();
    let status = status_for(kind);

    let message = match kind {
      ErrorKind::Internal => {
        tracing::error!(error = %self, "internal error");
        "internal error".to_owned()
      }
      ErrorKind::CascadeFailure | ErrorKind::StoreUnavailable => {
        tracing::error!(error = %self, %kind, "request failed");
        self.to_string()
      }
      _ => self.to_string(),
    };

    let body = Json(json!({
      "error":     message,
      "kind":      kind,
      "retryable": kind.is_retryable(),
    }));

    let mut response = (status, body).into_response();
    if kind == ErrorKind::Unauthorized {
      response
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    }
    response
  }
}

// ─── Extractor rejections ────────────────────────────────────────────────────

impl From<JsonRejection> for ApiError {
  fn from(r: JsonRejection) -> Self { ApiError::BadRequest(r.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(r: QueryRejection) -> Self { ApiError::BadRequest(r.body_text()) }
}

impl From<PathRejection> for ApiError {
  fn from(r: PathRejection) -> Self { ApiError::BadRequest(r.body_text()) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn statuses_follow_kind() {
    let cases = [
      (lostfound_core::Error::Validation(vec!["x".into()]), 400),
      (lostfound_core::Error::ItemNotFound(1), 404),
      (lostfound_core::Error::Unauthorized, 401),
      (lostfound_core::Error::StoreUnavailable("busy".into()), 503),
      (
        lostfound_core::Error::CascadeFailure { item_id: 1, reason: "x".into() },
        500,
      ),
    ];
    for (err, code) in cases {
      let resp = ApiError::from(err).into_response();
      assert_eq!(resp.status().as_u16(), code);
    }
  }

  #[test]
  fn unauthorized_carries_challenge() {
    let resp = ApiError::from(lostfound_core::Error::Unauthorized).into_response();
    assert_eq!(resp.headers()[header::WWW_AUTHENTICATE], "Bearer");
  }
}
