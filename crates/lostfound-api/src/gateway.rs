//! Admin review gateway: every `/admin` request must present the admin key.
//!
//! The key may arrive as an `X-Admin-Key` header, as `Authorization: Bearer
//! <key>`, or as an `admin_key` query parameter (older clients). Only its
//! argon2 hash is held in memory.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  extract::{FromRequestParts, Query},
  http::{header, request::Parts},
};
use lostfound_core::store::RegistryStore;
use rand_core::OsRng;
use serde::Deserialize;

use crate::{ApiState, error::ApiError};

/// Header carrying the admin key.
pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// Verifies the admin key presented by a request against a stored hash.
#[derive(Debug, Clone)]
pub struct AdminGateway {
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  key_hash: String,
}

impl AdminGateway {
  /// Build a gateway, rejecting a hash that is not a valid PHC string.
  pub fn new(key_hash: impl Into<String>) -> Result<Self, argon2::password_hash::Error> {
    let key_hash = key_hash.into();
    PasswordHash::new(&key_hash)?;
    Ok(Self { key_hash })
  }

  /// Hash `key` with a fresh salt, producing a value for `admin_key_hash`.
  pub fn hash_key(key: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default().hash_password(key.as_bytes(), &salt)?.to_string())
  }

  pub fn verify(&self, presented: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(&self.key_hash) else {
      return false;
    };
    Argon2::default()
      .verify_password(presented.as_bytes(), &parsed)
      .is_ok()
  }

  /// Check the credential carried by a request.
  pub fn authorize(&self, parts: &Parts) -> Result<(), lostfound_core::Error> {
    let Some(presented) = presented_key(parts) else {
      tracing::warn!(path = %parts.uri.path(), "admin request without a key");
      return Err(lostfound_core::Error::Unauthorized);
    };

    if !self.verify(&presented) {
      tracing::warn!(path = %parts.uri.path(), "admin request with a wrong key");
      return Err(lostfound_core::Error::Unauthorized);
    }

    Ok(())
  }
}

#[derive(Deserialize)]
struct KeyParam {
  admin_key: Option<String>,
}

/// Pull the admin key out of a request, in header, bearer, query order.
fn presented_key(parts: &Parts) -> Option<String> {
  let header_key = parts
    .headers
    .get(ADMIN_KEY_HEADER)
    .and_then(|v| v.to_str().ok())
    .map(str::to_owned);

  let bearer_key = || {
    parts
      .headers
      .get(header::AUTHORIZATION)
      .and_then(|v| v.to_str().ok())
      .and_then(|v| v.strip_prefix("Bearer "))
      .map(|v| v.trim().to_owned())
  };

  let query_key = || {
    Query::<KeyParam>::try_from_uri(&parts.uri)
      .ok()
      .and_then(|Query(p)| p.admin_key)
  };

  header_key
    .or_else(bearer_key)
    .or_else(query_key)
    .filter(|k| !k.is_empty())
}

// ─── Extractor ───────────────────────────────────────────────────────────────

/// Zero-size marker: present in a handler means the request was authorised.
pub struct AdminAccess;

impl<S> FromRequestParts<ApiState<S>> for AdminAccess
where
  S: RegistryStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &ApiState<S>,
  ) -> Result<Self, Self::Rejection> {
    state.gateway.authorize(parts)?;
    Ok(AdminAccess)
  }
}

#[cfg(test)]
mod tests {
  use argon2::{Algorithm, Params, Version};
  use axum::http::Request;

  use super::*;

  /// Low-cost parameters keep the tests quick; verification reads them back
  /// out of the PHC string.
  fn gateway() -> AdminGateway {
    let params = Params::new(1024, 1, 1, None).unwrap();
    let salt   = SaltString::generate(&mut OsRng);
    let hash   = Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
      .hash_password(b"hunter2", &salt)
      .unwrap()
      .to_string();
    AdminGateway::new(hash).unwrap()
  }

  fn parts(builder: axum::http::request::Builder) -> Parts {
    builder.body(()).unwrap().into_parts().0
  }

  #[test]
  fn hashed_key_verifies() {
    let g = AdminGateway::new(AdminGateway::hash_key("hunter2").unwrap()).unwrap();
    assert!(g.verify("hunter2"));
    assert!(!g.verify("hunter3"));
  }

  #[test]
  fn rejects_malformed_hash() {
    assert!(AdminGateway::new("not-a-phc-string").is_err());
  }

  #[test]
  fn accepts_key_from_each_source() {
    let g = gateway();
    let header = parts(Request::builder().uri("/admin/data").header("X-Admin-Key", "hunter2"));
    let bearer = parts(
      Request::builder()
        .uri("/admin/data")
        .header("Authorization", "Bearer hunter2"),
    );
    let query = parts(Request::builder().uri("/admin/data?admin_key=hunter2"));

    for p in [header, bearer, query] {
      assert!(g.authorize(&p).is_ok());
    }
  }

  #[test]
  fn rejects_missing_or_wrong_key() {
    let g = gateway();
    let missing = parts(Request::builder().uri("/admin/data"));
    let wrong = parts(Request::builder().uri("/admin/data").header("X-Admin-Key", "guess"));
    let empty = parts(Request::builder().uri("/admin/data?admin_key="));

    for p in [missing, wrong, empty] {
      assert!(matches!(g.authorize(&p), Err(lostfound_core::Error::Unauthorized)));
    }
  }
}
