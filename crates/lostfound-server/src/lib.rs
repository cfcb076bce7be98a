//! Lost-and-found registry server: configuration and the top-level router.
//!
//! The binary in `main.rs` loads a [`ServerConfig`], opens the SQLite store,
//! and serves [`app`].

use std::{path::PathBuf, time::Duration};

use axum::{BoxError, Router, error_handling::HandleErrorLayer};
use lostfound_api::{ApiError, ApiState, api_router};
use lostfound_core::{ErrorKind, store::RegistryStore};
use serde::Deserialize;
use tower::{ServiceBuilder, timeout::TimeoutLayer};
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `LOSTFOUND_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                 String,
  #[serde(default = "default_port")]
  pub port:                 u16,
  #[serde(default = "default_store_path")]
  pub store_path:           PathBuf,
  /// argon2 PHC string of the admin key; generate with `server --hash-key`.
  pub admin_key_hash:       String,
  #[serde(default = "default_request_timeout")]
  pub request_timeout_secs: u64,
  #[serde(default = "default_busy_timeout")]
  pub busy_timeout_ms:      u64,
}

fn default_host() -> String { "127.0.0.1".to_owned() }
fn default_port() -> u16 { 3000 }
fn default_store_path() -> PathBuf { PathBuf::from("lostfound.db") }
fn default_request_timeout() -> u64 { 10 }
fn default_busy_timeout() -> u64 { 5000 }

impl ServerConfig {
  pub fn request_timeout(&self) -> Duration {
    Duration::from_secs(self.request_timeout_secs)
  }

  pub fn busy_timeout(&self) -> Duration {
    Duration::from_millis(self.busy_timeout_ms)
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  /// Reject settings under which a store write could outlive its request.
  pub fn validate(&self) -> anyhow::Result<()> {
    anyhow::ensure!(
      self.busy_timeout() < self.request_timeout(),
      "busy_timeout_ms ({}) must be shorter than request_timeout_secs ({}s)",
      self.busy_timeout_ms,
      self.request_timeout_secs,
    );
    Ok(())
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The full application: the API under `/api`, with request tracing and a
/// per-request timeout.
pub fn app<S>(state: ApiState<S>, request_timeout: Duration) -> Router
where
  S: RegistryStore + 'static,
{
  Router::new()
    .nest("/api", api_router(state))
    .layer(
      ServiceBuilder::new()
        .layer(HandleErrorLayer::new(middleware_error))
        .layer(TimeoutLayer::new(request_timeout)),
    )
    .layer(TraceLayer::new_for_http())
}

/// A request that runs out of time is reported like any other store outage.
async fn middleware_error(err: BoxError) -> ApiError {
  if err.is::<tower::timeout::error::Elapsed>() {
    lostfound_core::Error::StoreUnavailable("request timed out".to_owned()).into()
  } else {
    ApiError::Store { kind: ErrorKind::Internal, source: err }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use argon2::{
    Algorithm, Argon2, Params, PasswordHasher, Version, password_hash::SaltString,
  };
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use lostfound_api::AdminGateway;
  use lostfound_core::{intake::NewItem, item::ItemStatus};
  use lostfound_store_sqlite::SqliteStore;
  use rand_core::OsRng;
  use serde_json::Value;
  use tower::ServiceExt as _;

  const HASH: &str =
    "$argon2id$v=19$m=1024,t=1,p=1$c29tZXNhbHRzb21lc2FsdA$Hk0jgl5Qk7W0dUJ1NwVSt6vlR0bNw3FmMNKmKfMw1tI";

  fn settings(toml: &str) -> config::Config {
    config::Config::builder()
      .add_source(config::File::from_str(toml, config::FileFormat::Toml))
      .build()
      .unwrap()
  }

  #[test]
  fn config_fills_defaults() {
    let cfg: ServerConfig = settings(&format!("admin_key_hash = '{HASH}'"))
      .try_deserialize()
      .unwrap();
    assert_eq!(cfg.port, 3000);
    assert_eq!(cfg.request_timeout(), Duration::from_secs(10));
    assert_eq!(cfg.busy_timeout(), Duration::from_millis(5000));
    assert_eq!(cfg.address(), "127.0.0.1:3000");
  }

  #[test]
  fn busy_timeout_must_undercut_request_timeout() {
    let cfg: ServerConfig = settings(&format!(
      "admin_key_hash = '{HASH}'\nrequest_timeout_secs = 2\nbusy_timeout_ms = 2000"
    ))
    .try_deserialize()
    .unwrap();
    assert!(cfg.validate().is_err());

    let cfg = ServerConfig { busy_timeout_ms: 1500, ..cfg };
    assert!(cfg.validate().is_ok());
  }

  #[test]
  fn config_requires_admin_key_hash() {
    let result = settings("port = 8080").try_deserialize::<ServerConfig>();
    assert!(result.is_err());
  }

  #[tokio::test]
  async fn api_is_nested_under_prefix() {
    let store   = SqliteStore::open_in_memory().await.unwrap();
    let gateway = AdminGateway::new(HASH).unwrap();
    let app     = app(ApiState::new(store, gateway), Duration::from_secs(5));

    let resp = app
      .clone()
      .oneshot(Request::get("/api/items").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
      .oneshot(Request::get("/items").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn timed_out_review_is_retryable_and_not_committed() {
    let path = std::env::temp_dir().join(format!(
      "lostfound-timeout-{}-{}.db",
      std::process::id(),
      std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default()
    ));
    let store = SqliteStore::open(&path, Duration::from_secs(5)).await.unwrap();
    let item = store
      .create_item(
        NewItem {
          name: "Thermos".into(),
          description: "Steel, dented lid".into(),
          location_found: None,
          contact_info: "front office".into(),
          photo_url: None,
          date_found: None,
        }
        .validate()
        .unwrap(),
      )
      .await
      .unwrap();

    let key  = "open sesame";
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::new(
      Algorithm::Argon2id,
      Version::V0x13,
      Params::new(1024, 1, 1, None).unwrap(),
    )
    .hash_password(key.as_bytes(), &salt)
    .unwrap()
    .to_string();
    let gateway = AdminGateway::new(hash).unwrap();
    let app = app(
      ApiState::new(store.clone(), gateway),
      Duration::from_millis(100),
    );

    // A second connection holds the write lock past the request timeout.
    let holder = rusqlite::Connection::open(&path).unwrap();
    holder.execute_batch("BEGIN IMMEDIATE").unwrap();
    let holder = tokio::task::spawn_blocking(move || {
      std::thread::sleep(Duration::from_millis(400));
      holder.execute_batch("COMMIT").unwrap();
    });

    let request = Request::put(format!("/api/admin/item/{}", item.id))
      .header("X-Admin-Key", key)
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(r#"{"status":"approved"}"#))
      .unwrap();
    let resp = app.oneshot(request).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["kind"], "store_unavailable");
    assert_eq!(body["retryable"], true);

    holder.await.unwrap();
    // Queued behind the abandoned write on the same connection thread.
    let stored = store.get_item(item.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ItemStatus::PendingReview);

    drop(store);
    for suffix in ["", "-wal", "-shm"] {
      let mut p = path.clone().into_os_string();
      p.push(suffix);
      let _ = std::fs::remove_file(p);
    }
  }
}
