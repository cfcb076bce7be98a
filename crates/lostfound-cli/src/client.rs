//! Async HTTP client wrapping the registry JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use lostfound_core::{
  claim::{Claim, ClaimId, ClaimStatus},
  item::{Item, ItemId, ItemStatus},
  lifecycle::Dashboard,
  store::FoundOrder,
};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

/// Header the server's admin gateway reads the key from.
const ADMIN_KEY_HEADER: &str = "X-Admin-Key";

/// Connection settings for the registry API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url:  String,
  pub admin_key: String,
}

/// Async HTTP client for the registry JSON REST API.
///
/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

// ─── Response bodies ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct ClaimCreated {
  pub message: String,
  pub claim:   Claim,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ItemDecided {
  pub message: String,
  pub item:    Item,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClaimDecided {
  pub message:  String,
  pub claim:    Claim,
  pub item:     Option<Item>,
  pub cascaded: bool,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
  error:     String,
  kind:      String,
  #[serde(default)]
  retryable: bool,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!(
      "{}/api{}",
      self.config.base_url.trim_end_matches('/'),
      path
    )
  }

  fn admin(&self, req: RequestBuilder) -> Result<RequestBuilder> {
    if self.config.admin_key.is_empty() {
      return Err(anyhow!(
        "this command needs the admin key (--admin-key or LOSTFOUND_ADMIN_KEY)"
      ));
    }
    Ok(req.header(ADMIN_KEY_HEADER, &self.config.admin_key))
  }

  /// Decode a success body, or turn the server's error JSON into a message.
  async fn decode<T: DeserializeOwned>(what: &str, resp: Response) -> Result<T> {
    let status = resp.status();
    if status.is_success() {
      return resp.json().await.with_context(|| format!("deserialising {what}"));
    }

    let text = resp.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorBody>(&text) {
      Ok(body) => {
        let hint = if body.retryable { " (retryable)" } else { "" };
        Err(anyhow!("{what} → {status} [{}]: {}{hint}", body.kind, body.error))
      }
      Err(_) => Err(anyhow!("{what} → {status}")),
    }
  }

  // ── Public ────────────────────────────────────────────────────────────────

  /// `POST /api/items`
  pub async fn report_item(&self, body: &Value) -> Result<Item> {
    let resp = self
      .client
      .post(self.url("/items"))
      .json(body)
      .send()
      .await
      .context("POST /items failed")?;
    Self::decode("POST /items", resp).await
  }

  /// `GET /api/items[?query=..][&sort=..][&limit=..]`
  pub async fn list_items(
    &self,
    query: Option<&str>,
    sort: FoundOrder,
    limit: Option<usize>,
  ) -> Result<Vec<Item>> {
    let sort = match sort {
      FoundOrder::Newest => "newest",
      FoundOrder::Oldest => "oldest",
    };
    let mut params = vec![("sort", sort.to_owned())];
    if let Some(q) = query {
      params.push(("query", q.to_owned()));
    }
    if let Some(n) = limit {
      params.push(("limit", n.to_string()));
    }

    let resp = self
      .client
      .get(self.url("/items"))
      .query(&params)
      .send()
      .await
      .context("GET /items failed")?;
    Self::decode("GET /items", resp).await
  }

  /// `POST /api/claims`
  pub async fn submit_claim(&self, body: &Value) -> Result<ClaimCreated> {
    let resp = self
      .client
      .post(self.url("/claims"))
      .json(body)
      .send()
      .await
      .context("POST /claims failed")?;
    Self::decode("POST /claims", resp).await
  }

  // ── Admin ─────────────────────────────────────────────────────────────────

  /// `GET /api/admin/data`
  pub async fn dashboard(&self) -> Result<Dashboard> {
    let resp = self
      .admin(self.client.get(self.url("/admin/data")))?
      .send()
      .await
      .context("GET /admin/data failed")?;
    Self::decode("GET /admin/data", resp).await
  }

  /// `PUT /api/admin/item/{id}`
  pub async fn review_item(&self, id: ItemId, status: ItemStatus) -> Result<ItemDecided> {
    let path = format!("/admin/item/{id}");
    let resp = self
      .admin(self.client.put(self.url(&path)))?
      .json(&serde_json::json!({ "status": status.as_str() }))
      .send()
      .await
      .with_context(|| format!("PUT {path} failed"))?;
    Self::decode(&format!("PUT {path}"), resp).await
  }

  /// `PUT /api/admin/claim/{id}`
  pub async fn review_claim(
    &self,
    id: ClaimId,
    status: ClaimStatus,
  ) -> Result<ClaimDecided> {
    let path = format!("/admin/claim/{id}");
    let resp = self
      .admin(self.client.put(self.url(&path)))?
      .json(&serde_json::json!({ "status": status.as_str() }))
      .send()
      .await
      .with_context(|| format!("PUT {path} failed"))?;
    Self::decode(&format!("PUT {path}"), resp).await
  }
}
