//! Async HTTP client for the CommonGround component registry.
//!
//! People and organisations are not stored locally. Records reference them
//! by absolute URL, built from a component code (`cc`, `wrc`, ...), a
//! resource type and an id via [`CommonGroundClient::clean_url`].

use std::{collections::BTreeMap, time::Duration};

use reqwest::{Client, StatusCode, header};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use url::Url;

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown component: {0:?}")]
  UnknownComponent(String),

  #[error("invalid url: {0}")]
  InvalidUrl(#[from] url::ParseError),

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("{url} answered {status}")]
  Status { url: String, status: u16 },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ─── Config ──────────────────────────────────────────────────────────────────

fn default_components() -> BTreeMap<String, String> {
  BTreeMap::from([
    ("cc".to_owned(), "https://cc.zaakonline.nl".to_owned()),
    ("wrc".to_owned(), "https://wrc.zaakonline.nl".to_owned()),
  ])
}

fn default_timeout_secs() -> u64 { 30 }

/// Registry connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CommonGroundConfig {
  /// Component code → base URL.
  #[serde(default = "default_components")]
  pub components:   BTreeMap<String, String>,
  /// Sent verbatim in the `Authorization` header when set.
  #[serde(default)]
  pub api_key:      Option<String>,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

impl Default for CommonGroundConfig {
  fn default() -> Self {
    Self {
      components:   default_components(),
      api_key:      None,
      timeout_secs: default_timeout_secs(),
    }
  }
}

/// A resource address in component/type/id form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceRef<'a> {
  pub component:     &'a str,
  pub resource_type: &'a str,
  pub id:            &'a str,
}

impl<'a> ResourceRef<'a> {
  pub fn new(component: &'a str, resource_type: &'a str, id: &'a str) -> Self {
    Self { component, resource_type, id }
  }
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// Clones share the inner [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct CommonGroundClient {
  client: Client,
  config: CommonGroundConfig,
}

impl CommonGroundClient {
  pub fn new(config: CommonGroundConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    Ok(Self { client, config })
  }

  pub fn config(&self) -> &CommonGroundConfig { &self.config }

  /// The canonical absolute URL for `resource`.
  pub fn clean_url(&self, resource: ResourceRef<'_>) -> Result<String> {
    let base = self
      .config
      .components
      .get(resource.component)
      .ok_or_else(|| Error::UnknownComponent(resource.component.to_owned()))?;
    let url = Url::parse(&format!(
      "{}/{}/{}",
      base.trim_end_matches('/'),
      resource.resource_type.trim_matches('/'),
      resource.id,
    ))?;
    Ok(url.into())
  }

  /// Fetch a resource by absolute URL. A 404 is `Ok(None)`.
  pub async fn get_resource(&self, url: &str) -> Result<Option<Value>> {
    let url = Url::parse(url)?;
    let mut req = self.client.get(url.clone()).header(header::ACCEPT, "application/json");
    if let Some(key) = &self.config.api_key {
      req = req.header(header::AUTHORIZATION, key);
    }

    let resp = req.send().await?;
    match resp.status() {
      StatusCode::NOT_FOUND => {
        tracing::debug!(%url, "resource not found");
        Ok(None)
      }
      s if s.is_success() => Ok(Some(resp.json().await?)),
      s => Err(Error::Status { url: url.into(), status: s.as_u16() }),
    }
  }

  pub async fn resource_exists(&self, url: &str) -> Result<bool> {
    Ok(self.get_resource(url).await?.is_some())
  }
}

#[cfg(test)]
mod tests {
  use axum::{
    Json, Router,
    extract::Path,
    http::{HeaderMap, StatusCode},
    routing::get,
  };
  use serde_json::json;

  use super::*;

  fn client_for(base: &str) -> CommonGroundClient {
    CommonGroundClient::new(CommonGroundConfig {
      components:   BTreeMap::from([("cc".to_owned(), base.to_owned())]),
      api_key:      Some("secret".into()),
      timeout_secs: 5,
    })
    .unwrap()
  }

  /// Serve a tiny registry on an ephemeral port: `/people/1` exists,
  /// `/broken/{id}` fails, everything else is 404.
  async fn registry() -> String {
    let app = Router::new()
      .route(
        "/people/{id}",
        get(|Path(id): Path<String>, headers: HeaderMap| async move {
          if id != "1" {
            return Err(StatusCode::NOT_FOUND);
          }
          let key = headers.get("authorization").and_then(|v| v.to_str().ok());
          Ok(Json(json!({"id": id, "name": "Jan", "key": key})))
        }),
      )
      .route("/broken/{id}", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}")
  }

  #[test]
  fn clean_url_joins_component_type_and_id() {
    let client = CommonGroundClient::new(CommonGroundConfig::default()).unwrap();
    let url = client
      .clean_url(ResourceRef::new("wrc", "organizations", "c571bdad-f34c-4e24-94e7-74629cfaccc9"))
      .unwrap();
    assert_eq!(
      url,
      "https://wrc.zaakonline.nl/organizations/c571bdad-f34c-4e24-94e7-74629cfaccc9"
    );
  }

  #[test]
  fn clean_url_tolerates_trailing_slashes() {
    let client = client_for("https://cc.example.org/api/");
    let url = client.clean_url(ResourceRef::new("cc", "/people/", "1")).unwrap();
    assert_eq!(url, "https://cc.example.org/api/people/1");
  }

  #[test]
  fn unknown_component_is_an_error() {
    let client = CommonGroundClient::new(CommonGroundConfig::default()).unwrap();
    let err = client.clean_url(ResourceRef::new("brp", "people", "1")).unwrap_err();
    assert!(matches!(err, Error::UnknownComponent(c) if c == "brp"));
  }

  #[tokio::test]
  async fn get_resource_sends_the_api_key() {
    let base = registry().await;
    let client = client_for(&base);
    let url = client.clean_url(ResourceRef::new("cc", "people", "1")).unwrap();

    let body = client.get_resource(&url).await.unwrap().unwrap();
    assert_eq!(body["name"], "Jan");
    assert_eq!(body["key"], "secret");
    assert!(client.resource_exists(&url).await.unwrap());
  }

  #[tokio::test]
  async fn missing_resource_is_none() {
    let base = registry().await;
    let client = client_for(&base);
    let url = client.clean_url(ResourceRef::new("cc", "people", "2")).unwrap();
    assert!(client.get_resource(&url).await.unwrap().is_none());
    assert!(!client.resource_exists(&url).await.unwrap());
  }

  #[tokio::test]
  async fn server_errors_are_reported() {
    let base = registry().await;
    let client = client_for(&base);
    let err = client.get_resource(&format!("{base}/broken/1")).await.unwrap_err();
    assert!(matches!(err, Error::Status { status: 500, .. }));
  }
}
