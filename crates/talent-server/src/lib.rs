//! Deployment wiring for the talent data service.
//!
//! Loads [`ServerConfig`] from a TOML file layered under `TALENT_*`
//! environment variables, and assembles the HTTP application around a store.

pub mod fixtures;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use axum::Router;
use serde::Deserialize;
use talent_api::{AppState, AuthConfig};
use talent_commonground::{CommonGroundClient, CommonGroundConfig};
use talent_core::store::TalentStore;
use tower_http::trace::TraceLayer;

// ─── Configuration ───────────────────────────────────────────────────────────

fn default_host() -> String { "127.0.0.1".to_owned() }
fn default_port() -> u16 { 8080 }
fn default_store_path() -> PathBuf { PathBuf::from("talent.db") }

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:               String,
  #[serde(default = "default_port")]
  pub port:               u16,
  #[serde(default = "default_store_path")]
  pub store_path:         PathBuf,
  /// Domain this deployment serves. Decides which fixture sets apply.
  #[serde(default)]
  pub app_domain:         String,
  /// Load every fixture set regardless of `app_domain`.
  #[serde(default)]
  pub build_all_fixtures: bool,
  /// Load applicable fixtures on startup.
  #[serde(default)]
  pub load_fixtures:      bool,
  /// Basic auth is off when this table is absent.
  #[serde(default)]
  pub auth:               Option<AuthConfig>,
  #[serde(default)]
  pub commonground:       CommonGroundConfig,
  /// Check `person`, `organization` and similar URLs against the registry
  /// before accepting a write.
  #[serde(default)]
  pub verify_references:  bool,
}

impl ServerConfig {
  /// Read `path` (optional) and overlay `TALENT_*` variables.
  ///
  /// Nested keys use a double underscore, e.g. `TALENT_AUTH__USERNAME`.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("TALENT")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()
      .context("failed to read config file")?
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  /// `store_path` with a leading `~` replaced by `$HOME`.
  pub fn resolved_store_path(&self) -> PathBuf {
    match (self.store_path.strip_prefix("~"), std::env::var_os("HOME")) {
      (Ok(rest), Some(home)) => PathBuf::from(home).join(rest),
      _ => self.store_path.clone(),
    }
  }
}

// ─── Application ─────────────────────────────────────────────────────────────

/// Build the registry client described by `config`.
pub fn commonground_client(config: &ServerConfig) -> anyhow::Result<CommonGroundClient> {
  CommonGroundClient::new(config.commonground.clone()).context("failed to build CommonGround client")
}

/// The full HTTP application: API routes plus request tracing.
pub fn app<S>(store: Arc<S>, config: &ServerConfig) -> anyhow::Result<Router>
where
  S: TalentStore + 'static,
{
  let mut state = AppState::new(store);
  state.auth = config.auth.clone().map(Arc::new);
  if config.verify_references {
    state.commonground = Some(Arc::new(commonground_client(config)?));
  }
  if state.auth.is_none() {
    tracing::warn!("basic auth is disabled");
  }
  Ok(talent_api::api_router(state).layer(TraceLayer::new_for_http()))
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use talent_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  fn config_from_toml(toml: &str) -> ServerConfig {
    config::Config::builder()
      .add_source(config::File::from_str(toml, config::FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  #[test]
  fn empty_config_uses_defaults() {
    let cfg = config_from_toml("");
    assert_eq!(cfg.address(), "127.0.0.1:8080");
    assert_eq!(cfg.store_path, PathBuf::from("talent.db"));
    assert!(cfg.app_domain.is_empty());
    assert!(!cfg.load_fixtures);
    assert!(cfg.auth.is_none());
    assert!(!cfg.verify_references);
    assert_eq!(cfg.commonground.components["cc"], "https://cc.zaakonline.nl");
  }

  #[test]
  fn nested_tables_are_read() {
    let cfg = config_from_toml(
      r#"
        port = 9000
        app_domain = "zuid-drecht.nl"

        [auth]
        username = "hr"
        password_hash = "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA"

        [commonground.components]
        cc = "http://localhost:8081"
      "#,
    );
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.app_domain, "zuid-drecht.nl");
    assert_eq!(cfg.auth.as_ref().map(|a| a.username.as_str()), Some("hr"));
    assert_eq!(cfg.commonground.components["cc"], "http://localhost:8081");
    assert_eq!(cfg.commonground.timeout_secs, 30);
  }

  #[test]
  fn store_path_expands_home() {
    let mut cfg = config_from_toml("");
    assert_eq!(cfg.resolved_store_path(), PathBuf::from("talent.db"));

    cfg.store_path = PathBuf::from("~/data/talent.db");
    if let Some(home) = std::env::var_os("HOME") {
      assert_eq!(cfg.resolved_store_path(), PathBuf::from(home).join("data/talent.db"));
    }
  }

  #[tokio::test]
  async fn app_serves_the_api() {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let app = app(store, &config_from_toml("")).unwrap();

    let res = app
      .oneshot(Request::get("/job_postings").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn configured_auth_is_enforced() {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let cfg = config_from_toml(
      r#"
        [auth]
        username = "hr"
        password_hash = "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA"
      "#,
    );
    let res = app(store, &cfg)
      .unwrap()
      .oneshot(Request::get("/skills").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
  }
}
