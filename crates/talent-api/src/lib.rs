//! JSON REST API for the talent data service.
//!
//! Exposes an axum [`Router`] backed by any [`talent_core::store::TalentStore`].
//! Every resource kind gets the same set of routes, see [`resources`].
//! TLS and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = talent_api::api_router(AppState::new(Arc::new(store)));
//! ```

pub mod audit;
pub mod auth;
pub mod error;
pub mod etag;
pub mod query;
pub mod references;
pub mod resources;

use std::sync::Arc;

use axum::{Router, middleware, routing::get};
use talent_commonground::CommonGroundClient;
use talent_core::{
  Entity,
  entity::{
    Application, Competence, Contract, Education, Employee, Goal, Interest, JobFunction,
    JobPosting, Skill,
  },
  store::TalentStore,
};

pub use auth::AuthConfig;
pub use error::ApiError;

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:        Arc<S>,
  /// When set, every route requires HTTP Basic credentials.
  pub auth:         Option<Arc<AuthConfig>>,
  /// When set, external references are verified on writes.
  pub commonground: Option<Arc<CommonGroundClient>>,
}

impl<S> AppState<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store, auth: None, commonground: None } }
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:        Arc::clone(&self.store),
      auth:         self.auth.clone(),
      commonground: self.commonground.clone(),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

fn resource_routes<S, E>(router: Router<AppState<S>>) -> Router<AppState<S>>
where
  S: TalentStore + 'static,
  E: Entity,
{
  let collection = format!("/{}", E::KIND.collection());
  router
    .route(&collection, get(resources::list::<S, E>).post(resources::create::<S, E>))
    .route(
      &format!("{collection}/{{id}}"),
      get(resources::get_one::<S, E>)
        .put(resources::replace::<S, E>)
        .delete(resources::delete::<S, E>),
    )
    .route(&format!("{collection}/{{id}}/change_log"), get(resources::change_log::<S, E>))
    .route(&format!("{collection}/{{id}}/audit_trail"), get(resources::audit_trail::<S, E>))
}

/// Build a fully-materialised API router for `state`.
///
/// Authentication runs first so the audit trail can record the username.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: TalentStore + 'static,
{
  let mut router = Router::new();
  router = resource_routes::<S, Employee>(router);
  router = resource_routes::<S, JobPosting>(router);
  router = resource_routes::<S, Skill>(router);
  router = resource_routes::<S, Competence>(router);
  router = resource_routes::<S, Goal>(router);
  router = resource_routes::<S, Interest>(router);
  router = resource_routes::<S, JobFunction>(router);
  router = resource_routes::<S, Contract>(router);
  router = resource_routes::<S, Education>(router);
  router = resource_routes::<S, Application>(router);

  router
    .layer(middleware::from_fn_with_state(state.clone(), audit::record_audit::<S>))
    .layer(middleware::from_fn_with_state(state.clone(), auth::require_auth::<S>))
    .with_state(state)
}
