//! Audit-trail middleware.
//!
//! Every request addressed to a single record (`/{collection}/{id}`) is
//! recorded after the handler has produced its response. The change_log and
//! audit_trail sub-resources are not recorded.

use axum::{
  extract::{MatchedPath, Request, State},
  http::{HeaderMap, header},
  middleware::Next,
  response::Response,
};
use talent_core::{ResourceKind, history::NewAuditEntry, store::TalentStore};
use uuid::Uuid;

use crate::{AppState, auth::Username};

/// The record a path addresses, if it is exactly `/{collection}/{id}`.
pub fn item_target(path: &str) -> Option<(ResourceKind, Uuid)> {
  let mut segments = path.trim_matches('/').split('/');
  let collection = segments.next()?;
  let id = segments.next()?;
  if segments.next().is_some() {
    return None;
  }
  Some((ResourceKind::from_collection(collection)?, Uuid::parse_str(id).ok()?))
}

fn header_string(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
  headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_owned)
}

pub async fn record_audit<S>(State(state): State<AppState<S>>, req: Request, next: Next) -> Response
where
  S: TalentStore + 'static,
{
  let Some((resource_kind, resource_id)) = item_target(req.uri().path()) else {
    return next.run(req).await;
  };

  let headers = req.headers();
  let mut entry = NewAuditEntry {
    resource_kind,
    resource_id,
    method:       req.method().to_string(),
    route:        req.extensions().get::<MatchedPath>().map(|p| p.as_str().to_owned()),
    endpoint:     req.uri().path().to_owned(),
    status_code:  0,
    content_type: header_string(headers, header::CONTENT_TYPE),
    accept:       header_string(headers, header::ACCEPT),
    user_agent:   header_string(headers, header::USER_AGENT),
    username:     req.extensions().get::<Username>().map(|u| u.0.clone()),
  };

  let response = next.run(req).await;
  entry.status_code = response.status().as_u16();

  if let Err(e) = state.store.record_audit(entry).await {
    tracing::warn!(kind = %resource_kind, id = %resource_id, error = %e, "failed to record audit entry");
  }
  response
}
