//! Verification of external registry references on writes.

use talent_commonground::CommonGroundClient;
use talent_core::{Entity, validate::Violations};

use crate::error::ApiError;

/// Check that every absolute URL `entity` points at resolves on the
/// registry. Unresolvable URLs become violations on their property; an
/// unreachable registry is a gateway failure.
pub async fn verify<E: Entity>(client: &CommonGroundClient, entity: &E) -> Result<(), ApiError> {
  let mut v = Violations::new();
  for (property, url) in entity.external_references() {
    match client.resource_exists(url).await {
      Ok(true) => {}
      Ok(false) => v.push(property, format!("{url} does not resolve to a resource")),
      Err(e) => {
        tracing::warn!(%url, error = %e, "registry lookup failed");
        return Err(ApiError::BadGateway(e.to_string()));
      }
    }
  }
  Ok(v.into_result()?)
}
