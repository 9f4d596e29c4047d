//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::JsonRejection,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use talent_core::{error::StoreError, validate::Violations};
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("validation failed: {0}")]
  Validation(Violations),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("precondition failed")]
  PreconditionFailed,

  #[error("unauthorized")]
  Unauthorized,

  /// The external registry could not be consulted.
  #[error("bad gateway: {0}")]
  BadGateway(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Classify a backend error by the domain error it wraps.
  pub fn from_store<E: StoreError>(e: E) -> Self {
    match e.core() {
      Some(
        core @ (talent_core::Error::NotFound { .. } | talent_core::Error::UnknownCollection(_)),
      ) => Self::NotFound(core.to_string()),
      Some(talent_core::Error::Validation(v)) => Self::Validation(v.clone()),
      Some(talent_core::Error::Conflict(m)) => Self::Conflict(m.clone()),
      Some(talent_core::Error::PreconditionFailed { .. }) => Self::PreconditionFailed,
      Some(talent_core::Error::Serialization(_)) | None => Self::Store(Box::new(e)),
    }
  }
}

impl From<Violations> for ApiError {
  fn from(v: Violations) -> Self { Self::Validation(v) }
}

/// A body that parsed as JSON but does not fit the entity is reported as
/// violations on the offending property. Other rejections stay plain 400s.
impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    let text = rejection.body_text();
    if let JsonRejection::JsonDataError(_) = &rejection
      && let Some((_, detail)) = text.split_once(": ")
      && let Some(v) = decode_violations(detail)
    {
      return Self::Validation(v);
    }
    Self::BadRequest(text)
  }
}

/// Split a serde decode error of the form `path: message` (or a root-level
/// `missing field `name``) into a violation.
fn decode_violations(detail: &str) -> Option<Violations> {
  let detail = detail
    .rfind(" at line ")
    .map_or(detail, |at| &detail[..at]);

  let (path, message) = match detail.split_once(": ") {
    Some((path, message)) if is_property_path(path) => (path.to_owned(), message),
    _ => (missing_field(detail)?.to_owned(), detail),
  };

  let mut v = Violations::new();
  v.push(&path, message);
  Some(v)
}

fn is_property_path(path: &str) -> bool {
  !path.is_empty()
    && path
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '[' | ']'))
}

fn missing_field(message: &str) -> Option<&str> {
  message.strip_prefix("missing field `")?.split('`').next()
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, body) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, json!({ "error": m })),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, json!({ "error": m })),
      ApiError::Validation(v) => (
        StatusCode::BAD_REQUEST,
        json!({ "error": v.to_string(), "violations": v }),
      ),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, json!({ "error": m })),
      ApiError::PreconditionFailed => {
        (StatusCode::PRECONDITION_FAILED, json!({ "error": "precondition failed" }))
      }
      ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, json!({ "error": "unauthorized" })),
      ApiError::BadGateway(m) => (StatusCode::BAD_GATEWAY, json!({ "error": m })),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": e.to_string() }))
      }
    };

    let mut res = (status, Json(body)).into_response();
    if matches!(self, ApiError::Unauthorized) {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"talent\""),
      );
    }
    res
  }
}
