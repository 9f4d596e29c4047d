//! Error types for `talent-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::{resource::ResourceKind, validate::Violations};

#[derive(Debug, Error)]
pub enum Error {
  #[error("{kind} not found: {id}")]
  NotFound { kind: ResourceKind, id: Uuid },

  #[error("validation failed: {0}")]
  Validation(Violations),

  #[error("conflict: {0}")]
  Conflict(String),

  /// A conditional write found the record in a different state.
  #[error("{kind} {id} does not match the precondition")]
  PreconditionFailed { kind: ResourceKind, id: Uuid },

  #[error("unknown collection: {0:?}")]
  UnknownCollection(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl From<Violations> for Error {
  fn from(v: Violations) -> Self { Self::Validation(v) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Implemented by backend error types so that callers can recover the
/// domain-level cause (not found, validation, conflict) without knowing the
/// concrete backend.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// The core error this backend error wraps, if any.
  fn core(&self) -> Option<&Error>;
}

impl StoreError for Error {
  fn core(&self) -> Option<&Error> { Some(self) }
}
