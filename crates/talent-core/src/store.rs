//! The `TalentStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `talent-store-sqlite`).
//! Higher layers (`talent-api`, `talent-server`) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  error::StoreError,
  history::{AuditTrailEntry, ChangeLogEntry, NewAuditEntry},
  resource::{Entity, Record, ResourceKind},
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// A scalar to compare a stored attribute against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
  Bool(bool),
  Integer(i64),
  Text(String),
}

impl FilterValue {
  /// Interpret a raw query-string value. `true`/`false` and canonical
  /// integers may also match JSON booleans and numbers; everything else is
  /// text. A typed value always renders back to the raw string, see
  /// [`FilterValue::as_text`].
  pub fn parse(raw: &str) -> Self {
    match raw {
      "true" => Self::Bool(true),
      "false" => Self::Bool(false),
      _ => match raw.parse::<i64>() {
        Ok(n) if n.to_string() == raw => Self::Integer(n),
        _ => Self::Text(raw.to_owned()),
      },
    }
  }

  /// The value as it appeared in the query string.
  pub fn as_text(&self) -> String {
    match self {
      Self::Bool(b) => b.to_string(),
      Self::Integer(n) => n.to_string(),
      Self::Text(s) => s.clone(),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
  #[default]
  Asc,
  Desc,
}

/// Server-maintained timestamp columns that support range filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
  DateCreated,
  DateModified,
}

impl Timestamp {
  pub fn parse(field: &str) -> Option<Self> {
    match field {
      "date_created" => Some(Self::DateCreated),
      "date_modified" => Some(Self::DateModified),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOp {
  After,
  Before,
  StrictlyAfter,
  StrictlyBefore,
}

impl DateOp {
  pub fn parse(op: &str) -> Option<Self> {
    match op {
      "after" => Some(Self::After),
      "before" => Some(Self::Before),
      "strictly_after" => Some(Self::StrictlyAfter),
      "strictly_before" => Some(Self::StrictlyBefore),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateBound {
  pub field: Timestamp,
  pub op:    DateOp,
  pub at:    DateTime<Utc>,
}

/// Parameters for [`TalentStore::list`].
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
  /// Owning relation field → required target id (e.g. `employee` → uuid).
  pub relations:   Vec<(String, Uuid)>,
  /// Exact-match filters over stored attributes.
  pub attributes:  Vec<(String, FilterValue)>,
  /// Applied in order; ties fall back to creation order.
  pub order:       Vec<(String, SortDirection)>,
  pub date_bounds: Vec<DateBound>,
  pub limit:       Option<usize>,
  pub offset:      Option<usize>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a talent store backend.
///
/// Writes keep both sides of every relation in
/// [`crate::relation::RELATIONS`] consistent and append to the change log in
/// the same unit of work.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait TalentStore: Send + Sync {
  type Error: StoreError;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Validate and persist a new record with a fresh UUIDv4.
  fn create<E: Entity>(
    &self,
    entity: E,
  ) -> impl Future<Output = Result<Record<E>, Self::Error>> + Send + '_;

  /// Persist a new record under a caller-supplied id.
  ///
  /// Used by fixture loaders that pin well-known ids. Fails with a conflict
  /// if the id is already taken.
  fn create_with_id<E: Entity>(
    &self,
    id: Uuid,
    entity: E,
  ) -> impl Future<Output = Result<Record<E>, Self::Error>> + Send + '_;

  /// Replace every writable field of an existing record.
  fn replace<E: Entity>(
    &self,
    id: Uuid,
    entity: E,
  ) -> impl Future<Output = Result<Record<E>, Self::Error>> + Send + '_;

  /// Delete a record, detaching anything that pointed at it.
  fn delete(
    &self,
    kind: ResourceKind,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// [`replace`](Self::replace), but only if `precondition` holds for the
  /// current record. The check runs in the same transaction as the write.
  fn replace_if<E, P>(
    &self,
    id: Uuid,
    entity: E,
    precondition: P,
  ) -> impl Future<Output = Result<Record<E>, Self::Error>> + Send + '_
  where
    E: Entity,
    P: FnOnce(&Record<E>) -> bool + Send + 'static;

  /// [`delete`](Self::delete), but only if `precondition` holds for the
  /// current record.
  fn delete_if<E, P>(
    &self,
    id: Uuid,
    precondition: P,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_
  where
    E: Entity,
    P: FnOnce(&Record<E>) -> bool + Send + 'static;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Retrieve a record by UUID. Returns `None` if not found.
  fn get<E: Entity>(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Record<E>>, Self::Error>> + Send + '_;

  fn exists(
    &self,
    kind: ResourceKind,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn list<'a, E: Entity>(
    &'a self,
    query: &'a ListQuery,
  ) -> impl Future<Output = Result<Vec<Record<E>>, Self::Error>> + Send + 'a;

  // ── History ───────────────────────────────────────────────────────────

  /// Change-log entries for a record, oldest first. Fails with not-found
  /// once the record itself is gone.
  fn change_log(
    &self,
    kind: ResourceKind,
    id: Uuid,
  ) -> impl Future<Output = Result<Vec<ChangeLogEntry>, Self::Error>> + Send + '_;

  /// Audit-trail entries for a record, oldest first. Fails with not-found
  /// once the record itself is gone.
  fn audit_trail(
    &self,
    kind: ResourceKind,
    id: Uuid,
  ) -> impl Future<Output = Result<Vec<AuditTrailEntry>, Self::Error>> + Send + '_;

  fn record_audit(
    &self,
    entry: NewAuditEntry,
  ) -> impl Future<Output = Result<AuditTrailEntry, Self::Error>> + Send + '_;
}
