//! Change-log and audit-trail records.
//!
//! The change log tracks *what* changed on a record (one versioned entry per
//! create, update or remove). The audit trail tracks *who asked* (one entry
//! per HTTP request addressed to a record). Both are append-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::resource::ResourceKind;

// ─── Change log ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
  Create,
  Update,
  Remove,
}

impl ChangeAction {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Create => "create",
      Self::Update => "update",
      Self::Remove => "remove",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "create" => Some(Self::Create),
      "update" => Some(Self::Update),
      "remove" => Some(Self::Remove),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeLogEntry {
  pub id:            Uuid,
  pub action:        ChangeAction,
  pub resource_kind: ResourceKind,
  pub resource_id:   Uuid,
  /// Starts at 1 for the create entry and increases by one per entry.
  pub version:       i64,
  /// Changed fields with their new values.
  pub data:          Map<String, Value>,
  pub logged_at:     DateTime<Utc>,
}

/// The fields of `new` that differ from `old`, with their new values.
///
/// Keys present in `old` but missing from `new` are reported as `null`.
pub fn changed_fields(old: &Map<String, Value>, new: &Map<String, Value>) -> Map<String, Value> {
  let mut out = Map::new();
  for (k, v) in new {
    if old.get(k) != Some(v) {
      out.insert(k.clone(), v.clone());
    }
  }
  for k in old.keys() {
    if !new.contains_key(k) {
      out.insert(k.clone(), Value::Null);
    }
  }
  out
}

/// The non-null fields of a freshly created record.
pub fn initial_fields(new: &Map<String, Value>) -> Map<String, Value> {
  new
    .iter()
    .filter(|(_, v)| !v.is_null())
    .map(|(k, v)| (k.clone(), v.clone()))
    .collect()
}

// ─── Audit trail ─────────────────────────────────────────────────────────────

/// Input to [`crate::store::TalentStore::record_audit`].
/// `id` and `date_created` are set by the store.
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
  pub resource_kind: ResourceKind,
  pub resource_id:   Uuid,
  pub method:        String,
  /// The matched route template, e.g. `/employees/{id}`.
  pub route:         Option<String>,
  /// The concrete request path.
  pub endpoint:      String,
  pub status_code:   u16,
  pub content_type:  Option<String>,
  pub accept:        Option<String>,
  pub user_agent:    Option<String>,
  pub username:      Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditTrailEntry {
  pub id:            Uuid,
  pub resource_kind: ResourceKind,
  pub resource_id:   Uuid,
  pub method:        String,
  pub route:         Option<String>,
  pub endpoint:      String,
  pub status_code:   u16,
  pub content_type:  Option<String>,
  pub accept:        Option<String>,
  pub user_agent:    Option<String>,
  pub username:      Option<String>,
  pub date_created:  DateTime<Utc>,
}
