//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings with fixed microsecond
//! precision so that lexical order equals chronological order. UUIDs are
//! stored as hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, SubsecRound as _, Utc};
use talent_core::{
  ResourceKind,
  history::{AuditTrailEntry, ChangeAction, ChangeLogEntry},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

/// The current instant, truncated to the precision we store.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── ResourceKind / ChangeAction ─────────────────────────────────────────────

pub fn decode_kind(s: &str) -> Result<ResourceKind> {
  s.parse().map_err(|_| Error::Corrupt(format!("unknown resource kind: {s:?}")))
}

pub fn decode_action(s: &str) -> Result<ChangeAction> {
  ChangeAction::parse(s).ok_or_else(|| Error::Corrupt(format!("unknown change action: {s:?}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `change_logs` row.
pub struct RawChangeLog {
  pub id:            String,
  pub resource_kind: String,
  pub resource_id:   String,
  pub version:       i64,
  pub action:        String,
  pub data:          String,
  pub logged_at:     String,
}

impl RawChangeLog {
  pub const COLUMNS: &'static str =
    "id, resource_kind, resource_id, version, action, data, logged_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      resource_kind: row.get(1)?,
      resource_id:   row.get(2)?,
      version:       row.get(3)?,
      action:        row.get(4)?,
      data:          row.get(5)?,
      logged_at:     row.get(6)?,
    })
  }

  pub fn into_entry(self) -> Result<ChangeLogEntry> {
    Ok(ChangeLogEntry {
      id:            decode_uuid(&self.id)?,
      action:        decode_action(&self.action)?,
      resource_kind: decode_kind(&self.resource_kind)?,
      resource_id:   decode_uuid(&self.resource_id)?,
      version:       self.version,
      data:          serde_json::from_str(&self.data)?,
      logged_at:     decode_dt(&self.logged_at)?,
    })
  }
}

/// Raw values read directly from an `audit_trails` row.
pub struct RawAuditTrail {
  pub id:            String,
  pub resource_kind: String,
  pub resource_id:   String,
  pub method:        String,
  pub route:         Option<String>,
  pub endpoint:      String,
  pub status_code:   u16,
  pub content_type:  Option<String>,
  pub accept:        Option<String>,
  pub user_agent:    Option<String>,
  pub username:      Option<String>,
  pub date_created:  String,
}

impl RawAuditTrail {
  pub const COLUMNS: &'static str = "id, resource_kind, resource_id, method, route, endpoint, \
                                     status_code, content_type, accept, user_agent, username, \
                                     date_created";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      resource_kind: row.get(1)?,
      resource_id:   row.get(2)?,
      method:        row.get(3)?,
      route:         row.get(4)?,
      endpoint:      row.get(5)?,
      status_code:   row.get(6)?,
      content_type:  row.get(7)?,
      accept:        row.get(8)?,
      user_agent:    row.get(9)?,
      username:      row.get(10)?,
      date_created:  row.get(11)?,
    })
  }

  pub fn into_entry(self) -> Result<AuditTrailEntry> {
    Ok(AuditTrailEntry {
      id:            decode_uuid(&self.id)?,
      resource_kind: decode_kind(&self.resource_kind)?,
      resource_id:   decode_uuid(&self.resource_id)?,
      method:        self.method,
      route:         self.route,
      endpoint:      self.endpoint,
      status_code:   self.status_code,
      content_type:  self.content_type,
      accept:        self.accept,
      user_agent:    self.user_agent,
      username:      self.username,
      date_created:  decode_dt(&self.date_created)?,
    })
  }
}
