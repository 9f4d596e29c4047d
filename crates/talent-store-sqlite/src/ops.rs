//! Synchronous building blocks run on the SQLite thread.
//!
//! Every function takes a plain [`Connection`]; writes are called with the
//! open [`rusqlite::Transaction`] (which derefs to one) so that a record,
//! its relation bookkeeping and its change-log entries commit together.
//!
//! Table and column names interpolated into SQL come from
//! [`ResourceKind::collection`] and [`talent_core::relation::RELATIONS`],
//! never from user input.

use rusqlite::{Connection, OptionalExtension as _, types::Value as SqlValue};
use serde_json::{Map, Value};
use talent_core::{
  ResourceKind,
  history::{AuditTrailEntry, ChangeAction, ChangeLogEntry, NewAuditEntry},
  relation::{self, Cardinality, Relation},
  store::{DateOp, FilterValue, ListQuery, SortDirection, Timestamp},
  validate::Violations,
};
use uuid::Uuid;

use crate::{
  Error, Result,
  document::{Document, uuid_value, versioned_view},
  encode::{RawAuditTrail, RawChangeLog, decode_uuid, encode_dt, encode_uuid, now},
};

// ─── Rows ────────────────────────────────────────────────────────────────────

/// A stored entity row, before inverse fields are derived.
pub struct StoredRow {
  pub attributes:    Map<String, Value>,
  pub owners:        Vec<(&'static Relation, Option<Uuid>)>,
  pub date_created:  String,
  pub date_modified: String,
}

impl StoredRow {
  pub fn versioned(&self) -> Map<String, Value> { versioned_view(&self.attributes, &self.owners) }
}

fn owner_columns(kind: ResourceKind) -> String {
  relation::owned_by(kind).map(|r| format!(", {}", r.column)).collect()
}

fn opt_uuid(id: Option<Uuid>) -> SqlValue {
  match id {
    Some(id) => SqlValue::Text(encode_uuid(id)),
    None => SqlValue::Null,
  }
}

/// Map a UNIQUE/foreign-key failure onto a conflict the API can report.
fn constraint_conflict(e: rusqlite::Error) -> Error {
  if let rusqlite::Error::SqliteFailure(err, msg) = &e
    && err.code == rusqlite::ErrorCode::ConstraintViolation
  {
    let detail = msg.clone().unwrap_or_else(|| e.to_string());
    return Error::Core(talent_core::Error::Conflict(detail));
  }
  Error::Sqlite(e)
}

pub fn exists(conn: &Connection, kind: ResourceKind, id: Uuid) -> Result<bool> {
  let sql = format!("SELECT 1 FROM {} WHERE id = ?1", kind.collection());
  Ok(
    conn
      .query_row(&sql, rusqlite::params![encode_uuid(id)], |_| Ok(()))
      .optional()?
      .is_some(),
  )
}

pub fn load(conn: &Connection, kind: ResourceKind, id: Uuid) -> Result<Option<StoredRow>> {
  let rels: Vec<&'static Relation> = relation::owned_by(kind).collect();
  let sql = format!(
    "SELECT attributes, date_created, date_modified{} FROM {} WHERE id = ?1",
    owner_columns(kind),
    kind.collection(),
  );

  let raw = conn
    .query_row(&sql, rusqlite::params![encode_uuid(id)], |row| {
      let attributes: String = row.get(0)?;
      let created: String = row.get(1)?;
      let modified: String = row.get(2)?;
      let mut owners = Vec::with_capacity(rels.len());
      for i in 0..rels.len() {
        owners.push(row.get::<_, Option<String>>(3 + i)?);
      }
      Ok((attributes, created, modified, owners))
    })
    .optional()?;

  let Some((attributes, date_created, date_modified, owner_ids)) = raw else {
    return Ok(None);
  };

  let attributes: Map<String, Value> = serde_json::from_str(&attributes)?;
  let owners = rels
    .into_iter()
    .zip(owner_ids)
    .map(|(rel, id)| -> Result<_> { Ok((rel, id.as_deref().map(decode_uuid).transpose()?)) })
    .collect::<Result<Vec<_>>>()?;

  Ok(Some(StoredRow { attributes, owners, date_created, date_modified }))
}

/// Ids of the `rel.owner` records whose owning column points at `target`.
pub fn children(conn: &Connection, rel: &Relation, target: Uuid) -> Result<Vec<Uuid>> {
  let sql = format!(
    "SELECT id FROM {} WHERE {} = ?1 ORDER BY rowid",
    rel.owner.collection(),
    rel.column,
  );
  let mut stmt = conn.prepare(&sql)?;
  let ids = stmt
    .query_map(rusqlite::params![encode_uuid(target)], |r| r.get::<_, String>(0))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  ids.iter().map(|s| decode_uuid(s)).collect()
}

/// The full wire object for a record: attributes, owning fields, derived
/// inverse fields and the envelope.
pub fn materialize(conn: &Connection, kind: ResourceKind, id: Uuid) -> Result<Option<Value>> {
  let Some(row) = load(conn, kind, id)? else { return Ok(None) };

  let mut out = row.versioned();
  for rel in relation::targeting(kind) {
    let ids = children(conn, rel, id)?;
    let value = match rel.cardinality {
      Cardinality::ManyToOne => Value::Array(ids.into_iter().map(|c| uuid_value(Some(c))).collect()),
      Cardinality::OneToOne => uuid_value(ids.first().copied()),
    };
    out.insert(rel.inverse.to_owned(), value);
  }
  out.insert("id".to_owned(), uuid_value(Some(id)));
  out.insert("date_created".to_owned(), Value::String(row.date_created));
  out.insert("date_modified".to_owned(), Value::String(row.date_modified));
  Ok(Some(Value::Object(out)))
}

// ─── Writes ──────────────────────────────────────────────────────────────────

/// Reject links to records that do not exist, naming the offending field.
pub fn check_references(conn: &Connection, doc: &Document) -> Result<()> {
  let mut v = Violations::new();
  for (rel, id) in &doc.owners {
    if let Some(id) = id
      && !exists(conn, rel.target, *id)?
    {
      v.push(rel.field, format!("no {} with id {id}", rel.target));
    }
  }
  for (rel, value) in &doc.inverses {
    for id in value.ids() {
      if !exists(conn, rel.owner, id)? {
        v.push(rel.inverse, format!("no {} with id {id}", rel.owner));
      }
    }
  }
  v.into_result()?;
  Ok(())
}

pub fn insert(conn: &Connection, id: Uuid, doc: &Document, at: &str) -> Result<()> {
  let mut columns = String::from("id, attributes, date_created, date_modified");
  let mut params = vec![
    SqlValue::Text(encode_uuid(id)),
    SqlValue::Text(Value::Object(doc.attributes.clone()).to_string()),
    SqlValue::Text(at.to_owned()),
    SqlValue::Text(at.to_owned()),
  ];
  for (rel, target) in &doc.owners {
    columns.push_str(", ");
    columns.push_str(rel.column);
    params.push(opt_uuid(*target));
  }
  let placeholders: Vec<String> = (1..=params.len()).map(|i| format!("?{i}")).collect();
  let sql = format!(
    "INSERT INTO {} ({columns}) VALUES ({})",
    doc.kind.collection(),
    placeholders.join(", "),
  );
  conn
    .execute(&sql, rusqlite::params_from_iter(params.iter()))
    .map_err(constraint_conflict)?;
  Ok(())
}

pub fn update(conn: &Connection, id: Uuid, doc: &Document, at: &str) -> Result<()> {
  let mut sets = vec!["attributes = ?1".to_owned(), "date_modified = ?2".to_owned()];
  let mut params = vec![
    SqlValue::Text(Value::Object(doc.attributes.clone()).to_string()),
    SqlValue::Text(at.to_owned()),
  ];
  for (rel, target) in &doc.owners {
    params.push(opt_uuid(*target));
    sets.push(format!("{} = ?{}", rel.column, params.len()));
  }
  params.push(SqlValue::Text(encode_uuid(id)));
  let sql = format!(
    "UPDATE {} SET {} WHERE id = ?{}",
    doc.kind.collection(),
    sets.join(", "),
    params.len(),
  );
  conn
    .execute(&sql, rusqlite::params_from_iter(params.iter()))
    .map_err(constraint_conflict)?;
  Ok(())
}

pub fn delete_row(conn: &Connection, kind: ResourceKind, id: Uuid) -> Result<()> {
  let sql = format!("DELETE FROM {} WHERE id = ?1", kind.collection());
  conn.execute(&sql, rusqlite::params![encode_uuid(id)])?;
  Ok(())
}

/// Point `child`'s owning column for `rel` at `target`, logging the change
/// on the child. Returns `false` when it already pointed there.
pub fn set_owner(
  conn: &Connection,
  rel: &Relation,
  child: Uuid,
  target: Option<Uuid>,
  at: &str,
) -> Result<bool> {
  let table = rel.owner.collection();
  let current: Option<String> = conn.query_row(
    &format!("SELECT {} FROM {table} WHERE id = ?1", rel.column),
    rusqlite::params![encode_uuid(child)],
    |r| r.get(0),
  )?;
  if current.as_deref().map(decode_uuid).transpose()? == target {
    return Ok(false);
  }

  conn
    .execute(
      &format!("UPDATE {table} SET {} = ?1, date_modified = ?2 WHERE id = ?3", rel.column),
      rusqlite::params![target.map(encode_uuid), at, encode_uuid(child)],
    )
    .map_err(constraint_conflict)?;

  let mut data = Map::new();
  data.insert(rel.field.to_owned(), uuid_value(target));
  log_change(conn, rel.owner, child, ChangeAction::Update, &data)?;
  tracing::debug!(kind = %rel.owner, id = %child, field = rel.field, ?target, "relinked");
  Ok(true)
}

/// For every one-to-one link `doc` claims, unlink any other record that
/// currently holds the same target.
pub fn claim_one_to_one(conn: &Connection, id: Uuid, doc: &Document, at: &str) -> Result<()> {
  for (rel, target) in &doc.owners {
    if rel.cardinality != Cardinality::OneToOne {
      continue;
    }
    let Some(target) = target else { continue };
    for other in children(conn, rel, *target)? {
      if other != id {
        set_owner(conn, rel, other, None, at)?;
      }
    }
  }
  Ok(())
}

/// Rewrite owning columns so that the inverse fields present in `doc` read
/// back exactly as written. Children dropped from a list are detached.
pub fn apply_inverses(conn: &Connection, id: Uuid, doc: &Document, at: &str) -> Result<()> {
  for (rel, value) in &doc.inverses {
    let wanted = value.ids();
    for current in children(conn, rel, id)? {
      if !wanted.contains(&current) {
        set_owner(conn, rel, current, None, at)?;
      }
    }
    for child in wanted {
      set_owner(conn, rel, child, Some(id), at)?;
    }
  }
  Ok(())
}

/// Null every owning column that points at `id`, logging on each child.
pub fn detach_children(conn: &Connection, kind: ResourceKind, id: Uuid, at: &str) -> Result<()> {
  for rel in relation::targeting(kind) {
    for child in children(conn, rel, id)? {
      set_owner(conn, rel, child, None, at)?;
    }
  }
  Ok(())
}

// ─── History ─────────────────────────────────────────────────────────────────

pub fn log_change(
  conn: &Connection,
  kind: ResourceKind,
  id: Uuid,
  action: ChangeAction,
  data: &Map<String, Value>,
) -> Result<()> {
  let id_str = encode_uuid(id);
  let version: i64 = conn.query_row(
    "SELECT COALESCE(MAX(version), 0) + 1 FROM change_logs
     WHERE resource_kind = ?1 AND resource_id = ?2",
    rusqlite::params![kind.as_str(), id_str],
    |r| r.get(0),
  )?;
  conn.execute(
    "INSERT INTO change_logs (id, resource_kind, resource_id, version, action, data, logged_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    rusqlite::params![
      encode_uuid(Uuid::new_v4()),
      kind.as_str(),
      id_str,
      version,
      action.as_str(),
      Value::Object(data.clone()).to_string(),
      encode_dt(now()),
    ],
  )?;
  Ok(())
}

pub fn change_log(conn: &Connection, kind: ResourceKind, id: Uuid) -> Result<Vec<ChangeLogEntry>> {
  let sql = format!(
    "SELECT {} FROM change_logs WHERE resource_kind = ?1 AND resource_id = ?2 ORDER BY version",
    RawChangeLog::COLUMNS,
  );
  let mut stmt = conn.prepare(&sql)?;
  let raws = stmt
    .query_map(rusqlite::params![kind.as_str(), encode_uuid(id)], RawChangeLog::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawChangeLog::into_entry).collect()
}

pub fn insert_audit(conn: &Connection, entry: NewAuditEntry) -> Result<AuditTrailEntry> {
  let stored = AuditTrailEntry {
    id:            Uuid::new_v4(),
    resource_kind: entry.resource_kind,
    resource_id:   entry.resource_id,
    method:        entry.method,
    route:         entry.route,
    endpoint:      entry.endpoint,
    status_code:   entry.status_code,
    content_type:  entry.content_type,
    accept:        entry.accept,
    user_agent:    entry.user_agent,
    username:      entry.username,
    date_created:  now(),
  };
  conn.execute(
    &format!(
      "INSERT INTO audit_trails ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
      RawAuditTrail::COLUMNS,
    ),
    rusqlite::params![
      encode_uuid(stored.id),
      stored.resource_kind.as_str(),
      encode_uuid(stored.resource_id),
      stored.method,
      stored.route,
      stored.endpoint,
      stored.status_code,
      stored.content_type,
      stored.accept,
      stored.user_agent,
      stored.username,
      encode_dt(stored.date_created),
    ],
  )?;
  Ok(stored)
}

pub fn audit_trail(conn: &Connection, kind: ResourceKind, id: Uuid) -> Result<Vec<AuditTrailEntry>> {
  let sql = format!(
    "SELECT {} FROM audit_trails WHERE resource_kind = ?1 AND resource_id = ?2
     ORDER BY date_created, rowid",
    RawAuditTrail::COLUMNS,
  );
  let mut stmt = conn.prepare(&sql)?;
  let raws = stmt
    .query_map(rusqlite::params![kind.as_str(), encode_uuid(id)], RawAuditTrail::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawAuditTrail::into_entry).collect()
}

// ─── Listing ─────────────────────────────────────────────────────────────────

/// Attribute names may only be interpolated into JSON paths when they are
/// plain snake_case identifiers.
fn is_field_name(field: &str) -> bool {
  !field.is_empty()
    && field.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}

fn timestamp_column(field: Timestamp) -> &'static str {
  match field {
    Timestamp::DateCreated => "date_created",
    Timestamp::DateModified => "date_modified",
  }
}

pub fn list(conn: &Connection, kind: ResourceKind, query: &ListQuery) -> Result<Vec<Value>> {
  let mut params: Vec<SqlValue> = Vec::new();
  let mut clauses: Vec<String> = Vec::new();
  let mut order: Vec<String> = Vec::new();
  let mut v = Violations::new();

  for (field, id) in &query.relations {
    match relation::owning_field(kind, field) {
      Some(rel) => {
        params.push(SqlValue::Text(encode_uuid(*id)));
        clauses.push(format!("t.{} = ?{}", rel.column, params.len()));
      }
      None => v.push(field, format!("{kind} has no relation named {field}")),
    }
  }

  for (field, value) in &query.attributes {
    if !is_field_name(field) {
      v.push(field, "not a filterable field");
      continue;
    }
    params.push(SqlValue::Text(format!("$.{field}")));
    let path = params.len();
    params.push(SqlValue::Text(value.as_text()));
    let text = params.len();
    // Text attributes match the raw string even when it looks like a number.
    let typed = match value {
      FilterValue::Bool(b) => Some(SqlValue::Integer(i64::from(*b))),
      FilterValue::Integer(n) => Some(SqlValue::Integer(*n)),
      FilterValue::Text(_) => None,
    };
    match typed {
      Some(typed) => {
        params.push(typed);
        clauses.push(format!(
          "(json_extract(t.attributes, ?{path}) = ?{text} OR json_extract(t.attributes, ?{path}) = ?{})",
          params.len()
        ));
      }
      None => clauses.push(format!("json_extract(t.attributes, ?{path}) = ?{text}")),
    }
  }

  for bound in &query.date_bounds {
    let op = match bound.op {
      DateOp::After => ">=",
      DateOp::Before => "<=",
      DateOp::StrictlyAfter => ">",
      DateOp::StrictlyBefore => "<",
    };
    params.push(SqlValue::Text(encode_dt(bound.at)));
    clauses.push(format!("t.{} {op} ?{}", timestamp_column(bound.field), params.len()));
  }

  for (field, direction) in &query.order {
    let direction = match direction {
      SortDirection::Asc => "ASC",
      SortDirection::Desc => "DESC",
    };
    let expr = if let Some(ts) = Timestamp::parse(field) {
      format!("t.{}", timestamp_column(ts))
    } else if let Some(rel) = relation::owning_field(kind, field) {
      format!("t.{}", rel.column)
    } else if is_field_name(field) {
      params.push(SqlValue::Text(format!("$.{field}")));
      format!("json_extract(t.attributes, ?{})", params.len())
    } else {
      v.push(field, "not a sortable field");
      continue;
    };
    order.push(format!("{expr} {direction}"));
  }

  v.into_result()?;
  order.push("t.rowid ASC".to_owned());

  let filter = if clauses.is_empty() {
    String::new()
  } else {
    format!(" WHERE {}", clauses.join(" AND "))
  };
  params.push(SqlValue::Integer(query.limit.map_or(-1, |n| i64::try_from(n).unwrap_or(i64::MAX))));
  let limit = params.len();
  params.push(SqlValue::Integer(query.offset.map_or(0, |n| i64::try_from(n).unwrap_or(i64::MAX))));
  let offset = params.len();

  let sql = format!(
    "SELECT t.id FROM {} t{filter} ORDER BY {} LIMIT ?{limit} OFFSET ?{offset}",
    kind.collection(),
    order.join(", "),
  );

  let ids = {
    let mut stmt = conn.prepare(&sql)?;
    stmt
      .query_map(rusqlite::params_from_iter(params.iter()), |r| r.get::<_, String>(0))?
      .collect::<rusqlite::Result<Vec<_>>>()?
  };

  ids
    .iter()
    .map(|s| {
      let id = decode_uuid(s)?;
      materialize(conn, kind, id)?
        .ok_or_else(|| Error::Corrupt(format!("{kind} {id} vanished during listing")))
    })
    .collect()
}
