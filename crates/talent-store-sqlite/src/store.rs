//! SQLite implementation of [`TalentStore`].

use std::path::Path;

use rusqlite::{Connection, Transaction};
use serde_json::Map;
use uuid::Uuid;

use talent_core::{
  Entity, Record, ResourceKind,
  history::{
    AuditTrailEntry, ChangeAction, ChangeLogEntry, NewAuditEntry, changed_fields, initial_fields,
  },
  store::{ListQuery, TalentStore},
};

use crate::{
  Error, Result,
  document::Document,
  encode::{encode_dt, now},
  ops,
  schema::SCHEMA,
};

fn not_found(kind: ResourceKind, id: Uuid) -> Error {
  Error::Core(talent_core::Error::NotFound { kind, id })
}

/// Evaluate `precondition` against the record as it is inside the current
/// transaction.
fn guard<E, P>(conn: &Connection, id: Uuid, precondition: P) -> Result<()>
where
  E: Entity,
  P: FnOnce(&Record<E>) -> bool,
{
  let value = ops::materialize(conn, E::KIND, id)?.ok_or_else(|| not_found(E::KIND, id))?;
  let current: Record<E> = serde_json::from_value(value)?;
  if precondition(&current) {
    Ok(())
  } else {
    Err(Error::Core(talent_core::Error::PreconditionFailed { kind: E::KIND, id }))
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A talent store backed by a single SQLite file.
///
/// Clones share one reference-counted connection.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `f` inside a transaction that commits only if `f` succeeds.
  async fn write<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&Transaction<'_>) -> Result<T> + Send + 'static,
  {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let out = f(&tx);
        if out.is_ok() {
          tx.commit()?;
        }
        Ok(out)
      })
      .await?
  }

  async fn read<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<T> + Send + 'static,
  {
    self.conn.call(move |conn| Ok(f(conn))).await?
  }

  async fn insert_record<E: Entity>(&self, id: Uuid, entity: E) -> Result<Record<E>> {
    entity.validate()?;
    let doc = Document::split(E::KIND, serde_json::to_value(&entity)?)?;

    let value = self
      .write(move |tx| {
        if ops::exists(tx, E::KIND, id)? {
          return Err(Error::Core(talent_core::Error::Conflict(format!(
            "{} {id} already exists",
            E::KIND
          ))));
        }
        ops::check_references(tx, &doc)?;

        let at = encode_dt(now());
        ops::claim_one_to_one(tx, id, &doc, &at)?;
        ops::insert(tx, id, &doc, &at)?;
        ops::log_change(tx, E::KIND, id, ChangeAction::Create, &initial_fields(&doc.versioned()))?;
        ops::apply_inverses(tx, id, &doc, &at)?;

        ops::materialize(tx, E::KIND, id)?.ok_or_else(|| not_found(E::KIND, id))
      })
      .await?;

    tracing::debug!(kind = %E::KIND, %id, "created record");
    Ok(serde_json::from_value(value)?)
  }

  async fn replace_guarded<E, P>(&self, id: Uuid, entity: E, precondition: P) -> Result<Record<E>>
  where
    E: Entity,
    P: FnOnce(&Record<E>) -> bool + Send + 'static,
  {
    entity.validate()?;
    let doc = Document::split(E::KIND, serde_json::to_value(&entity)?)?;

    let value = self
      .write(move |tx| {
        let Some(old) = ops::load(tx, E::KIND, id)? else {
          return Err(not_found(E::KIND, id));
        };
        guard::<E, _>(tx, id, precondition)?;
        ops::check_references(tx, &doc)?;

        let at = encode_dt(now());
        ops::claim_one_to_one(tx, id, &doc, &at)?;
        ops::update(tx, id, &doc, &at)?;
        let diff = changed_fields(&old.versioned(), &doc.versioned());
        if !diff.is_empty() {
          ops::log_change(tx, E::KIND, id, ChangeAction::Update, &diff)?;
        }
        ops::apply_inverses(tx, id, &doc, &at)?;

        ops::materialize(tx, E::KIND, id)?.ok_or_else(|| not_found(E::KIND, id))
      })
      .await?;

    tracing::debug!(kind = %E::KIND, %id, "replaced record");
    Ok(serde_json::from_value(value)?)
  }

  async fn delete_guarded<G>(&self, kind: ResourceKind, id: Uuid, check: G) -> Result<()>
  where
    G: FnOnce(&Connection) -> Result<()> + Send + 'static,
  {
    self
      .write(move |tx| {
        if !ops::exists(tx, kind, id)? {
          return Err(not_found(kind, id));
        }
        check(tx)?;
        let at = encode_dt(now());
        ops::detach_children(tx, kind, id, &at)?;
        ops::delete_row(tx, kind, id)?;
        ops::log_change(tx, kind, id, ChangeAction::Remove, &Map::new())
      })
      .await?;

    tracing::debug!(%kind, %id, "deleted record");
    Ok(())
  }
}

// ─── TalentStore impl ────────────────────────────────────────────────────────

impl TalentStore for SqliteStore {
  type Error = Error;

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn create<E: Entity>(&self, entity: E) -> Result<Record<E>> {
    self.insert_record(Uuid::new_v4(), entity).await
  }

  async fn create_with_id<E: Entity>(&self, id: Uuid, entity: E) -> Result<Record<E>> {
    self.insert_record(id, entity).await
  }

  async fn replace<E: Entity>(&self, id: Uuid, entity: E) -> Result<Record<E>> {
    self.replace_guarded(id, entity, |_: &Record<E>| true).await
  }

  async fn delete(&self, kind: ResourceKind, id: Uuid) -> Result<()> {
    self.delete_guarded(kind, id, |_| Ok(())).await
  }

  async fn replace_if<E, P>(&self, id: Uuid, entity: E, precondition: P) -> Result<Record<E>>
  where
    E: Entity,
    P: FnOnce(&Record<E>) -> bool + Send + 'static,
  {
    self.replace_guarded(id, entity, precondition).await
  }

  async fn delete_if<E, P>(&self, id: Uuid, precondition: P) -> Result<()>
  where
    E: Entity,
    P: FnOnce(&Record<E>) -> bool + Send + 'static,
  {
    self
      .delete_guarded(E::KIND, id, move |conn| guard::<E, _>(conn, id, precondition))
      .await
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn get<E: Entity>(&self, id: Uuid) -> Result<Option<Record<E>>> {
    let value = self.read(move |conn| ops::materialize(conn, E::KIND, id)).await?;
    Ok(value.map(serde_json::from_value).transpose()?)
  }

  async fn exists(&self, kind: ResourceKind, id: Uuid) -> Result<bool> {
    self.read(move |conn| ops::exists(conn, kind, id)).await
  }

  async fn list<'a, E: Entity>(&'a self, query: &'a ListQuery) -> Result<Vec<Record<E>>> {
    let query = query.clone();
    let values = self.read(move |conn| ops::list(conn, E::KIND, &query)).await?;
    values
      .into_iter()
      .map(|v| serde_json::from_value(v).map_err(Error::from))
      .collect()
  }

  // ── History ───────────────────────────────────────────────────────────────

  async fn change_log(&self, kind: ResourceKind, id: Uuid) -> Result<Vec<ChangeLogEntry>> {
    self
      .read(move |conn| {
        if !ops::exists(conn, kind, id)? {
          return Err(not_found(kind, id));
        }
        ops::change_log(conn, kind, id)
      })
      .await
  }

  async fn audit_trail(&self, kind: ResourceKind, id: Uuid) -> Result<Vec<AuditTrailEntry>> {
    self
      .read(move |conn| {
        if !ops::exists(conn, kind, id)? {
          return Err(not_found(kind, id));
        }
        ops::audit_trail(conn, kind, id)
      })
      .await
  }

  async fn record_audit(&self, entry: NewAuditEntry) -> Result<AuditTrailEntry> {
    self.write(move |tx| ops::insert_audit(tx, entry)).await
  }
}
