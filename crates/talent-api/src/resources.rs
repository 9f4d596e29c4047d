//! Generic handlers shared by every resource collection.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/{collection}` | filters, ordering and pagination, see [`crate::query`] |
//! | `POST`   | `/{collection}` | 201 with `ETag` |
//! | `GET`    | `/{collection}/{id}` | `ETag`; 304 on matching `If-None-Match` |
//! | `PUT`    | `/{collection}/{id}` | full replacement; honours `If-Match` |
//! | `DELETE` | `/{collection}/{id}` | 204; honours `If-Match` |
//! | `GET`    | `/{collection}/{id}/change_log` | oldest first |
//! | `GET`    | `/{collection}/{id}/audit_trail` | oldest first |

use axum::{
  Json,
  extract::{Path, Query, State, rejection::JsonRejection},
  http::{HeaderMap, StatusCode, header},
  response::{IntoResponse, Response},
};
use talent_core::{
  Entity, Record,
  history::{AuditTrailEntry, ChangeLogEntry},
  store::TalentStore,
};
use uuid::Uuid;

use crate::{
  AppState,
  error::ApiError,
  etag::{check_if_match, compute_etag, if_match, not_modified, satisfies},
  query::parse_list_query,
  references,
};

fn body<E: Entity>(payload: Result<Json<E>, JsonRejection>) -> Result<E, ApiError> {
  payload.map(|Json(e)| e).map_err(ApiError::from)
}

/// Validate `entity` and, when a registry is configured, its references.
async fn admit<S, E>(state: &AppState<S>, entity: &E) -> Result<(), ApiError>
where
  S: TalentStore + 'static,
  E: Entity,
{
  entity.validate()?;
  if let Some(client) = &state.commonground {
    references::verify(client, entity).await?;
  }
  Ok(())
}

async fn fetch<S, E>(state: &AppState<S>, id: Uuid) -> Result<Record<E>, ApiError>
where
  S: TalentStore + 'static,
  E: Entity,
{
  state
    .store
    .get::<E>(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("{} not found: {id}", E::KIND)))
}

fn with_etag<E: Entity>(status: StatusCode, record: Record<E>) -> Result<Response, ApiError> {
  let etag = compute_etag(&record)?;
  Ok((status, [(header::ETAG, etag)], Json(record)).into_response())
}

// ─── Collection ──────────────────────────────────────────────────────────────

/// `GET /{collection}`
pub async fn list<S, E>(
  State(state): State<AppState<S>>,
  Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<Record<E>>>, ApiError>
where
  S: TalentStore + 'static,
  E: Entity,
{
  let query = parse_list_query(E::KIND, &pairs)?;
  let records = state.store.list::<E>(&query).await.map_err(ApiError::from_store)?;
  Ok(Json(records))
}

/// `POST /{collection}`
pub async fn create<S, E>(
  State(state): State<AppState<S>>,
  payload: Result<Json<E>, JsonRejection>,
) -> Result<Response, ApiError>
where
  S: TalentStore + 'static,
  E: Entity,
{
  let entity = body(payload)?;
  admit(&state, &entity).await?;
  let record = state.store.create(entity).await.map_err(ApiError::from_store)?;
  tracing::info!(kind = %E::KIND, id = %record.id, "created");
  with_etag(StatusCode::CREATED, record)
}

// ─── Item ────────────────────────────────────────────────────────────────────

/// `GET /{collection}/{id}`
pub async fn get_one<S, E>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  headers: HeaderMap,
) -> Result<Response, ApiError>
where
  S: TalentStore + 'static,
  E: Entity,
{
  let record = fetch::<S, E>(&state, id).await?;
  let etag = compute_etag(&record)?;
  if not_modified(&headers, &etag) {
    return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response());
  }
  Ok(([(header::ETAG, etag)], Json(record)).into_response())
}

/// `PUT /{collection}/{id}`
pub async fn replace<S, E>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  headers: HeaderMap,
  payload: Result<Json<E>, JsonRejection>,
) -> Result<Response, ApiError>
where
  S: TalentStore + 'static,
  E: Entity,
{
  let current = fetch::<S, E>(&state, id).await?;
  check_if_match(&headers, &compute_etag(&current)?)?;

  let entity = body(payload)?;
  admit(&state, &entity).await?;
  // Re-checked inside the write transaction.
  let written = match if_match(&headers) {
    Some(tags) => {
      state
        .store
        .replace_if(id, entity, move |current: &Record<E>| satisfies(&tags, current))
        .await
    }
    None => state.store.replace(id, entity).await,
  };
  let record = written.map_err(ApiError::from_store)?;
  tracing::info!(kind = %E::KIND, %id, "replaced");
  with_etag(StatusCode::OK, record)
}

/// `DELETE /{collection}/{id}`
pub async fn delete<S, E>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  headers: HeaderMap,
) -> Result<StatusCode, ApiError>
where
  S: TalentStore + 'static,
  E: Entity,
{
  let deleted = match if_match(&headers) {
    Some(tags) => {
      state
        .store
        .delete_if::<E, _>(id, move |current: &Record<E>| satisfies(&tags, current))
        .await
    }
    None => state.store.delete(E::KIND, id).await,
  };
  deleted.map_err(ApiError::from_store)?;
  tracing::info!(kind = %E::KIND, %id, "deleted");
  Ok(StatusCode::NO_CONTENT)
}

// ─── History ─────────────────────────────────────────────────────────────────

/// `GET /{collection}/{id}/change_log`
pub async fn change_log<S, E>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<ChangeLogEntry>>, ApiError>
where
  S: TalentStore + 'static,
  E: Entity,
{
  let entries = state.store.change_log(E::KIND, id).await.map_err(ApiError::from_store)?;
  Ok(Json(entries))
}

/// `GET /{collection}/{id}/audit_trail`
pub async fn audit_trail<S, E>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<AuditTrailEntry>>, ApiError>
where
  S: TalentStore + 'static,
  E: Entity,
{
  let entries = state.store.audit_trail(E::KIND, id).await.map_err(ApiError::from_store)?;
  Ok(Json(entries))
}
