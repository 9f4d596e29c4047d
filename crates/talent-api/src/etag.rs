//! ETag computation and conditional-request matching.
//!
//! An ETag is the SHA-256 over a record's id, its modification instant and
//! its full JSON body, so any change visible to a client changes the tag.

use axum::http::{HeaderMap, HeaderName, header};
use sha2::{Digest, Sha256};
use talent_core::{Entity, Record};

use crate::error::ApiError;

/// Compute the quoted strong ETag for `record`.
pub fn compute_etag<E: Entity>(record: &Record<E>) -> Result<String, ApiError> {
  let body = serde_json::to_vec(record).map_err(|e| ApiError::Store(Box::new(e)))?;

  let mut hasher = Sha256::new();
  hasher.update(record.id.as_bytes());
  hasher.update(record.date_modified.timestamp_micros().to_le_bytes());
  hasher.update(&body);
  Ok(format!("\"{}\"", hex::encode(hasher.finalize())))
}

/// Remove surrounding quotes and a weak `W/` prefix.
pub fn strip_etag_quotes(tag: &str) -> &str {
  let tag = tag.trim();
  let tag = tag.strip_prefix("W/").unwrap_or(tag);
  tag.trim_matches('"')
}

/// Whether a conditional header value (`*` or a list of tags) matches `etag`.
pub fn matches(header_value: &str, etag: &str) -> bool {
  let etag = strip_etag_quotes(etag);
  header_value
    .split(',')
    .map(str::trim)
    .any(|candidate| candidate == "*" || strip_etag_quotes(candidate) == etag)
}

fn header_matches(headers: &HeaderMap, name: HeaderName, etag: &str) -> Option<bool> {
  headers
    .get(name)
    .and_then(|v| v.to_str().ok())
    .map(|v| matches(v, etag))
}

/// `If-Match` precondition: absent passes, a non-matching value fails.
pub fn check_if_match(headers: &HeaderMap, etag: &str) -> Result<(), ApiError> {
  match header_matches(headers, header::IF_MATCH, etag) {
    Some(false) => Err(ApiError::PreconditionFailed),
    _ => Ok(()),
  }
}

/// The raw `If-Match` value, if the request carries one.
pub fn if_match(headers: &HeaderMap) -> Option<String> {
  headers
    .get(header::IF_MATCH)
    .and_then(|v| v.to_str().ok())
    .map(str::to_owned)
}

/// Whether `record` still carries a tag listed in an `If-Match` value.
pub fn satisfies<E: Entity>(if_match: &str, record: &Record<E>) -> bool {
  compute_etag(record).is_ok_and(|etag| matches(if_match, &etag))
}

/// `If-None-Match`: true when the client's copy is current.
pub fn not_modified(headers: &HeaderMap, etag: &str) -> bool {
  header_matches(headers, header::IF_NONE_MATCH, etag).unwrap_or(false)
}
