//! Query-string parsing for collection listings.
//!
//! | Parameter | Meaning |
//! |-----------|---------|
//! | `employee=<uuid>`, `job_posting=<uuid>` | owning-relation filter |
//! | `<field>=<value>` | exact match on a stored attribute |
//! | `order[<field>]=asc\|desc` | sort, applied in the given order |
//! | `date_created[after]=<rfc3339>` | also `before`, `strictly_after`, `strictly_before`, and `date_modified[..]` |
//! | `page`, `items_per_page` | 1-based pagination, 30 per page by default, at most 100 |

use chrono::{DateTime, Utc};
use talent_core::{
  ResourceKind, relation,
  store::{DateBound, DateOp, FilterValue, ListQuery, SortDirection, Timestamp},
};
use uuid::Uuid;

use crate::error::ApiError;

pub const DEFAULT_ITEMS_PER_PAGE: usize = 30;
pub const MAX_ITEMS_PER_PAGE: usize = 100;

/// Split `name[arg]` into `("name", Some("arg"))`.
fn bracketed(key: &str) -> Result<(&str, Option<&str>), ApiError> {
  let Some((name, rest)) = key.split_once('[') else { return Ok((key, None)) };
  let arg = rest
    .strip_suffix(']')
    .filter(|a| !a.is_empty() && !a.contains(['[', ']']))
    .ok_or_else(|| ApiError::BadRequest(format!("malformed parameter {key:?}")))?;
  Ok((name, Some(arg)))
}

fn positive(key: &str, value: &str) -> Result<usize, ApiError> {
  value
    .parse::<usize>()
    .ok()
    .filter(|n| *n > 0)
    .ok_or_else(|| ApiError::BadRequest(format!("{key} must be a positive integer")))
}

/// Build a [`ListQuery`] for `kind` from raw query pairs.
pub fn parse_list_query(kind: ResourceKind, pairs: &[(String, String)]) -> Result<ListQuery, ApiError> {
  let mut query = ListQuery::default();
  let mut page = 1;
  let mut per_page = DEFAULT_ITEMS_PER_PAGE;

  for (key, value) in pairs {
    match bracketed(key)? {
      ("page", None) => page = positive(key, value)?,
      ("items_per_page", None) => {
        per_page = positive(key, value)?;
        if per_page > MAX_ITEMS_PER_PAGE {
          return Err(ApiError::BadRequest(format!(
            "items_per_page must not exceed {MAX_ITEMS_PER_PAGE}"
          )));
        }
      }
      ("order", Some(field)) => {
        let direction = match value.to_ascii_lowercase().as_str() {
          "asc" => SortDirection::Asc,
          "desc" => SortDirection::Desc,
          other => return Err(ApiError::BadRequest(format!("unknown sort direction {other:?}"))),
        };
        query.order.push((field.to_owned(), direction));
      }
      (name, Some(op)) => {
        let field = Timestamp::parse(name)
          .ok_or_else(|| ApiError::BadRequest(format!("{name} does not support range filters")))?;
        let op = DateOp::parse(op)
          .ok_or_else(|| ApiError::BadRequest(format!("unknown date operator {op:?}")))?;
        let at = DateTime::parse_from_rfc3339(value)
          .map_err(|e| ApiError::BadRequest(format!("{key}: {e}")))?
          .with_timezone(&Utc);
        query.date_bounds.push(DateBound { field, op, at });
      }
      (name, None) if relation::owning_field(kind, name).is_some() => {
        let id = Uuid::parse_str(value)
          .map_err(|e| ApiError::BadRequest(format!("{name}: {e}")))?;
        query.relations.push((name.to_owned(), id));
      }
      (name, None) => query.attributes.push((name.to_owned(), FilterValue::parse(value))),
    }
  }

  query.limit = Some(per_page);
  query.offset = Some((page - 1).saturating_mul(per_page));
  Ok(query)
}
