//! Field-level validation.
//!
//! Each entity implements [`Validate`] by running its fields through a
//! [`Violations`] collector. All failures are gathered before returning so a
//! client sees every offending property at once.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A single failed constraint on a property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
  pub property_path: String,
  pub message:       String,
}

/// An ordered set of constraint failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Violations(Vec<Violation>);

impl Violations {
  pub fn new() -> Self { Self::default() }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn iter(&self) -> impl Iterator<Item = &Violation> { self.0.iter() }

  /// Whether any violation was recorded against `property`.
  pub fn has(&self, property: &str) -> bool {
    self.0.iter().any(|v| v.property_path == property)
  }

  pub fn push(&mut self, property: &str, message: impl Into<String>) {
    self.0.push(Violation {
      property_path: property.to_owned(),
      message:       message.into(),
    });
  }

  pub fn extend(&mut self, other: Violations) { self.0.extend(other.0); }

  /// `Ok(())` when nothing was recorded, otherwise `Err(self)`.
  pub fn into_result(self) -> Result<(), Violations> {
    if self.is_empty() { Ok(()) } else { Err(self) }
  }

  // ── Constraints ───────────────────────────────────────────────────────────

  /// The value must contain at least one non-whitespace character.
  pub fn not_blank(&mut self, property: &str, value: &str) -> &mut Self {
    if value.trim().is_empty() {
      self.push(property, "This value should not be blank.");
    }
    self
  }

  /// The value must not exceed `max` characters.
  pub fn max_len(&mut self, property: &str, value: Option<&str>, max: usize) -> &mut Self {
    if let Some(v) = value
      && v.chars().count() > max
    {
      self.push(
        property,
        format!("This value is too long. It should have {max} characters or less."),
      );
    }
    self
  }

  /// The value must be an absolute `http` or `https` URL.
  pub fn url(&mut self, property: &str, value: Option<&str>) -> &mut Self {
    if let Some(v) = value
      && !is_http_url(v)
    {
      self.push(property, "This value is not a valid URL.");
    }
    self
  }

  /// The value must lie in `min..=max`.
  pub fn range(&mut self, property: &str, value: Option<i64>, min: i64, max: i64) -> &mut Self {
    if let Some(v) = value
      && !(min..=max).contains(&v)
    {
      self.push(property, format!("This value should be between {min} and {max}."));
    }
    self
  }

  /// `end` must not precede `start` when both are present.
  pub fn date_order(
    &mut self,
    property: &str,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
  ) -> &mut Self {
    if let (Some(s), Some(e)) = (start, end)
      && e < s
    {
      self.push(property, "This date should not be before the start date.");
    }
    self
  }

  /// Same as [`Self::date_order`] for instants.
  pub fn instant_order(
    &mut self,
    property: &str,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
  ) -> &mut Self {
    if let (Some(s), Some(e)) = (start, end)
      && e < s
    {
      self.push(property, "This date should not be before the start date.");
    }
    self
  }
}

impl fmt::Display for Violations {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut first = true;
    for v in &self.0 {
      if !first {
        f.write_str("; ")?;
      }
      write!(f, "{}: {}", v.property_path, v.message)?;
      first = false;
    }
    Ok(())
  }
}

impl IntoIterator for Violations {
  type Item = Violation;
  type IntoIter = std::vec::IntoIter<Violation>;

  fn into_iter(self) -> Self::IntoIter { self.0.into_iter() }
}

fn is_http_url(s: &str) -> bool {
  match url::Url::parse(s) {
    Ok(u) => matches!(u.scheme(), "http" | "https") && u.has_host(),
    Err(_) => false,
  }
}

/// Implemented by every writable entity.
pub trait Validate {
  /// Check field-level constraints. Relation targets are checked by the
  /// store, which knows which ids exist.
  fn validate(&self) -> Result<(), Violations>;
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn blank_and_whitespace_are_rejected() {
    let mut v = Violations::new();
    v.not_blank("name", "").not_blank("title", "   ").not_blank("ok", "x");
    assert_eq!(v.len(), 2);
    assert!(v.has("name"));
    assert!(v.has("title"));
    assert!(!v.has("ok"));
  }

  #[test]
  fn max_len_counts_characters_not_bytes() {
    let mut v = Violations::new();
    v.max_len("name", Some("ëëë"), 3);
    assert!(v.is_empty());
    v.max_len("name", Some("ëëëë"), 3);
    assert!(v.has("name"));
  }

  #[test]
  fn url_requires_http_scheme_and_host() {
    let mut v = Violations::new();
    v.url("a", Some("https://cc.zaakonline.nl/people/1"))
      .url("b", Some("not a url"))
      .url("c", Some("mailto:someone@example.com"))
      .url("d", None);
    assert!(!v.has("a"));
    assert!(v.has("b"));
    assert!(v.has("c"));
    assert!(!v.has("d"));
  }

  #[test]
  fn date_order_ignores_missing_bounds() {
    let d1 = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let d2 = NaiveDate::from_ymd_opt(2019, 1, 1).unwrap();
    let mut v = Violations::new();
    v.date_order("end_date", Some(d1), None);
    assert!(v.is_empty());
    v.date_order("end_date", Some(d1), Some(d2));
    assert!(v.has("end_date"));
  }

  #[test]
  fn display_joins_entries() {
    let mut v = Violations::new();
    v.push("a", "bad");
    v.push("b", "worse");
    assert_eq!(v.to_string(), "a: bad; b: worse");
  }
}
