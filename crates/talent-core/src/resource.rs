//! Resource kinds, the [`Entity`] trait and the persisted [`Record`]
//! envelope.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::{Error, validate::Validate};

// ─── ResourceKind ────────────────────────────────────────────────────────────

/// Every entity type exposed by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
  Employee,
  JobPosting,
  Skill,
  Competence,
  Goal,
  Interest,
  JobFunction,
  Contract,
  Education,
  Application,
}

impl ResourceKind {
  pub const ALL: [ResourceKind; 10] = [
    Self::Employee,
    Self::JobPosting,
    Self::Skill,
    Self::Competence,
    Self::Goal,
    Self::Interest,
    Self::JobFunction,
    Self::Contract,
    Self::Education,
    Self::Application,
  ];

  /// The URL path segment and SQL table name for this kind.
  pub fn collection(self) -> &'static str {
    match self {
      Self::Employee => "employees",
      Self::JobPosting => "job_postings",
      Self::Skill => "skills",
      Self::Competence => "competences",
      Self::Goal => "goals",
      Self::Interest => "interests",
      Self::JobFunction => "job_functions",
      Self::Contract => "contracts",
      Self::Education => "educations",
      Self::Application => "applications",
    }
  }

  /// The discriminant stored in the change-log and audit-trail tables.
  /// Must match the `rename_all = "snake_case"` serde tags above.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Employee => "employee",
      Self::JobPosting => "job_posting",
      Self::Skill => "skill",
      Self::Competence => "competence",
      Self::Goal => "goal",
      Self::Interest => "interest",
      Self::JobFunction => "job_function",
      Self::Contract => "contract",
      Self::Education => "education",
      Self::Application => "application",
    }
  }

  /// Look a kind up by its collection segment (`"job_postings"`).
  pub fn from_collection(segment: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|k| k.collection() == segment)
  }
}

impl fmt::Display for ResourceKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for ResourceKind {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .into_iter()
      .find(|k| k.as_str() == s)
      .ok_or_else(|| Error::UnknownCollection(s.to_owned()))
  }
}

// ─── Entity ──────────────────────────────────────────────────────────────────

/// A writable entity shape: its attributes plus its relation fields as they
/// appear on the wire.
///
/// Owning-side relation fields (`employee` on a skill) are plain
/// `Option<Uuid>`; `None` clears the link. Inverse-side fields (`skills` on an
/// employee) are `Option<..>` with `skip_serializing_if`; `None` leaves the
/// existing links untouched. The field names must match the entries in
/// [`crate::relation::RELATIONS`].
pub trait Entity:
  Serialize + DeserializeOwned + Validate + Clone + fmt::Debug + Send + Sync + 'static
{
  const KIND: ResourceKind;

  /// Absolute URLs into external registries, keyed by property name.
  fn external_references(&self) -> Vec<(&'static str, &str)> { Vec::new() }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// A persisted entity together with its server-assigned identity and
/// timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "E: Entity")]
pub struct Record<E> {
  pub id:            Uuid,
  #[serde(flatten)]
  pub entity:        E,
  pub date_created:  DateTime<Utc>,
  pub date_modified: DateTime<Utc>,
}

impl<E> std::ops::Deref for Record<E> {
  type Target = E;

  fn deref(&self) -> &E { &self.entity }
}
