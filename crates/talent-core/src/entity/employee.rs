use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  entity::SHORT_TEXT,
  resource::{Entity, ResourceKind},
  validate::{Validate, Violations},
};

/// A human with goals, skills and interests. Not necessarily on the payroll:
/// students and interns are employees too.
///
/// Identity lives in the external registry; `person` and `organization` are
/// absolute URLs into it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Employee {
  /// The person that is employed.
  pub person:                 String,
  /// The organisation where this person is employed.
  pub organization:           Option<String>,
  #[serde(default)]
  pub has_police_certificate: bool,

  // ── Inverse side ────────────────────────────────────────────────────────
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub goals:         Option<Vec<Uuid>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub interests:     Option<Vec<Uuid>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub competencies:  Option<Vec<Uuid>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub skills:        Option<Vec<Uuid>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub job_functions: Option<Vec<Uuid>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub contracts:     Option<Vec<Uuid>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub applications:  Option<Vec<Uuid>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub educations:    Option<Vec<Uuid>>,
  /// The posting this employee was hired through.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub job_posting:   Option<Uuid>,
}

impl Employee {
  pub fn new(person: impl Into<String>) -> Self {
    Self { person: person.into(), ..Self::default() }
  }
}

impl Validate for Employee {
  fn validate(&self) -> Result<(), Violations> {
    let mut v = Violations::new();
    v.not_blank("person", &self.person)
      .max_len("person", Some(&self.person), SHORT_TEXT)
      .url("person", Some(&self.person))
      .max_len("organization", self.organization.as_deref(), SHORT_TEXT)
      .url("organization", self.organization.as_deref());
    v.into_result()
  }
}

impl Entity for Employee {
  const KIND: ResourceKind = ResourceKind::Employee;

  fn external_references(&self) -> Vec<(&'static str, &str)> {
    let mut refs = vec![("person", self.person.as_str())];
    if let Some(org) = &self.organization {
      refs.push(("organization", org.as_str()));
    }
    refs
  }
}
