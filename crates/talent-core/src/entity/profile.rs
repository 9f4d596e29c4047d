//! Personal profile entities: what an employee can do and wants to do.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  entity::{DESCRIPTION_TEXT, SHORT_TEXT},
  resource::{Entity, ResourceKind},
  validate::{Validate, Violations},
};

/// A practical ability, e.g. a programming language, with a level.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Skill {
  pub name:        String,
  pub description: Option<String>,
  /// Free-text proficiency, e.g. `beginner`.
  pub level:       Option<String>,
  #[serde(default)]
  pub employee:    Option<Uuid>,
}

impl Validate for Skill {
  fn validate(&self) -> Result<(), Violations> {
    let mut v = Violations::new();
    v.not_blank("name", &self.name)
      .max_len("name", Some(&self.name), SHORT_TEXT)
      .max_len("description", self.description.as_deref(), DESCRIPTION_TEXT)
      .max_len("level", self.level.as_deref(), SHORT_TEXT);
    v.into_result()
  }
}

impl Entity for Skill {
  const KIND: ResourceKind = ResourceKind::Skill;
}

/// A behavioural trait, e.g. teamwork, with a grade.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Competence {
  pub name:        String,
  pub description: Option<String>,
  pub grade:       Option<String>,
  #[serde(default)]
  pub employee:    Option<Uuid>,
}

impl Validate for Competence {
  fn validate(&self) -> Result<(), Violations> {
    let mut v = Violations::new();
    v.not_blank("name", &self.name)
      .max_len("name", Some(&self.name), SHORT_TEXT)
      .max_len("description", self.description.as_deref(), DESCRIPTION_TEXT)
      .max_len("grade", self.grade.as_deref(), SHORT_TEXT);
    v.into_result()
  }
}

impl Entity for Competence {
  const KIND: ResourceKind = ResourceKind::Competence;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Goal {
  pub name:        String,
  pub description: Option<String>,
  pub target_date: Option<NaiveDate>,
  #[serde(default)]
  pub employee:    Option<Uuid>,
}

impl Validate for Goal {
  fn validate(&self) -> Result<(), Violations> {
    let mut v = Violations::new();
    v.not_blank("name", &self.name)
      .max_len("name", Some(&self.name), SHORT_TEXT)
      .max_len("description", self.description.as_deref(), DESCRIPTION_TEXT);
    v.into_result()
  }
}

impl Entity for Goal {
  const KIND: ResourceKind = ResourceKind::Goal;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Interest {
  pub name:        String,
  pub description: Option<String>,
  #[serde(default)]
  pub employee:    Option<Uuid>,
}

impl Validate for Interest {
  fn validate(&self) -> Result<(), Violations> {
    let mut v = Violations::new();
    v.not_blank("name", &self.name)
      .max_len("name", Some(&self.name), SHORT_TEXT)
      .max_len("description", self.description.as_deref(), DESCRIPTION_TEXT);
    v.into_result()
  }
}

impl Entity for Interest {
  const KIND: ResourceKind = ResourceKind::Interest;
}
