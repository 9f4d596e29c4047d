//! Employment-history entities: functions held, contracts, education and
//! applications to postings.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  entity::{DESCRIPTION_TEXT, LONG_TEXT, SHORT_TEXT, WEEK_HOURS},
  resource::{Entity, ResourceKind},
  validate::{Validate, Violations},
};

/// A role an employee fulfils within their organisation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobFunction {
  pub name:         String,
  pub description:  Option<String>,
  pub salary_scale: Option<String>,
  #[serde(default)]
  pub employee:     Option<Uuid>,
}

impl Validate for JobFunction {
  fn validate(&self) -> Result<(), Violations> {
    let mut v = Violations::new();
    v.not_blank("name", &self.name)
      .max_len("name", Some(&self.name), SHORT_TEXT)
      .max_len("description", self.description.as_deref(), DESCRIPTION_TEXT)
      .max_len("salary_scale", self.salary_scale.as_deref(), SHORT_TEXT);
    v.into_result()
  }
}

impl Entity for JobFunction {
  const KIND: ResourceKind = ResourceKind::JobFunction;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Contract {
  pub description:    Option<String>,
  pub start_date:     NaiveDate,
  pub end_date:       Option<NaiveDate>,
  pub hours_per_week: Option<i64>,
  #[serde(default)]
  pub employee:       Option<Uuid>,
}

impl Validate for Contract {
  fn validate(&self) -> Result<(), Violations> {
    let mut v = Violations::new();
    v.max_len("description", self.description.as_deref(), DESCRIPTION_TEXT)
      .date_order("end_date", Some(self.start_date), self.end_date)
      .range("hours_per_week", self.hours_per_week, 0, WEEK_HOURS);
    v.into_result()
  }
}

impl Entity for Contract {
  const KIND: ResourceKind = ResourceKind::Contract;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Education {
  pub name:        String,
  pub description: Option<String>,
  pub institution: Option<String>,
  pub start_date:  Option<NaiveDate>,
  pub end_date:    Option<NaiveDate>,
  #[serde(default)]
  pub employee:    Option<Uuid>,
}

impl Validate for Education {
  fn validate(&self) -> Result<(), Violations> {
    let mut v = Violations::new();
    v.not_blank("name", &self.name)
      .max_len("name", Some(&self.name), SHORT_TEXT)
      .max_len("description", self.description.as_deref(), DESCRIPTION_TEXT)
      .max_len("institution", self.institution.as_deref(), SHORT_TEXT)
      .date_order("end_date", self.start_date, self.end_date);
    v.into_result()
  }
}

impl Entity for Education {
  const KIND: ResourceKind = ResourceKind::Education;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
  #[default]
  Submitted,
  Accepted,
  Rejected,
  Withdrawn,
}

/// An employee applying to a job posting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Application {
  #[serde(default)]
  pub status:      ApplicationStatus,
  pub motivation:  Option<String>,
  #[serde(default)]
  pub employee:    Option<Uuid>,
  #[serde(default)]
  pub job_posting: Option<Uuid>,
}

impl Validate for Application {
  fn validate(&self) -> Result<(), Violations> {
    let mut v = Violations::new();
    v.max_len("motivation", self.motivation.as_deref(), LONG_TEXT);
    v.into_result()
  }
}

impl Entity for Application {
  const KIND: ResourceKind = ResourceKind::Application;
}
