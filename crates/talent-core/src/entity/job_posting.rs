use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  entity::{LONG_TEXT, SHORT_TEXT, WEEK_HOURS},
  resource::{Entity, ResourceKind},
  validate::{Validate, Violations},
};

/// The type of employment offered by a posting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmploymentType {
  #[default]
  FullTime,
  PartTime,
  Temporary,
  Seasonal,
  Internship,
}

/// A vacancy published by a hiring organisation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobPosting {
  pub name:                   String,
  pub title:                  String,
  pub description:            Option<String>,
  pub employment_type:        EmploymentType,
  #[serde(default)]
  pub education_requirements: Vec<String>,
  pub summary:                Option<String>,
  pub base_salary:            Option<i64>,
  /// ISO 4217 currency code, e.g. `EUR`.
  pub salary_currency:        Option<String>,
  /// Where the work happens, e.g. `TELECOMMUTE` or a city name.
  pub job_location_type:      String,
  /// Absolute URL of the hiring organisation in the external registry.
  pub hiring_organization:    Option<String>,
  pub job_start_date:         DateTime<Utc>,
  /// End of the application window.
  pub valid_through:          Option<DateTime<Utc>>,
  pub standard_hours:         i64,

  /// Owning side of the one-to-one link with the employee hired through this
  /// posting.
  #[serde(default)]
  pub employee:     Option<Uuid>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub applications: Option<Vec<Uuid>>,
}

impl Validate for JobPosting {
  fn validate(&self) -> Result<(), Violations> {
    let mut v = Violations::new();
    v.not_blank("name", &self.name)
      .max_len("name", Some(&self.name), SHORT_TEXT)
      .not_blank("title", &self.title)
      .max_len("title", Some(&self.title), SHORT_TEXT)
      .max_len("description", self.description.as_deref(), LONG_TEXT)
      .max_len("summary", self.summary.as_deref(), SHORT_TEXT)
      .max_len("salary_currency", self.salary_currency.as_deref(), SHORT_TEXT)
      .not_blank("job_location_type", &self.job_location_type)
      .max_len("job_location_type", Some(&self.job_location_type), SHORT_TEXT)
      .max_len("hiring_organization", self.hiring_organization.as_deref(), SHORT_TEXT)
      .url("hiring_organization", self.hiring_organization.as_deref())
      .range("base_salary", self.base_salary, 0, i64::MAX)
      .range("standard_hours", Some(self.standard_hours), 0, WEEK_HOURS)
      .instant_order("valid_through", Some(self.job_start_date), self.valid_through);
    for (i, req) in self.education_requirements.iter().enumerate() {
      v.max_len(&format!("education_requirements[{i}]"), Some(req), SHORT_TEXT);
    }
    v.into_result()
  }
}

impl Entity for JobPosting {
  const KIND: ResourceKind = ResourceKind::JobPosting;

  fn external_references(&self) -> Vec<(&'static str, &str)> {
    self
      .hiring_organization
      .as_deref()
      .map(|url| vec![("hiring_organization", url)])
      .unwrap_or_default()
  }
}
