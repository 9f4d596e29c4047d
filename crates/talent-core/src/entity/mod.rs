//! The concrete entity shapes.
//!
//! Field names and constraints mirror the public API. Relation fields follow
//! the conventions documented on [`crate::Entity`].

mod career;
mod employee;
mod job_posting;
mod profile;

pub use career::{Application, ApplicationStatus, Contract, Education, JobFunction};
pub use employee::Employee;
pub use job_posting::{EmploymentType, JobPosting};
pub use profile::{Competence, Goal, Interest, Skill};

/// Upper bound for short free-text fields.
pub const SHORT_TEXT: usize = 255;
/// Upper bound for descriptive free-text fields.
pub const DESCRIPTION_TEXT: usize = 2550;
/// Upper bound for long-form prose such as posting descriptions.
pub const LONG_TEXT: usize = 7500;
/// Hours in a week; upper bound for any hours-per-week figure.
pub const WEEK_HOURS: i64 = 168;
