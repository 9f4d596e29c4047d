//! Declarative relation metadata.
//!
//! Every bidirectional association is listed once. The *owner* stores the
//! foreign key in `column`; the *target* exposes the association through a
//! derived `inverse` field. Backends keep both sides consistent by treating
//! the owning column as the only source of truth.

use crate::resource::ResourceKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
  /// Many owners may point at the same target; the inverse is a list.
  ManyToOne,
  /// At most one owner may point at a given target; the inverse is a single
  /// optional id.
  OneToOne,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relation {
  pub owner:       ResourceKind,
  /// Wire name of the owning field, e.g. `"employee"`.
  pub field:       &'static str,
  /// Foreign-key column on the owner's table, e.g. `"employee_id"`.
  pub column:      &'static str,
  pub target:      ResourceKind,
  /// Wire name of the inverse field on the target, e.g. `"skills"`.
  pub inverse:     &'static str,
  pub cardinality: Cardinality,
}

const fn employee_child(owner: ResourceKind, inverse: &'static str) -> Relation {
  Relation {
    owner,
    field: "employee",
    column: "employee_id",
    target: ResourceKind::Employee,
    inverse,
    cardinality: Cardinality::ManyToOne,
  }
}

/// All relations known to the service.
pub const RELATIONS: &[Relation] = &[
  employee_child(ResourceKind::Goal, "goals"),
  employee_child(ResourceKind::Interest, "interests"),
  employee_child(ResourceKind::Competence, "competencies"),
  employee_child(ResourceKind::Skill, "skills"),
  employee_child(ResourceKind::JobFunction, "job_functions"),
  employee_child(ResourceKind::Contract, "contracts"),
  employee_child(ResourceKind::Education, "educations"),
  employee_child(ResourceKind::Application, "applications"),
  Relation {
    owner:       ResourceKind::Application,
    field:       "job_posting",
    column:      "job_posting_id",
    target:      ResourceKind::JobPosting,
    inverse:     "applications",
    cardinality: Cardinality::ManyToOne,
  },
  Relation {
    owner:       ResourceKind::JobPosting,
    field:       "employee",
    column:      "employee_id",
    target:      ResourceKind::Employee,
    inverse:     "job_posting",
    cardinality: Cardinality::OneToOne,
  },
];

/// Relations whose foreign key lives on `kind`.
pub fn owned_by(kind: ResourceKind) -> impl Iterator<Item = &'static Relation> {
  RELATIONS.iter().filter(move |r| r.owner == kind)
}

/// Relations that `kind` sees from the inverse side.
pub fn targeting(kind: ResourceKind) -> impl Iterator<Item = &'static Relation> {
  RELATIONS.iter().filter(move |r| r.target == kind)
}

/// The owning relation on `kind` whose wire field is `field`.
pub fn owning_field(kind: ResourceKind, field: &str) -> Option<&'static Relation> {
  owned_by(kind).find(|r| r.field == field)
}

#[cfg(test)]
mod tests {
  use std::collections::HashSet;

  use super::*;

  #[test]
  fn inverse_names_are_unique_per_target() {
    for kind in ResourceKind::ALL {
      let mut seen = HashSet::new();
      for rel in targeting(kind) {
        assert!(seen.insert(rel.inverse), "duplicate inverse {} on {kind}", rel.inverse);
      }
    }
  }

  #[test]
  fn owning_fields_are_unique_per_owner() {
    for kind in ResourceKind::ALL {
      let mut seen = HashSet::new();
      for rel in owned_by(kind) {
        assert!(seen.insert(rel.field), "duplicate field {} on {kind}", rel.field);
      }
    }
  }

  #[test]
  fn employee_has_every_child_collection() {
    let inverses: Vec<_> = targeting(ResourceKind::Employee).map(|r| r.inverse).collect();
    for name in [
      "goals",
      "interests",
      "competencies",
      "skills",
      "job_functions",
      "contracts",
      "educations",
      "applications",
      "job_posting",
    ] {
      assert!(inverses.contains(&name), "missing {name}");
    }
  }

  #[test]
  fn application_owns_two_relations() {
    assert!(owning_field(ResourceKind::Application, "employee").is_some());
    assert!(owning_field(ResourceKind::Application, "job_posting").is_some());
    assert!(owning_field(ResourceKind::Skill, "job_posting").is_none());
  }
}
