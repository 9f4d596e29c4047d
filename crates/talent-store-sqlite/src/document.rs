//! Splitting a serialised entity into its stored parts and joining them back.
//!
//! An entity's JSON object is divided three ways: plain attributes (kept as a
//! JSON blob), owning relation fields (kept in foreign-key columns) and
//! inverse relation fields (never stored; applied to the owning side and
//! derived again on read).

use serde_json::{Map, Value};
use talent_core::{
  ResourceKind,
  relation::{self, Cardinality, Relation},
};
use uuid::Uuid;

use crate::{Error, Result};

/// What a write asks for on the inverse side of one relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InverseValue {
  /// The complete set of children that should point at the record.
  Many(Vec<Uuid>),
  /// The single owner that should point at the record, or none.
  One(Option<Uuid>),
}

impl InverseValue {
  pub fn ids(&self) -> Vec<Uuid> {
    match self {
      Self::Many(ids) => ids.clone(),
      Self::One(id) => id.iter().copied().collect(),
    }
  }
}

/// An entity's JSON object, taken apart for storage.
#[derive(Debug, Clone)]
pub struct Document {
  pub kind:       ResourceKind,
  pub attributes: Map<String, Value>,
  pub owners:     Vec<(&'static Relation, Option<Uuid>)>,
  /// Only the inverse fields present in the input; absent ones are untouched.
  pub inverses:   Vec<(&'static Relation, InverseValue)>,
}

impl Document {
  pub fn split(kind: ResourceKind, value: Value) -> Result<Self> {
    let Value::Object(mut attributes) = value else {
      return Err(Error::Corrupt(format!("{kind} did not serialise to an object")));
    };

    let mut owners = Vec::new();
    for rel in relation::owned_by(kind) {
      let id = match attributes.remove(rel.field) {
        None | Some(Value::Null) => None,
        Some(v) => Some(uuid_from(&v)?),
      };
      owners.push((rel, id));
    }

    let mut inverses = Vec::new();
    for rel in relation::targeting(kind) {
      let Some(v) = attributes.remove(rel.inverse) else { continue };
      let value = match rel.cardinality {
        Cardinality::ManyToOne => match v {
          Value::Null => InverseValue::Many(Vec::new()),
          Value::Array(items) => {
            InverseValue::Many(items.iter().map(uuid_from).collect::<Result<_>>()?)
          }
          other => return Err(Error::Corrupt(format!("{}: expected a list, got {other}", rel.inverse))),
        },
        Cardinality::OneToOne => match v {
          Value::Null => InverseValue::One(None),
          other => InverseValue::One(Some(uuid_from(&other)?)),
        },
      };
      inverses.push((rel, value));
    }

    Ok(Self { kind, attributes, owners, inverses })
  }

  /// The owning link for `rel`, if this document carries one.
  pub fn owner(&self, rel: &Relation) -> Option<Uuid> {
    self.owners.iter().find(|(r, _)| *r == rel).and_then(|(_, id)| *id)
  }

  /// Attributes plus owning fields: the part of a record that has history.
  pub fn versioned(&self) -> Map<String, Value> {
    versioned_view(&self.attributes, &self.owners)
  }
}

/// Merge owning relation fields back into a copy of `attributes`.
pub fn versioned_view(
  attributes: &Map<String, Value>,
  owners: &[(&'static Relation, Option<Uuid>)],
) -> Map<String, Value> {
  let mut out = attributes.clone();
  for (rel, id) in owners {
    out.insert(rel.field.to_owned(), uuid_value(*id));
  }
  out
}

pub fn uuid_value(id: Option<Uuid>) -> Value {
  match id {
    Some(id) => Value::String(id.hyphenated().to_string()),
    None => Value::Null,
  }
}

fn uuid_from(v: &Value) -> Result<Uuid> {
  match v {
    Value::String(s) => Ok(Uuid::parse_str(s)?),
    other => Err(Error::Corrupt(format!("expected a uuid string, got {other}"))),
  }
}
