//! Core types and trait definitions for the talent data service.
//!
//! Entities, their declarative relation table, validation rules and the
//! [`store::TalentStore`] abstraction live here. The crate carries no HTTP or
//! database dependencies; every other crate depends on it.

pub mod entity;
pub mod error;
pub mod history;
pub mod relation;
pub mod resource;
pub mod store;
pub mod validate;

pub use error::{Error, Result};
pub use resource::{Entity, Record, ResourceKind};
