//! Core types, domain catalog, and persistent collections for rexq.
//!
//! This crate provides:
//! - [`Type`] - Inferred types with cardinality (`T`, `?T`, `[T]`)
//! - [`Domain`] - The read-only catalog of entities and aggregates
//! - [`Key`] / [`KeyPath`] - Structural addresses inside query trees
//! - [`Error`] - Structural error types with context
//! - Persistent collections ([`QVec`], [`QMap`], [`FieldMap`])

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod collections;
pub mod domain;
pub mod error;
pub mod path;
pub mod types;

pub use collections::{FieldMap, QMap, QVec};
#[cfg(feature = "serde")]
pub use domain::{AttributeSpec, Catalog, EntitySpec};
pub use domain::{AggregateDef, AttributeDef, Domain, DomainBuilder, EntityDef};
pub use error::{Error, ErrorContext, ErrorKind, Result};
pub use path::{Key, KeyPath, display_path};
pub use types::{Atom, Cardinality, Type, least_upper_bound};
