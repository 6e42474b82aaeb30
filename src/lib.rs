//! rexq - the query model of a visual query builder
//!
//! This crate re-exports all layers of the rexq system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 1: rexq_query      - AST, inference, pointers, edits, normalization, translation
//! Layer 0: rexq_foundation - Types, domain catalog, key paths, collections, errors
//! ```

pub use rexq_foundation as foundation;
pub use rexq_query as query;
