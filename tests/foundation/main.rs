//! Integration tests for Layer 0: Foundation
//!
//! Tests for core types: Type, Domain, Key paths, Error, and persistent collections.

mod domain;
mod types;
