//! Integration tests for Layer 1: Query
//!
//! Tests for type inference, pointers, edit operators, normalization, and
//! translation into the wire form.

mod operations;
mod pointer;
mod translate;
