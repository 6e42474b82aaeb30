//! Query model for rexq: an immutable tree of query combinators.
//!
//! This crate provides:
//! - [`ast`] - Query nodes, their typing context, and structural addressing
//! - [`infer`] - Single-pass type inference against a domain
//! - [`pointer`] - Zipper pointers that survive edits by rebasing
//! - [`ops`] - Pure edit operators and `commit`
//! - [`normalize`] - Canonicalization with selection relocation
//! - [`translate`] - The S-expression wire form
//! - [`pretty`] - The textual mini-language form
//! - [`visitor`] / [`diagnostics`] - Traversal and type error explanations

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod ast;
pub mod diagnostics;
pub mod infer;
pub mod normalize;
pub mod ops;
pub mod pointer;
pub mod pretty;
pub mod translate;
pub mod visitor;


pub use ast::{BinaryOp, Binding, Context, Literal, Query, QueryKind};
pub use diagnostics::{TypeError, TypeErrorKind, type_errors};
pub use infer::{infer_type, infer_type_step};
pub use normalize::{Normalized, normalize, normalize_query};
pub use ops::{
    Edit, commit, cut, grow_navigation, grow_navigation_at, grow_select, insert_after,
    insert_before, remove, replace,
};
pub use pointer::{Link, QueryPointer};
pub use pretty::{PrettyConfig, pretty_print, pretty_print_with_config};
pub use translate::translate;
pub use visitor::{QueryVisitor, walk_query};
