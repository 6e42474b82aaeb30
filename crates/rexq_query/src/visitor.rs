//! Read-only traversal of query trees.
//!
//! [`walk_query`] visits every node depth-first, in child order, and hands
//! each visitor method the key path of the node from the root.
//!
//! # Example
//!
//! ```
//! use rexq_foundation::Key;
//! use rexq_query::ast::{navigate, pipeline};
//! use rexq_query::visitor::{QueryVisitor, walk_query};
//!
//! struct Navigations(Vec<String>);
//!
//! impl QueryVisitor for Navigations {
//!     fn visit_navigate(&mut self, _path: &[Key], name: &str) {
//!         self.0.push(name.to_string());
//!     }
//! }
//!
//! let q = pipeline([navigate("individual"), navigate("code")]);
//! let mut names = Navigations(Vec::new());
//! walk_query(&mut names, &q);
//! assert_eq!(names.0, ["individual", "code"]);
//! ```

use rexq_foundation::{Key, KeyPath};

use crate::ast::{Binding, Literal, Query, QueryKind};

/// Trait for read-only query visitors.
///
/// The default implementations do nothing.
#[allow(unused_variables)]
pub trait QueryVisitor {
    /// Called when entering any node, before its children.
    fn enter_node(&mut self, path: &[Key], query: &Query) {}

    /// Called when leaving any node, after its children.
    fn leave_node(&mut self, path: &[Key], query: &Query) {}

    /// Visit a navigation.
    fn visit_navigate(&mut self, path: &[Key], name: &str) {}

    /// Visit an aggregate application.
    fn visit_aggregate(&mut self, path: &[Key], name: &str) {}

    /// Visit a literal.
    fn visit_literal(&mut self, path: &[Key], literal: &Literal) {}

    /// Visit a definition, before its bound query.
    fn visit_binding(&mut self, path: &[Key], binding: &Binding) {}
}

/// Walks `query` and its descendants, calling the visitor for each node.
pub fn walk_query<V: QueryVisitor>(visitor: &mut V, query: &Query) {
    let mut path = KeyPath::new();
    walk(visitor, &mut path, query);
}

fn walk<V: QueryVisitor>(visitor: &mut V, path: &mut KeyPath, query: &Query) {
    visitor.enter_node(path, query);

    match query.kind() {
        QueryKind::Navigate { path: name } => visitor.visit_navigate(path, name),
        QueryKind::Aggregate { name } => visitor.visit_aggregate(path, name),
        QueryKind::Value(literal) => visitor.visit_literal(path, literal),
        QueryKind::Define { binding } => visitor.visit_binding(path, binding),
        QueryKind::Here
        | QueryKind::Limit { .. }
        | QueryKind::Select { .. }
        | QueryKind::Filter { .. }
        | QueryKind::Pipeline { .. }
        | QueryKind::Binary { .. }
        | QueryKind::Not { .. } => {}
    }

    for (key, child) in query.children() {
        let depth = path.len();
        path.extend(key);
        walk(visitor, path, child);
        path.truncate(depth);
    }

    visitor.leave_node(path, query);
}
