//! Explanations for type errors.
//!
//! Inference marks an untyped node with `ty = None` and lets the error flow
//! down the rest of the pipeline. [`type_errors`] finds the nodes where an
//! error originates (the input was typed but the output is not) and says
//! why, for display next to the offending node.

use rexq_foundation::{Atom, Key, KeyPath, Type, display_path};
use thiserror::Error;

use crate::ast::{Query, QueryKind};
use crate::visitor::{QueryVisitor, walk_query};

/// Why a node could not be typed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TypeErrorKind {
    /// Top-level navigation to a name that is not an entity.
    #[error("unknown entity `{0}`")]
    UnknownEntity(String),

    /// Navigation to a missing attribute.
    #[error("entity `{entity}` has no attribute `{attribute}`")]
    UnknownAttribute {
        /// The entity navigated from.
        entity: String,
        /// The missing attribute.
        attribute: String,
    },

    /// Navigation to a missing record field.
    #[error("record has no field `{0}`")]
    UnknownField(String),

    /// Navigation from a scalar.
    #[error("cannot navigate to `{name}` from {ty}")]
    NotNavigable {
        /// The name navigated to.
        name: String,
        /// The scalar type navigated from.
        ty: Type,
    },

    /// An aggregate the domain does not define.
    #[error("unknown aggregate `{0}`")]
    UnknownAggregate(String),

    /// An aggregate applied to something other than a sequence.
    #[error("aggregate `{name}` needs a sequence, got {ty}")]
    NotASequence {
        /// The aggregate.
        name: String,
        /// The input type.
        ty: Type,
    },

    /// An aggregate that rejects the element type.
    #[error("aggregate `{name}` does not apply to {element}")]
    AggregateNotAllowed {
        /// The aggregate.
        name: String,
        /// The element type.
        element: Type,
    },

    /// A filter predicate that is not boolean.
    #[error("filter predicate has type {0}, expected a boolean")]
    PredicateNotBoolean(Type),

    /// Binary operands of incompatible types.
    #[error("operator `{op}` does not apply to {left} and {right}")]
    OperandMismatch {
        /// The operator symbol.
        op: &'static str,
        /// Type of the left operand.
        left: Type,
        /// Type of the right operand.
        right: Type,
    },

    /// Negation of something that is not boolean.
    #[error("cannot negate {0}")]
    NegationNotBoolean(Type),
}

/// A type error with the key path of the node it originates at.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} at {}", display_path(.path))]
pub struct TypeError {
    /// Key path from the root to the offending node.
    pub path: KeyPath,
    /// What went wrong.
    pub kind: TypeErrorKind,
}

/// Lists the type errors in an inferred query, in tree order.
///
/// Nodes downstream of an error are not reported, and neither are nodes
/// that are untyped only because a child is.
#[must_use]
pub fn type_errors(query: &Query) -> Vec<TypeError> {
    let mut collector = Collector::default();
    walk_query(&mut collector, query);
    collector.errors
}

#[derive(Default)]
struct Collector {
    errors: Vec<TypeError>,
}

impl QueryVisitor for Collector {
    fn enter_node(&mut self, path: &[Key], query: &Query) {
        let context = query.context();
        let Some(input) = &context.input_type else {
            return;
        };
        if context.ty.is_some() {
            return;
        }
        if let Some(kind) = explain(query, input) {
            self.errors.push(TypeError {
                path: path.to_vec(),
                kind,
            });
        }
    }
}

fn explain(query: &Query, input: &Type) -> Option<TypeErrorKind> {
    let context = query.context();
    match query.kind() {
        QueryKind::Navigate { path } => {
            if context.scope.contains_key(path.as_str()) {
                return None;
            }
            Some(match input.as_atom() {
                Atom::Void => TypeErrorKind::UnknownEntity(path.clone()),
                Atom::Entity(entity) => TypeErrorKind::UnknownAttribute {
                    entity: entity.clone(),
                    attribute: path.clone(),
                },
                Atom::Record(_) => TypeErrorKind::UnknownField(path.clone()),
                Atom::Number | Atom::Text | Atom::Boolean => TypeErrorKind::NotNavigable {
                    name: path.clone(),
                    ty: input.clone(),
                },
            })
        }
        QueryKind::Aggregate { name } => Some(if context.domain.aggregate(name).is_none() {
            TypeErrorKind::UnknownAggregate(name.clone())
        } else if !input.is_seq() {
            TypeErrorKind::NotASequence {
                name: name.clone(),
                ty: input.clone(),
            }
        } else {
            TypeErrorKind::AggregateNotAllowed {
                name: name.clone(),
                element: input.atom(),
            }
        }),
        QueryKind::Filter { predicate } => predicate
            .ty()
            .map(|ty| TypeErrorKind::PredicateNotBoolean(ty.clone())),
        QueryKind::Binary { op, left, right } => match (left.ty(), right.ty()) {
            (Some(l), Some(r)) => Some(TypeErrorKind::OperandMismatch {
                op: op.symbol(),
                left: l.clone(),
                right: r.clone(),
            }),
            _ => None,
        },
        QueryKind::Not { operand } => operand
            .ty()
            .map(|ty| TypeErrorKind::NegationNotBoolean(ty.clone())),
        QueryKind::Here
        | QueryKind::Limit { .. }
        | QueryKind::Value(_)
        | QueryKind::Select { .. }
        | QueryKind::Define { .. }
        | QueryKind::Pipeline { .. } => None,
    }
}
