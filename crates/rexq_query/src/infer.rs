//! Type inference.
//!
//! Inference is a single top-down pass: a context is threaded left to right
//! through pipelines and into nested sub-queries (select fields, bindings,
//! predicates), and every node is rebuilt with the context it was typed in.
//!
//! Type errors are data. A node that cannot be typed gets `ty = None`, and
//! once a pipeline step is untyped every later step is untyped too, so the
//! error reaches the root and the caller can block data fetches while the
//! tree stays renderable.

use std::sync::Arc;

use rexq_foundation::{Atom, Domain, FieldMap, Type, least_upper_bound};

use crate::ast::{BinaryOp, Binding, Context, Query, QueryKind};

/// Infers types over a whole query, starting from the void type.
#[must_use]
pub fn infer_type(domain: &Arc<Domain>, query: &Query) -> Query {
    infer_type_step(&Context::root(Arc::clone(domain)), query)
}

/// Infers the type of `query` receiving `context.ty` as input.
///
/// The returned node's context records the input type, the scope visible to
/// the node (extended by `define`), and the output type. A node that
/// receives no type is untyped along with its whole subtree.
#[must_use]
pub fn infer_type_step(context: &Context, query: &Query) -> Query {
    let Some(input) = context.ty.clone() else {
        return untyped(
            &Context {
                input_type: None,
                ty: None,
                ..context.clone()
            },
            query,
        );
    };

    let inferred = match query.kind() {
        QueryKind::Pipeline { items } => {
            let mut current = context.clone();
            let mut typed = Vec::with_capacity(items.len());
            for item in items {
                let item = infer_type_step(&current, item);
                current = item.context().clone();
                typed.push(item);
            }
            Query::with_kind_and_context(
                QueryKind::Pipeline {
                    items: typed.into(),
                },
                Context {
                    input_type: Some(input.clone()),
                    ..current
                },
            )
        }

        QueryKind::Here | QueryKind::Limit { .. } => {
            query.with_context(output(context, &input, Some(input.clone())))
        }

        QueryKind::Navigate { path } => {
            let ty = navigate_type(context, &input, path);
            query.with_context(output(context, &input, ty))
        }

        QueryKind::Select { fields } => {
            let element = element_context(context, &input);
            let fields: FieldMap<Query> = fields
                .iter()
                .map(|(name, field)| (name, infer_type_step(&element, field)))
                .collect();
            let types: Option<FieldMap<Type>> = fields
                .iter()
                .map(|(name, field)| field.ty().map(|t| (name, t.clone())))
                .collect();
            let ty = types.map(|types| least_upper_bound(&input, &Type::record(types)));
            Query::with_kind_and_context(
                QueryKind::Select { fields },
                output(context, &input, ty),
            )
        }

        QueryKind::Define { binding } => {
            let bound = infer_type_step(context, &binding.query);
            let ty = bound.ty().map(|_| input.clone());
            let scope = context.scope.insert(binding.name.clone(), bound.clone());
            Query::with_kind_and_context(
                QueryKind::Define {
                    binding: Binding {
                        name: binding.name.clone(),
                        query: bound,
                    },
                },
                Context {
                    domain: Arc::clone(&context.domain),
                    scope,
                    input_type: Some(input.clone()),
                    ty,
                },
            )
        }

        QueryKind::Filter { predicate } => {
            let predicate = infer_type_step(&element_context(context, &input), predicate);
            let valid = predicate.is_here() || predicate.ty().is_some_and(Type::is_boolean);
            let ty = valid.then(|| input.clone());
            Query::with_kind_and_context(
                QueryKind::Filter { predicate },
                output(context, &input, ty),
            )
        }

        QueryKind::Aggregate { name } => {
            let ty = if input.is_seq() {
                let element = input.atom();
                context
                    .domain
                    .aggregate(name)
                    .filter(|def| def.is_allowed(&element))
                    .map(|def| def.make_type(&element))
            } else {
                None
            };
            query.with_context(output(context, &input, ty))
        }

        QueryKind::Value(literal) => {
            let ty = least_upper_bound(&input, &literal.ty());
            query.with_context(output(context, &input, Some(ty)))
        }

        QueryKind::Binary { op, left, right } => {
            let left = infer_type_step(context, left);
            let right = infer_type_step(context, right);
            let ty = match (left.ty(), right.ty()) {
                (Some(l), Some(r)) if operands_compatible(*op, l, r) => Some(least_upper_bound(
                    &least_upper_bound(l, r),
                    &Type::boolean(),
                )),
                _ => None,
            };
            Query::with_kind_and_context(
                QueryKind::Binary {
                    op: *op,
                    left,
                    right,
                },
                output(context, &input, ty),
            )
        }

        QueryKind::Not { operand } => {
            let operand = infer_type_step(context, operand);
            let ty = operand
                .ty()
                .filter(|t| t.is_boolean())
                .map(|t| least_upper_bound(t, &Type::boolean()));
            Query::with_kind_and_context(QueryKind::Not { operand }, output(context, &input, ty))
        }
    };

    if inferred.ty().is_none() {
        tracing::trace!(query = %inferred, input = %input, "type error");
    }
    inferred
}

/// Rebuilds `query` and its descendants with `context`, dropping any types
/// left over from an earlier inference.
fn untyped(context: &Context, query: &Query) -> Query {
    let kind = match query.kind() {
        QueryKind::Here
        | QueryKind::Navigate { .. }
        | QueryKind::Limit { .. }
        | QueryKind::Aggregate { .. }
        | QueryKind::Value(_) => query.kind().clone(),
        QueryKind::Select { fields } => QueryKind::Select {
            fields: fields
                .iter()
                .map(|(name, field)| (name, untyped(context, field)))
                .collect(),
        },
        QueryKind::Define { binding } => QueryKind::Define {
            binding: Binding {
                name: binding.name.clone(),
                query: untyped(context, &binding.query),
            },
        },
        QueryKind::Filter { predicate } => QueryKind::Filter {
            predicate: untyped(context, predicate),
        },
        QueryKind::Pipeline { items } => QueryKind::Pipeline {
            items: items.iter().map(|item| untyped(context, item)).collect(),
        },
        QueryKind::Binary { op, left, right } => QueryKind::Binary {
            op: *op,
            left: untyped(context, left),
            right: untyped(context, right),
        },
        QueryKind::Not { operand } => QueryKind::Not {
            operand: untyped(context, operand),
        },
    };
    Query::with_kind_and_context(kind, context.clone())
}

/// The context of a node that received `input` and produced `ty`.
fn output(context: &Context, input: &Type, ty: Option<Type>) -> Context {
    Context {
        domain: Arc::clone(&context.domain),
        scope: context.scope.clone(),
        input_type: Some(input.clone()),
        ty,
    }
}

/// The context sub-queries that operate on one element are typed in.
fn element_context(context: &Context, input: &Type) -> Context {
    Context {
        domain: Arc::clone(&context.domain),
        scope: context.scope.clone(),
        input_type: Some(input.clone()),
        ty: Some(input.atom()),
    }
}

/// The type reached by navigating to `path` from a point of type `input`.
fn navigate_type(context: &Context, input: &Type, path: &str) -> Option<Type> {
    let found = if let Some(bound) = context.scope.get(path) {
        bound.ty().cloned()
    } else {
        match input.as_atom() {
            Atom::Void => context
                .domain
                .entity(path)
                .map(|_| Type::seq(Type::entity(path))),
            Atom::Entity(entity) => context
                .domain
                .attribute(entity, path)
                .map(|attribute| attribute.ty.clone()),
            Atom::Record(fields) => fields.get(path).cloned(),
            Atom::Number | Atom::Text | Atom::Boolean => None,
        }
    };
    found.map(|ty| least_upper_bound(input, &ty))
}

fn operands_compatible(op: BinaryOp, left: &Type, right: &Type) -> bool {
    let (l, r) = (left.as_atom(), right.as_atom());
    if op.is_logical() {
        return matches!((l, r), (Atom::Boolean, Atom::Boolean));
    }
    match op {
        BinaryOp::Contains => matches!((l, r), (Atom::Text, Atom::Text)),
        _ if op.is_ordering() => l == r && matches!(l, Atom::Number | Atom::Text),
        _ => l == r,
    }
}
