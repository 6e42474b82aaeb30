//! Normalization into canonical form.
//!
//! Editing leaves `here` placeholders and redundant wrapping behind. The
//! rewrite is bottom-up:
//!
//! - a pipeline drops `here` steps and splices nested pipelines in place;
//!   an empty pipeline becomes `here` and a single-step pipeline becomes the
//!   step itself
//! - a select drops `here` fields and becomes `here` when none survive
//! - a define whose binding reduced to `here` becomes `here`
//! - filter predicates and expression operands are normalized in place
//!
//! The selection is carried through the rewrite as a key path and rewritten
//! with every change. When the selected node disappears, it moves to the
//! preceding surviving sibling, else the following one, else the enclosing
//! node. A selected pipeline that gets spliced into its parent maps to its
//! first step.

use rexq_foundation::{FieldMap, Key, KeyPath, QVec, display_path};

use crate::ast::{Binding, Query, QueryKind, keys};
use crate::pointer::QueryPointer;

/// A normalized query with the relocated selection.
#[derive(Clone, Debug)]
pub struct Normalized {
    /// The rewritten query.
    pub query: Query,
    /// The selection, pointing into `query`.
    pub selected: Option<QueryPointer>,
}

/// Normalizes `query`, relocating `selected` into the result.
#[must_use]
pub fn normalize(query: &Query, selected: Option<&QueryPointer>) -> Normalized {
    let tracked = selected.map(QueryPointer::path);
    let (query, path) = normalize_node(query, tracked.as_deref());
    let selected = path.map(|path| {
        let root = QueryPointer::new(query.clone());
        match root.select_path(&path) {
            Ok(pointer) => pointer,
            Err(err) => {
                tracing::trace!(%err, "relocated selection does not resolve, selecting root");
                root
            }
        }
    });
    Normalized { query, selected }
}

/// Normalizes a query without a selection.
#[must_use]
pub fn normalize_query(query: &Query) -> Query {
    normalize_node(query, None).0
}

/// Where the tracked path ended up among the surviving children.
enum Location {
    /// Inside a surviving child, as a path relative to the rebuilt node.
    At(KeyPath),
    /// The tracked child vanished after `before` survivors.
    Vanished { before: usize },
}

fn pipeline_key(index: usize) -> KeyPath {
    vec![Key::from(keys::PIPELINE), Key::Index(index)]
}

fn select_key(name: &str) -> KeyPath {
    vec![Key::from(keys::SELECT), Key::from(name)]
}

/// The part of the tracked path below the child at `key`.
fn descend<'a>(tracked: Option<&'a [Key]>, key: &[Key]) -> Option<&'a [Key]> {
    tracked.and_then(|path| path.strip_prefix(key))
}

/// Returns the rewritten node and, if `tracked` was given, the tracked path
/// relative to it.
fn normalize_node(query: &Query, tracked: Option<&[Key]>) -> (Query, Option<KeyPath>) {
    let this = || tracked.map(|_| KeyPath::new());
    match query.kind() {
        QueryKind::Here
        | QueryKind::Navigate { .. }
        | QueryKind::Limit { .. }
        | QueryKind::Aggregate { .. }
        | QueryKind::Value(_) => (query.clone(), this()),

        QueryKind::Pipeline { items } => normalize_pipeline(query, items, tracked),

        QueryKind::Select { fields } => normalize_select(query, fields, tracked),

        QueryKind::Define { binding } => {
            let key = vec![Key::from(keys::BINDING), Key::from(keys::QUERY)];
            let (bound, sub) = normalize_node(&binding.query, descend(tracked, &key));
            if bound.is_here() {
                return (query.with_kind(QueryKind::Here), this());
            }
            let kind = QueryKind::Define {
                binding: Binding {
                    name: binding.name.clone(),
                    query: bound,
                },
            };
            (query.with_kind(kind), in_place(tracked, [(key, sub)]))
        }

        QueryKind::Filter { predicate } => {
            let key = vec![Key::from(keys::PREDICATE)];
            let (predicate, sub) = normalize_node(predicate, descend(tracked, &key));
            (
                query.with_kind(QueryKind::Filter { predicate }),
                in_place(tracked, [(key, sub)]),
            )
        }

        QueryKind::Binary { op, left, right } => {
            let left_key = vec![Key::from(keys::LEFT)];
            let right_key = vec![Key::from(keys::RIGHT)];
            let (left, left_sub) = normalize_node(left, descend(tracked, &left_key));
            let (right, right_sub) = normalize_node(right, descend(tracked, &right_key));
            (
                query.with_kind(QueryKind::Binary {
                    op: *op,
                    left,
                    right,
                }),
                in_place(tracked, [(left_key, left_sub), (right_key, right_sub)]),
            )
        }

        QueryKind::Not { operand } => {
            let key = vec![Key::from(keys::OPERAND)];
            let (operand, sub) = normalize_node(operand, descend(tracked, &key));
            (
                query.with_kind(QueryKind::Not { operand }),
                in_place(tracked, [(key, sub)]),
            )
        }
    }
}

/// The tracked path for a node whose children stay where they were.
fn in_place<const N: usize>(
    tracked: Option<&[Key]>,
    children: [(KeyPath, Option<KeyPath>); N],
) -> Option<KeyPath> {
    tracked?;
    Some(
        children
            .into_iter()
            .find_map(|(key, sub)| sub.map(|sub| [key, sub].concat()))
            .unwrap_or_default(),
    )
}

fn normalize_pipeline(
    query: &Query,
    items: &QVec<Query>,
    tracked: Option<&[Key]>,
) -> (Query, Option<KeyPath>) {
    let mut kept: Vec<Query> = Vec::with_capacity(items.len());
    let mut location = None;

    for (i, item) in items.iter().enumerate() {
        let (item, sub) = normalize_node(item, descend(tracked, &pipeline_key(i)));
        match item.kind() {
            QueryKind::Here => {
                if sub.is_some() {
                    location = Some(Location::Vanished { before: kept.len() });
                }
            }
            QueryKind::Pipeline { items: inner } => {
                if let Some(sub) = sub {
                    location = Some(Location::At(spliced(kept.len(), &sub)));
                }
                kept.extend(inner.iter().cloned());
            }
            _ => {
                if let Some(sub) = sub {
                    location = Some(Location::At([pipeline_key(kept.len()), sub].concat()));
                }
                kept.push(item);
            }
        }
    }

    let path = tracked.map(|_| match location {
        Some(Location::At(path)) => path,
        Some(Location::Vanished { before }) => {
            let path = before
                .checked_sub(1)
                .or((before < kept.len()).then_some(before))
                .map(pipeline_key)
                .unwrap_or_default();
            tracing::trace!(to = %display_path(&path), "selected step removed");
            path
        }
        None => KeyPath::new(),
    });

    match kept.len() {
        0 => (query.with_kind(QueryKind::Here), path.map(|_| KeyPath::new())),
        1 => {
            let only = kept.swap_remove(0);
            (only, path.map(|path| strip_single(&path)))
        }
        _ => (
            query.with_kind(QueryKind::Pipeline { items: kept.into() }),
            path,
        ),
    }
}

/// Maps a path inside a spliced pipeline to its position in the parent.
fn spliced(start: usize, sub: &[Key]) -> KeyPath {
    match sub {
        [_, Key::Index(j), rest @ ..] => [pipeline_key(start + j), rest.to_vec()].concat(),
        _ => pipeline_key(start),
    }
}

/// Maps a path inside a single-step pipeline to the step that replaces it.
fn strip_single(path: &[Key]) -> KeyPath {
    match path {
        [_, Key::Index(0), rest @ ..] => rest.to_vec(),
        _ => KeyPath::new(),
    }
}

fn normalize_select(
    query: &Query,
    fields: &FieldMap<Query>,
    tracked: Option<&[Key]>,
) -> (Query, Option<KeyPath>) {
    let mut kept: Vec<(String, Query)> = Vec::with_capacity(fields.len());
    let mut location = None;

    for (name, field) in fields.iter() {
        let key = select_key(name);
        let (field, sub) = normalize_node(field, descend(tracked, &key));
        if field.is_here() {
            if sub.is_some() {
                location = Some(Location::Vanished { before: kept.len() });
            }
            continue;
        }
        if let Some(sub) = sub {
            location = Some(Location::At([key, sub].concat()));
        }
        kept.push((name.to_string(), field));
    }

    if kept.is_empty() {
        return (query.with_kind(QueryKind::Here), tracked.map(|_| KeyPath::new()));
    }

    let path = tracked.map(|_| match location {
        Some(Location::At(path)) => path,
        Some(Location::Vanished { before }) => {
            let path = before
                .checked_sub(1)
                .or((before < kept.len()).then_some(before))
                .and_then(|i| kept.get(i))
                .map(|(name, _)| select_key(name))
                .unwrap_or_default();
            tracing::trace!(to = %display_path(&path), "selected field removed");
            path
        }
        None => KeyPath::new(),
    });

    (
        query.with_kind(QueryKind::Select {
            fields: kept.into_iter().collect(),
        }),
        path,
    )
}
