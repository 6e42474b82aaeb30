//! Edit operators.
//!
//! Every operator takes the pointer to edit at and the current selection,
//! both addressing the same tree, and returns a new tree with the selection
//! rebased into it. Nothing is mutated: the old tree stays valid, so callers
//! can keep it for undo.
//!
//! Operators check `selected` against `pointer`'s tree, not against any
//! current root: a pointer that is itself stale edits the tree it was made
//! from. Hosts holding a current root check the pointer first with
//! [`QueryPointer::ensure_root`].
//!
//! Operators do not re-type or normalize. Run [`commit`] on the result to
//! get a typed, canonical tree before rendering or translating it.

use std::sync::Arc;

use rexq_foundation::{
    Domain, Error, ErrorContext, FieldMap, Key, KeyPath, QVec, Result, display_path,
};

use crate::ast::{Query, QueryKind, here, keys, navigate, pipeline};
use crate::infer::infer_type;
use crate::normalize::normalize;
use crate::pointer::QueryPointer;

/// The result of an edit: a new root and the selection within it.
#[derive(Clone, Debug)]
pub struct Edit {
    /// The new root.
    pub query: Query,
    /// The selection, pointing into `query`.
    pub selected: Option<QueryPointer>,
}

impl Edit {
    /// An edit that selects nothing.
    #[must_use]
    pub fn new(query: Query) -> Self {
        Self {
            query,
            selected: None,
        }
    }

    /// An edit that selects the root.
    #[must_use]
    pub fn selecting_root(query: Query) -> Self {
        Self {
            selected: Some(QueryPointer::new(query.clone())),
            query,
        }
    }
}

fn pipeline_step(index: usize) -> KeyPath {
    vec![Key::from(keys::PIPELINE), Key::Index(index)]
}

/// The steps of the pipeline at `prev` and the pointer's index in it, if the
/// pointer addresses a pipeline step.
fn enclosing_pipeline<'a>(
    pointer: &QueryPointer,
    prev: &'a QueryPointer,
) -> Option<(&'a QVec<Query>, usize)> {
    match (pointer.key_path(), prev.query().as_pipeline()) {
        ([step, Key::Index(index)], Some(items)) if step.is_name(keys::PIPELINE) => {
            Some((items, *index))
        }
        _ => None,
    }
}

fn ensure_same_tree(
    operation: &str,
    pointer: &QueryPointer,
    selected: Option<&QueryPointer>,
) -> Result<()> {
    match selected {
        Some(selected) => selected
            .ensure_root(pointer.root_query())
            .map_err(|err| {
                err.with_context(
                    ErrorContext::new()
                        .with_operation(operation)
                        .with_position(pointer.path()),
                )
            }),
        None => Ok(()),
    }
}

/// Substitutes `value` at the pointer's position and rebuilds every
/// ancestor up to a new root.
fn rebuild(pointer: &QueryPointer, value: Query) -> Result<Query> {
    let mut value = value;
    let mut current = pointer.clone();
    while let Some(prev) = current.prev() {
        value = prev
            .query()
            .set_in(current.key_path(), value)
            .ok_or_else(|| Error::invalid_pointer(current.path()))?;
        current = prev;
    }
    Ok(value)
}

/// Rebases the selection onto `root`, falling back to `fallback` when the
/// selected position no longer exists.
fn rebase_selection(
    selected: Option<&QueryPointer>,
    root: &Query,
    fallback: &QueryPointer,
) -> Result<Option<QueryPointer>> {
    let Some(selected) = selected else {
        return Ok(None);
    };
    match selected.rebase(root.clone()) {
        Ok(rebased) => Ok(Some(rebased)),
        Err(_) => fallback.rebase(root.clone()).map(Some),
    }
}

/// Replaces the node at `pointer` with `value`.
///
/// # Errors
///
/// Returns a stale pointer error if `selected` addresses another tree than
/// `pointer`.
pub fn replace(
    pointer: &QueryPointer,
    selected: Option<&QueryPointer>,
    value: Query,
) -> Result<Edit> {
    ensure_same_tree("replace", pointer, selected)?;
    tracing::debug!(at = %display_path(&pointer.path()), "replace");
    let query = rebuild(pointer, value)?;
    let selected = rebase_selection(selected, &query, pointer)?;
    Ok(Edit { query, selected })
}

/// Removes the node at `pointer`, leaving a `here` placeholder for
/// normalization to erase.
///
/// # Errors
///
/// Returns a stale pointer error if `selected` addresses another tree than
/// `pointer`.
pub fn remove(pointer: &QueryPointer, selected: Option<&QueryPointer>) -> Result<Edit> {
    ensure_same_tree("remove", pointer, selected)?;
    tracing::debug!(at = %display_path(&pointer.path()), "remove");
    let query = rebuild(pointer, here())?;
    let selected = rebase_selection(selected, &query, pointer)?;
    Ok(Edit { query, selected })
}

/// Cuts the pipeline at `pointer`, dropping the step and everything after
/// it. Outside a pipeline the node is replaced with `here`.
///
/// The selection moves to the preceding step, or to the enclosing node when
/// the cut emptied the pipeline or there is no pipeline.
///
/// # Errors
///
/// Returns a stale pointer error if `selected` addresses another tree than
/// `pointer`.
pub fn cut(pointer: &QueryPointer, selected: Option<&QueryPointer>) -> Result<Edit> {
    ensure_same_tree("cut", pointer, selected)?;
    tracing::debug!(at = %display_path(&pointer.path()), "cut");

    let Some(prev) = pointer.prev() else {
        return Ok(Edit::selecting_root(here()));
    };

    if let Some((items, index)) = enclosing_pipeline(pointer, &prev) {
        let truncated = prev.query().with_kind(QueryKind::Pipeline {
            items: items.truncate(index),
        });
        let query = rebuild(&prev, truncated)?;
        let parent = prev.rebase(query.clone())?;
        let selected = match index.checked_sub(1) {
            Some(preceding) => parent.select(&pipeline_step(preceding))?,
            None => parent,
        };
        return Ok(Edit {
            query,
            selected: Some(selected),
        });
    }

    let query = rebuild(pointer, here())?;
    let selected = prev.rebase(query.clone())?;
    Ok(Edit {
        query,
        selected: Some(selected),
    })
}

/// Which side of the target an insertion goes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    Before,
    After,
}

/// Inserts `node` as the step after the one at `pointer`.
///
/// At the root a new two-step pipeline is built, or `node` is appended to a
/// root pipeline. Inside a pipeline `node` is spliced in next to the target.
/// Anywhere else the target is first wrapped in a one-step pipeline. The
/// selection moves to the inserted step.
///
/// # Errors
///
/// Returns a stale pointer error if `selected` addresses another tree than
/// `pointer`.
pub fn insert_after(
    pointer: &QueryPointer,
    selected: Option<&QueryPointer>,
    node: Query,
) -> Result<Edit> {
    ensure_same_tree("insert_after", pointer, selected)?;
    tracing::debug!(at = %display_path(&pointer.path()), "insert after");
    insert(pointer, node, Side::After)
}

/// Inserts `node` as the step before the one at `pointer`.
///
/// The mirror image of [`insert_after`].
///
/// # Errors
///
/// Returns a stale pointer error if `selected` addresses another tree than
/// `pointer`.
pub fn insert_before(
    pointer: &QueryPointer,
    selected: Option<&QueryPointer>,
    node: Query,
) -> Result<Edit> {
    ensure_same_tree("insert_before", pointer, selected)?;
    tracing::debug!(at = %display_path(&pointer.path()), "insert before");
    insert(pointer, node, Side::Before)
}

fn insert(pointer: &QueryPointer, node: Query, side: Side) -> Result<Edit> {
    let target = pointer.query();

    // Root: extend a root pipeline or wrap the root.
    let Some(prev) = pointer.prev() else {
        let (query, index) = match (target.as_pipeline(), side) {
            (Some(items), Side::After) => (
                target.with_kind(QueryKind::Pipeline {
                    items: items.push_back(node),
                }),
                items.len(),
            ),
            (Some(items), Side::Before) => (
                target.with_kind(QueryKind::Pipeline {
                    items: items.push_front(node),
                }),
                0,
            ),
            (None, Side::After) => (pipeline([target.clone(), node]), 1),
            (None, Side::Before) => (pipeline([node, target.clone()]), 0),
        };
        let selected = QueryPointer::new(query.clone()).select(&pipeline_step(index))?;
        return Ok(Edit {
            query,
            selected: Some(selected),
        });
    };

    // Inside a pipeline: splice next to the target.
    if let Some((items, index)) = enclosing_pipeline(pointer, &prev) {
        let at = match side {
            Side::After => index + 1,
            Side::Before => index,
        };
        let items = items
            .insert(at, node)
            .ok_or_else(|| Error::invalid_pointer(pointer.path()))?;
        let query = rebuild(&prev, prev.query().with_kind(QueryKind::Pipeline { items }))?;
        let rebased = pointer.rebase(query.clone())?;
        let selected = match side {
            Side::After => rebased.move_by(1)?,
            Side::Before => rebased,
        };
        return Ok(Edit {
            query,
            selected: Some(selected),
        });
    }

    // Anywhere else: promote the target to a pipeline.
    let (promoted, index) = match side {
        Side::After => (pipeline([target.clone(), node]), 1),
        Side::Before => (pipeline([node, target.clone()]), 0),
    };
    let query = rebuild(pointer, promoted)?;
    let selected = pointer
        .rebase(query.clone())?
        .select(&pipeline_step(index))?;
    Ok(Edit {
        query,
        selected: Some(selected),
    })
}

// =============================================================================
// Growing selects and navigation
// =============================================================================

/// Applies `update` to the select a new field belongs in: `query` itself if
/// it is a select, else the trailing select of a pipeline, else a new select
/// appended as a trailing step.
///
/// Returns the new query and the key path of the updated select.
fn with_trailing_select(
    query: &Query,
    update: impl FnOnce(&FieldMap<Query>) -> FieldMap<Query>,
) -> (Query, KeyPath) {
    match query.kind() {
        QueryKind::Select { fields } => (
            query.with_kind(QueryKind::Select {
                fields: update(fields),
            }),
            KeyPath::new(),
        ),
        QueryKind::Pipeline { items } => {
            let last = items.len().checked_sub(1);
            let trailing = last.and_then(|i| items.get(i)).and_then(Query::as_select);
            match (last, trailing) {
                (Some(i), Some(fields)) => {
                    let fields = update(fields);
                    let items = items
                        .iter()
                        .enumerate()
                        .map(|(j, item)| {
                            if j == i {
                                item.with_kind(QueryKind::Select {
                                    fields: fields.clone(),
                                })
                            } else {
                                item.clone()
                            }
                        })
                        .collect();
                    (query.with_kind(QueryKind::Pipeline { items }), pipeline_step(i))
                }
                _ => {
                    let fields = update(&FieldMap::new());
                    let index = items.len();
                    let items = items.push_back(Query::new(QueryKind::Select { fields }));
                    (query.with_kind(QueryKind::Pipeline { items }), pipeline_step(index))
                }
            }
        }
        _ => {
            let fields = update(&FieldMap::new());
            (
                pipeline([query.clone(), Query::new(QueryKind::Select { fields })]),
                pipeline_step(1),
            )
        }
    }
}

/// Merges `fields` into the trailing select of `query`, or appends a new
/// trailing select.
#[must_use]
pub fn grow_select(query: &Query, fields: &FieldMap<Query>) -> Query {
    with_trailing_select(query, |existing| existing.merge(fields)).0
}

/// Grows nested selects along `path` so that its last segment is selected.
///
/// For each segment, the field of that name in the trailing select is
/// reused, or created as a navigation; further segments descend into a
/// select nested after it. `["a", "b"]` on an empty select yields
/// `select(a: a.select(b: b))`.
///
/// Returns the new query and the key path of the deepest field.
#[must_use]
pub fn grow_navigation(query: &Query, path: &[&str]) -> (Query, KeyPath) {
    let Some((head, rest)) = path.split_first() else {
        return (query.clone(), KeyPath::new());
    };

    let mut below = KeyPath::new();
    let (grown, select_at) = with_trailing_select(query, |fields| {
        let current = fields.get(head).cloned().unwrap_or_else(|| navigate(*head));
        let (field, sub) = grow_navigation(&current, rest);
        below = sub;
        fields.insert(*head, field)
    });

    let leaf = [select_at, vec![Key::from(keys::SELECT), Key::from(*head)], below].concat();
    (grown, leaf)
}

/// Grows navigation along a dotted path (`"sample.tissue"`) at `pointer` and
/// selects the deepest field.
///
/// # Errors
///
/// Returns an empty path error if `path` has no segments, and a stale
/// pointer error if `selected` addresses another tree.
pub fn grow_navigation_at(
    pointer: &QueryPointer,
    selected: Option<&QueryPointer>,
    path: &str,
) -> Result<Edit> {
    ensure_same_tree("grow_navigation", pointer, selected)?;
    let segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return Err(Error::empty_path()
            .with_context(ErrorContext::new().with_operation("grow_navigation")));
    }
    tracing::debug!(at = %display_path(&pointer.path()), path, "grow navigation");

    let (grown, leaf) = grow_navigation(pointer.query(), &segments);
    let query = rebuild(pointer, grown)?;
    let selected = pointer.rebase(query.clone())?.select_path(&leaf)?;
    Ok(Edit {
        query,
        selected: Some(selected),
    })
}

/// Types and normalizes an edit.
///
/// Infers types, normalizes while relocating the selection, and infers
/// again so every node of the result carries its final context.
///
/// # Errors
///
/// Returns an invalid pointer error if the selection does not resolve in
/// the edited tree.
pub fn commit(domain: &Arc<Domain>, edit: &Edit) -> Result<Edit> {
    let typed = infer_type(domain, &edit.query);
    let selected = edit
        .selected
        .as_ref()
        .map(|s| s.rebase(typed.clone()))
        .transpose()?;

    let normalized = normalize(&typed, selected.as_ref());
    let query = infer_type(domain, &normalized.query);
    let selected = normalized
        .selected
        .map(|s| s.rebase(query.clone()))
        .transpose()?;

    tracing::debug!(
        query = %query,
        selected = %selected.as_ref().map_or_else(String::new, |s| display_path(&s.path())),
        valid = query.ty().is_some(),
        "commit"
    );
    Ok(Edit { query, selected })
}
