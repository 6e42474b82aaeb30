//! Integration tests for edit operators
//!
//! Tests insertion, replacement, removal, cutting, growing selects, and
//! committing edits.

use rexq_foundation::{ErrorKind, FieldMap, Type, key_path};
use rexq_query::ast::{
    BinaryOp, Query, aggregate, binary, define, filter, here, limit, navigate, pipeline, select,
    value,
};
use rexq_query::{
    Edit, QueryPointer, commit, cut, grow_navigation_at, grow_select, insert_after, insert_before,
    remove, replace,
};

use crate::support::{at, domain};

fn individuals() -> Query {
    pipeline([
        navigate("individual"),
        filter(binary(BinaryOp::Equal, navigate("sex"), value("f"))),
        select([("code", navigate("code"))]),
    ])
}

// =============================================================================
// Insertion
// =============================================================================

#[test]
fn insert_after_single_node_builds_pipeline() {
    let edit = insert_after(&QueryPointer::new(navigate("individual")), None, navigate("name"))
        .unwrap();
    assert!(
        edit.query
            .shape_eq(&pipeline([navigate("individual"), navigate("name")]))
    );
    let selected = edit.selected.unwrap();
    assert_eq!(selected.path(), key_path!["pipeline", 1usize]);
    assert!(selected.query().shape_eq(&navigate("name")));
}

#[test]
fn insert_into_binding_pipeline() {
    let q = pipeline([
        navigate("individual"),
        define("n", pipeline([navigate("sample"), aggregate("count")])),
    ]);
    let p = at(&q, &key_path!["pipeline", 1usize, "binding", "query", "pipeline", 0usize]);
    let edit = insert_after(&p, Some(&p), filter(here())).unwrap();

    let binding = edit
        .query
        .get_in(&key_path!["pipeline", 1usize, "binding", "query"])
        .unwrap();
    assert_eq!(binding.as_pipeline().unwrap().len(), 3);
    assert_eq!(
        edit.selected.unwrap().path(),
        key_path!["pipeline", 1usize, "binding", "query", "pipeline", 1usize]
    );
}

#[test]
fn insert_before_select_field_promotes_it() {
    let q = individuals();
    let p = at(&q, &key_path!["pipeline", 2usize, "select", "code"]);
    let edit = insert_before(&p, None, navigate("mother")).unwrap();

    let field = edit
        .query
        .get_in(&key_path!["pipeline", 2usize, "select", "code"])
        .unwrap();
    assert!(field.shape_eq(&pipeline([navigate("mother"), navigate("code")])));
    assert_eq!(
        edit.selected.unwrap().path(),
        key_path!["pipeline", 2usize, "select", "code", "pipeline", 0usize]
    );
}

#[test]
fn edits_leave_the_original_untouched() {
    let q = individuals();
    let before = q.clone();
    let p = at(&q, &key_path!["pipeline", 1usize]);
    let _ = insert_after(&p, None, limit(3)).unwrap();
    let _ = remove(&p, None).unwrap();
    let _ = cut(&p, None).unwrap();
    assert!(q.ptr_eq(&before));
    assert!(q.shape_eq(&individuals()));
}

// =============================================================================
// Replacement and removal
// =============================================================================

#[test]
fn replace_keeps_unrelated_selection() {
    let q = individuals();
    let p = at(&q, &key_path!["pipeline", 1usize]);
    let s = at(&q, &key_path!["pipeline", 2usize, "select", "code"]);
    let edit = replace(&p, Some(&s), limit(10)).unwrap();

    assert!(
        edit.query
            .get_in(&key_path!["pipeline", 1usize])
            .unwrap()
            .shape_eq(&limit(10))
    );
    let selected = edit.selected.unwrap();
    assert!(selected.is(&s));
    assert!(selected.root_query().ptr_eq(&edit.query));
}

#[test]
fn replace_without_selection() {
    let q = individuals();
    let edit = replace(&at(&q, &key_path!["pipeline", 0usize]), None, navigate("study")).unwrap();
    assert!(edit.selected.is_none());
}

#[test]
fn remove_then_commit_drops_the_step() {
    let q = individuals();
    let p = at(&q, &key_path!["pipeline", 1usize]);
    let edit = remove(&p, Some(&p)).unwrap();
    let committed = commit(&domain(), &edit).unwrap();

    let expected = pipeline([navigate("individual"), select([("code", navigate("code"))])]);
    assert!(committed.query.shape_eq(&expected));
    let selected = committed.selected.unwrap();
    assert_eq!(selected.path(), key_path!["pipeline", 0usize]);
    assert!(selected.query().shape_eq(&navigate("individual")));
}

#[test]
fn stale_selection_is_rejected_with_context() {
    let q = individuals();
    let p = at(&q, &key_path!["pipeline", 1usize]);
    let old = at(&navigate("study"), &key_path![]);

    for result in [
        remove(&p, Some(&old)),
        cut(&p, Some(&old)),
        insert_before(&p, Some(&old), limit(1)),
    ] {
        let err = result.unwrap_err();
        assert_eq!(err.kind, ErrorKind::StalePointer);
        assert_eq!(err.context.unwrap().at, Some(key_path!["pipeline", 1usize]));
    }
}

// =============================================================================
// Cutting
// =============================================================================

#[test]
fn cut_drops_the_tail() {
    let q = individuals();
    let edit = cut(&at(&q, &key_path!["pipeline", 1usize]), None).unwrap();
    assert!(edit.query.shape_eq(&pipeline([navigate("individual")])));
    assert_eq!(edit.selected.unwrap().path(), key_path!["pipeline", 0usize]);
}

#[test]
fn cut_at_root_leaves_placeholder() {
    let q = individuals();
    let edit = cut(&QueryPointer::new(q), None).unwrap();
    assert!(edit.query.is_here());
    let selected = edit.selected.unwrap();
    assert!(selected.path().is_empty());
    assert!(selected.query().is_here());
}

#[test]
fn cut_inside_predicate() {
    let q = individuals();
    let p = at(&q, &key_path!["pipeline", 1usize, "predicate", "right"]);
    let edit = cut(&p, None).unwrap();
    assert!(
        edit.query
            .get_in(&key_path!["pipeline", 1usize, "predicate", "right"])
            .unwrap()
            .is_here()
    );
    assert_eq!(
        edit.selected.unwrap().path(),
        key_path!["pipeline", 1usize, "predicate"]
    );
}

// =============================================================================
// Growing
// =============================================================================

#[test]
fn grow_select_appends_fields_in_order() {
    let q = individuals();
    let fields = FieldMap::new()
        .insert("sex", navigate("sex"))
        .insert("code", pipeline([navigate("code"), aggregate("count")]));
    let grown = grow_select(&q, &fields);

    let select = grown
        .get_in(&key_path!["pipeline", 2usize])
        .unwrap()
        .as_select()
        .unwrap();
    assert_eq!(select.keys().collect::<Vec<_>>(), vec!["code", "sex"]);
    assert!(select.get("code").unwrap().is_pipeline());
}

#[test]
fn grow_navigation_at_root_and_commit() {
    let q = navigate("individual");
    let edit = grow_navigation_at(&QueryPointer::new(q), None, "sample.tissue").unwrap();
    let committed = commit(&domain(), &edit).unwrap();

    let tissue = Type::record(FieldMap::new().insert("tissue", Type::text()));
    let sample = Type::record(FieldMap::new().insert("sample", Type::seq(tissue)));
    assert_eq!(committed.query.ty(), Some(&Type::seq(sample)));

    let selected = committed.selected.unwrap();
    assert!(selected.query().shape_eq(&navigate("tissue")));
    assert_eq!(
        selected.path(),
        key_path!["pipeline", 1usize, "select", "sample", "pipeline", 1usize, "select", "tissue"]
    );
}

#[test]
fn grow_navigation_rejects_empty_path() {
    let err = grow_navigation_at(&QueryPointer::new(navigate("individual")), None, "")
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::EmptyPath);
    assert_eq!(err.context.unwrap().operation.as_deref(), Some("grow_navigation"));
}

// =============================================================================
// Commit
// =============================================================================

#[test]
fn commit_relocates_selection_through_collapse() {
    let q = pipeline([here(), navigate("individual"), here()]);
    let p = at(&q, &key_path!["pipeline", 2usize]);
    let committed = commit(&domain(), &Edit { query: q, selected: Some(p) }).unwrap();

    assert!(committed.query.shape_eq(&navigate("individual")));
    assert!(committed.selected.unwrap().path().is_empty());
    assert_eq!(
        committed.query.ty(),
        Some(&Type::seq(Type::entity("individual")))
    );
}

#[test]
fn commit_types_every_node() {
    let edit = Edit::selecting_root(individuals());
    let committed = commit(&domain(), &edit).unwrap();
    let items = committed.query.as_pipeline().unwrap();
    for item in items {
        assert!(item.ty().is_some());
    }
    assert!(committed.selected.unwrap().root_query().ptr_eq(&committed.query));
}
