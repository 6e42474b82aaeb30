//! Integration tests for query pointers
//!
//! Tests descending through every combinator, rebasing across edits, and
//! sibling moves.

use proptest::prelude::*;
use rexq_foundation::{ErrorKind, KeyPath, key_path};
use rexq_query::QueryPointer;
use rexq_query::ast::{
    BinaryOp, Query, aggregate, binary, define, filter, navigate, not, pipeline, value,
};

use crate::support::{all_paths, arb_query, at};

fn tree() -> Query {
    pipeline([
        navigate("individual"),
        define("n", pipeline([navigate("sample"), aggregate("count")])),
        filter(not(binary(BinaryOp::Less, navigate("n"), value(2i64)))),
    ])
}

// =============================================================================
// Descending
// =============================================================================

#[test]
fn descends_through_bindings() {
    let p = at(&tree(), &key_path!["pipeline", 1usize, "binding", "query", "pipeline", 0usize]);
    assert!(p.query().shape_eq(&navigate("sample")));
    assert_eq!(p.depth(), 3);

    let keys: Vec<_> = p.links().map(|link| link.key_path().to_vec()).collect();
    assert_eq!(
        keys,
        vec![
            key_path![],
            key_path!["pipeline", 1usize],
            key_path!["binding", "query"],
            key_path!["pipeline", 0usize],
        ]
    );
}

#[test]
fn descends_through_expressions() {
    let path = key_path!["pipeline", 2usize, "predicate", "operand", "right"];
    let p = at(&tree(), &path);
    assert_eq!(p.path(), path);
    assert_eq!(p.depth(), 4);
    assert!(p.query().shape_eq(&value(2i64)));

    let parent = p.prev().unwrap();
    assert!(matches!(
        parent.query().kind(),
        rexq_query::QueryKind::Binary { op: BinaryOp::Less, .. }
    ));
}

#[test]
fn partial_steps_do_not_resolve() {
    let root = QueryPointer::new(tree());
    for path in [
        key_path!["pipeline"],
        key_path!["pipeline", 1usize, "binding"],
        key_path!["select", "a"],
        key_path!["pipeline", 2usize, "left"],
    ] {
        let err = root.select_path(&path).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidPointer { .. }), "{path:?}");
    }
}

#[test]
fn every_link_holds_the_node_it_reached() {
    let q = tree();
    let p = at(&q, &key_path!["pipeline", 2usize, "predicate", "operand", "left"]);
    for pointer in p.trace() {
        assert!(pointer.query().ptr_eq(q.get_in(&pointer.path()).unwrap()));
        assert!(pointer.root_query().ptr_eq(&q));
    }
}

// =============================================================================
// Rebasing
// =============================================================================

#[test]
fn rebase_follows_positions_not_nodes() {
    let q = tree();
    let p = at(&q, &key_path!["pipeline", 0usize]);
    let shifted = pipeline([navigate("study"), navigate("individual")]);
    let rebased = p.rebase(shifted).unwrap();
    assert!(rebased.query().shape_eq(&navigate("study")));
    assert!(rebased.is(&p));
}

#[test]
fn rebase_fails_when_position_is_gone() {
    let p = at(&tree(), &key_path!["pipeline", 2usize]);
    let err = p.rebase(pipeline([navigate("individual")])).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidPointer { .. }));
}

#[test]
fn sibling_moves_stay_in_the_pipeline() {
    let q = tree();
    let first = at(&q, &key_path!["pipeline", 0usize]);
    let last = first.move_by(2).unwrap();
    assert!(last.is(&at(&q, &key_path!["pipeline", 2usize])));
    assert!(last.move_by(1).is_err());
    assert!(last.move_by(-2).unwrap().is(&first));

    let binding = at(&q, &key_path!["pipeline", 1usize, "binding", "query"]);
    assert_eq!(binding.move_by(1).unwrap_err().kind, ErrorKind::NotInPipeline);
}

#[test]
fn stale_pointer_after_edit() {
    let q = tree();
    let p = at(&q, &key_path!["pipeline", 0usize]);
    assert!(p.ensure_root(&q).is_ok());

    // An equal tree built separately is accepted.
    assert!(p.ensure_root(&tree()).is_ok());

    let edited = q.set_in(&key_path!["pipeline", 0usize], navigate("study")).unwrap();
    assert_eq!(p.ensure_root(&edited).unwrap_err().kind, ErrorKind::StalePointer);
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn select_path_round_trips(q in arb_query(), pick in any::<prop::sample::Index>()) {
        let paths = all_paths(&q);
        let path = pick.get::<KeyPath>(paths.as_slice());
        let p = QueryPointer::new(q.clone()).select_path(path).unwrap();
        prop_assert_eq!(&p.path(), path);
        prop_assert!(p.query().ptr_eq(q.get_in(path).unwrap()));
    }

    #[test]
    fn rebase_onto_same_tree_is_identity(q in arb_query(), pick in any::<prop::sample::Index>()) {
        let paths = all_paths(&q);
        let p = QueryPointer::new(q.clone()).select_path(pick.get::<KeyPath>(paths.as_slice())).unwrap();
        let rebased = p.rebase(q.clone()).unwrap();
        prop_assert!(rebased.is(&p));
        prop_assert!(rebased.query().ptr_eq(p.query()));
    }
}
