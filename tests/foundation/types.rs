//! Integration tests for the type system
//!
//! Tests cardinality absorption and the least upper bound laws.

use proptest::prelude::*;
use rexq_foundation::{Atom, Cardinality, FieldMap, Type, least_upper_bound};

fn arb_atom() -> impl Strategy<Value = Type> {
    prop_oneof![
        Just(Type::void()),
        Just(Type::number()),
        Just(Type::text()),
        Just(Type::boolean()),
        "[a-z]{1,8}".prop_map(Type::entity),
        ("[a-z]{1,4}", "[a-z]{1,8}").prop_map(|(field, entity)| {
            Type::record(FieldMap::new().insert(field, Type::seq(Type::entity(entity))))
        }),
    ]
}

fn arb_type() -> impl Strategy<Value = Type> {
    (arb_atom(), 0..3u8).prop_map(|(atom, card)| match card {
        0 => atom,
        1 => Type::opt(atom),
        _ => Type::seq(atom),
    })
}

// =============================================================================
// Constructors
// =============================================================================

#[test]
fn seq_of_entity() {
    let t = Type::seq(Type::entity("individual"));
    assert!(t.is_seq());
    assert_eq!(t.entity_name(), Some("individual"));
    assert_eq!(t.cardinality(), Cardinality::Seq);
    assert_eq!(t.as_atom(), &Atom::Entity("individual".to_string()));
}

#[test]
fn record_fields_are_ordered() {
    let t = Type::record(
        FieldMap::new()
            .insert("z", Type::number())
            .insert("a", Type::text()),
    );
    let names: Vec<_> = t.record_fields().unwrap().keys().collect();
    assert_eq!(names, vec!["z", "a"]);
}

#[test]
fn debug_rendering() {
    assert_eq!(format!("{:?}", Type::seq(Type::number())), "[number]");
    assert_eq!(format!("{:?}", Type::opt(Type::entity("individual"))), "?individual");
    assert_eq!(Type::void().to_string(), "void");
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn seq_absorbs_opt(t in arb_atom()) {
        prop_assert_eq!(Type::seq(Type::opt(t.clone())), Type::seq(t.clone()));
        prop_assert_eq!(Type::opt(Type::seq(t.clone())), Type::seq(t));
    }

    #[test]
    fn wrappers_are_idempotent(t in arb_type()) {
        prop_assert_eq!(Type::seq(Type::seq(t.clone())), Type::seq(t.clone()));
        prop_assert_eq!(Type::opt(Type::opt(t.clone())), Type::opt(t));
    }

    #[test]
    fn lub_of_seq_is_seq(x in arb_type(), y in arb_type()) {
        prop_assert!(least_upper_bound(&Type::seq(x), &y).is_seq());
    }

    #[test]
    fn lub_of_opt_and_seq_is_the_seq(x in arb_atom(), y in arb_atom()) {
        let seq = Type::seq(y);
        prop_assert_eq!(least_upper_bound(&Type::opt(x), &seq), seq);
    }

    #[test]
    fn lub_takes_the_right_atom(x in arb_type(), y in arb_type()) {
        prop_assert_eq!(least_upper_bound(&x, &y).atom(), y.atom());
    }

    #[test]
    fn atom_is_single(t in arb_type()) {
        prop_assert_eq!(t.atom().cardinality(), Cardinality::One);
        prop_assert_eq!(t.atom().atom(), t.atom());
    }
}
