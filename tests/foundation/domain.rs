//! Integration tests for the domain catalog
//!
//! Tests entity and attribute lookup and the standard aggregates.

use rexq_foundation::{AggregateDef, Domain, EntityDef, Type};

fn domain() -> Domain {
    Domain::builder()
        .entity(
            "individual",
            EntityDef::new("Individual")
                .attribute("code", "Code", Type::text())
                .attribute("age", "Age", Type::number())
                .attribute("sample", "Samples", Type::seq(Type::entity("sample"))),
        )
        .entity(
            "sample",
            EntityDef::new("Sample").attribute("tissue", "Tissue", Type::text()),
        )
        .standard_aggregates()
        .build()
}

// =============================================================================
// Entities
// =============================================================================

#[test]
fn entity_lookup() {
    let domain = domain();
    assert_eq!(domain.entity("individual").unwrap().title, "Individual");
    assert!(domain.entity("study").is_none());
}

#[test]
fn attribute_lookup() {
    let domain = domain();
    let attr = domain.attribute("individual", "sample").unwrap();
    assert_eq!(attr.title, "Samples");
    assert_eq!(attr.ty, Type::seq(Type::entity("sample")));

    assert!(domain.attribute("individual", "tissue").is_none());
    assert!(domain.attribute("study", "code").is_none());
}

#[test]
fn entities_iterate_in_name_order() {
    let domain = domain();
    let names: Vec<_> = domain.entities().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["individual", "sample"]);
}

#[test]
fn empty_domain() {
    let domain = Domain::empty();
    assert_eq!(domain.entities().count(), 0);
    assert_eq!(domain.aggregates().count(), 0);
}

// =============================================================================
// Aggregates
// =============================================================================

#[test]
fn standard_aggregate_names() {
    let domain = domain();
    let names: Vec<_> = domain.aggregates().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["count", "exists", "max", "mean", "min", "sum"]);
}

#[test]
fn count_applies_to_anything() {
    let domain = domain();
    let count = domain.aggregate("count").unwrap();
    assert!(count.is_allowed(&Type::entity("individual")));
    assert!(count.is_allowed(&Type::text()));
    assert_eq!(count.make_type(&Type::entity("individual")), Type::number());
}

#[test]
fn numeric_aggregates_reject_text() {
    let domain = domain();
    for name in ["sum", "mean"] {
        let agg = domain.aggregate(name).unwrap();
        assert!(agg.is_allowed(&Type::number()), "{name}");
        assert!(!agg.is_allowed(&Type::text()), "{name}");
    }
    assert_eq!(
        domain.aggregate("mean").unwrap().make_type(&Type::number()),
        Type::opt(Type::number())
    );
}

#[test]
fn ordered_aggregates_keep_the_element_atom() {
    let domain = domain();
    let min = domain.aggregate("min").unwrap();
    assert!(min.is_allowed(&Type::text()));
    assert!(!min.is_allowed(&Type::boolean()));
    assert_eq!(min.make_type(&Type::text()), Type::opt(Type::text()));
}

#[test]
fn custom_aggregate() {
    let domain = Domain::builder()
        .aggregate(
            "any",
            AggregateDef::new("Any", |_| Type::boolean(), Type::is_boolean),
        )
        .build();
    let any = domain.aggregate("any").unwrap();
    assert_eq!(any.title, "Any");
    assert!(any.is_allowed(&Type::boolean()));
    assert!(!any.is_allowed(&Type::number()));
    assert!(domain.aggregate("count").is_none());
}
