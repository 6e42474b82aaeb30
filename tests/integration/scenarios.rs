//! The reference scenarios, exercised through the root crate.

use std::sync::Arc;

use rexq::foundation::{Domain, EntityDef, Type, key_path};
use rexq::query::ast::{aggregate, here, navigate, pipeline};
use rexq::query::{QueryPointer, infer_type, insert_after, normalize, translate};
use serde_json::json;

fn domain() -> Arc<Domain> {
    Arc::new(
        Domain::builder()
            .entity(
                "individual",
                EntityDef::new("Individual").attribute("code", "Code", Type::text()),
            )
            .entity(
                "study",
                EntityDef::new("Study").attribute("code", "Code", Type::text()),
            )
            .standard_aggregates()
            .build(),
    )
}

#[test]
fn scenario_a_entity_navigation() {
    let typed = infer_type(&domain(), &navigate("individual"));
    assert_eq!(typed.ty(), Some(&Type::seq(Type::entity("individual"))));
}

#[test]
fn scenario_b_unknown_attribute() {
    let q = pipeline([navigate("individual"), navigate("unknown_field")]);
    assert_eq!(infer_type(&domain(), &q).ty(), None);
}

#[test]
fn scenario_c_placeholder_collapse() {
    let n = normalize(&pipeline([navigate("individual"), here()]), None);
    assert!(n.query.shape_eq(&navigate("individual")));
    assert!(n.selected.is_none());
}

#[test]
fn scenario_d_insert_after_root() {
    let pointer = QueryPointer::new(navigate("individual"));
    let edit = insert_after(&pointer, None, navigate("name")).unwrap();
    assert!(
        edit.query
            .shape_eq(&pipeline([navigate("individual"), navigate("name")]))
    );
    assert_eq!(edit.selected.unwrap().path(), key_path!["pipeline", 1usize]);
}

#[test]
fn scenario_e_aggregate_translation() {
    let q = pipeline([
        pipeline([navigate("study"), navigate("code")]),
        aggregate("count"),
    ]);
    assert_eq!(
        translate(&q),
        json!(["count", [".", ["navigate", "study"], ["navigate", "code"]]])
    );
}
