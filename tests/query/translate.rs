//! Integration tests for the wire and textual forms
//!
//! Tests translation into S-expressions and pretty printing of typed and
//! untyped trees.

use rexq_query::ast::{
    BinaryOp, aggregate, binary, define, filter, here, limit, navigate, pipeline, select, value,
};
use rexq_query::{
    PrettyConfig, infer_type, normalize_query, pretty_print, pretty_print_with_config, translate,
};
use serde_json::json;

use crate::support::domain;

// =============================================================================
// Wire form
// =============================================================================

#[test]
fn aggregate_after_navigation_chain() {
    let q = pipeline([
        pipeline([navigate("study"), navigate("code")]),
        aggregate("count"),
    ]);
    assert_eq!(
        translate(&q),
        json!(["count", [".", ["navigate", "study"], ["navigate", "code"]]])
    );
}

#[test]
fn placeholders_do_not_change_the_wire_form() {
    let raw = pipeline([
        navigate("individual"),
        pipeline([here(), navigate("sample")]),
        aggregate("count"),
        here(),
    ]);
    assert_eq!(translate(&raw), translate(&normalize_query(&raw)));
}

#[test]
fn typing_does_not_change_the_wire_form() {
    let q = pipeline([
        navigate("individual"),
        define("n", pipeline([navigate("sample"), aggregate("count")])),
        filter(binary(BinaryOp::GreaterEqual, navigate("age"), value(18i64))),
        select([("code", navigate("code")), ("n", navigate("n"))]),
        limit(25),
    ]);
    let typed = infer_type(&domain(), &q);
    assert_eq!(translate(&typed), translate(&q));
}

#[test]
fn full_query() {
    let q = pipeline([
        navigate("individual"),
        filter(binary(BinaryOp::Equal, navigate("sex"), value("f"))),
        select([
            ("code", navigate("code")),
            ("tissues", pipeline([navigate("sample"), navigate("tissue")])),
        ]),
        limit(25),
    ]);
    assert_eq!(
        translate(&q),
        json!([
            "take",
            [
                "select",
                ["filter", ["navigate", "individual"], ["=", ["navigate", "sex"], "f"]],
                ["=>", "code", ["navigate", "code"]],
                ["=>", "tissues", [".", ["navigate", "sample"], ["navigate", "tissue"]]]
            ],
            25
        ])
    );
}

#[test]
fn limit_and_filter_without_prev_start_from_here() {
    assert_eq!(translate(&limit(3)), json!(["take", ["here"], 3]));
    assert_eq!(
        translate(&filter(navigate("closed"))),
        json!(["filter", ["here"], ["navigate", "closed"]])
    );
}

#[test]
fn numbers_keep_their_precision() {
    assert_eq!(translate(&value(42i64)), json!(42));
    assert_eq!(translate(&value(2.25)), json!(2.25));
    assert_eq!(translate(&value(-7.0)), json!(-7));
}

// =============================================================================
// Textual form
// =============================================================================

#[test]
fn pretty_print_round_trip_of_edits() {
    let q = pipeline([
        navigate("individual"),
        filter(binary(BinaryOp::Equal, navigate("sex"), value("male"))),
        define("n", pipeline([navigate("sample"), aggregate("count")])),
        limit(10),
    ]);
    assert_eq!(
        pretty_print(&q),
        r#"individual.filter(sex = "male").define(n := sample.count).limit(10)"#
    );
    assert_eq!(q.to_string(), pretty_print(&q));
}

#[test]
fn pretty_print_multi_line() {
    let q = pipeline([
        navigate("individual"),
        select([("code", navigate("code")), ("age", navigate("age"))]),
    ]);
    let config = PrettyConfig {
        multi_line_select: true,
        ..PrettyConfig::default()
    };
    assert_eq!(
        pretty_print_with_config(&q, config),
        "individual.select(\n  code: code,\n  age: age\n)"
    );
}
