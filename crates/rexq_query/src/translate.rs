//! Translation into the S-expression wire form.
//!
//! The execution engine consumes queries as nested JSON arrays whose head is
//! the operator: `["navigate", "study"]`, `[".", a, b]` for composition,
//! `["count", prev]` for aggregates, `["select", prev, ["=>", name, q]]` for
//! selects. Each step receives the translation of the steps before it as
//! `prev`. Nested queries (fields, bindings, predicates) start without one.

use serde_json::{Value, json};

use crate::ast::{Literal, Query, QueryKind};

/// Head of a composition.
const COMPOSE: &str = ".";
/// Head of a named argument.
const NAMED: &str = "=>";

/// Translates a query into its wire form.
///
/// # Example
///
/// ```
/// use rexq_query::ast::{aggregate, navigate, pipeline};
/// use rexq_query::translate::translate;
/// use serde_json::json;
///
/// let q = pipeline([pipeline([navigate("study"), navigate("code")]), aggregate("count")]);
/// assert_eq!(
///     translate(&q),
///     json!(["count", [".", ["navigate", "study"], ["navigate", "code"]]])
/// );
/// ```
#[must_use]
pub fn translate(query: &Query) -> Value {
    translate_step(query, None)
}

fn translate_step(query: &Query, prev: Option<Value>) -> Value {
    match query.kind() {
        QueryKind::Here => prev.unwrap_or_else(|| json!(["here"])),
        QueryKind::Navigate { path } => compose(prev, json!(["navigate", path])),
        QueryKind::Pipeline { items } => items
            .iter()
            .fold(prev, |prev, item| Some(translate_step(item, prev)))
            .unwrap_or_else(|| json!(["here"])),
        QueryKind::Aggregate { name } => match prev {
            Some(prev) => json!([name, prev]),
            None => json!([name]),
        },
        QueryKind::Limit { limit } => json!(["take", or_here(prev), limit]),
        QueryKind::Select { fields } => {
            let mut sexp = vec![json!("select"), or_here(prev)];
            sexp.extend(
                fields
                    .iter()
                    .map(|(name, field)| json!([NAMED, name, translate(field)])),
            );
            Value::Array(sexp)
        }
        QueryKind::Define { binding } => json!([
            "define",
            or_here(prev),
            [NAMED, binding.name, translate(&binding.query)]
        ]),
        QueryKind::Filter { predicate } => {
            json!(["filter", or_here(prev), translate(predicate)])
        }
        QueryKind::Value(literal) => compose(prev, literal_value(literal)),
        QueryKind::Binary { op, left, right } => compose(
            prev,
            json!([op.symbol(), translate(left), translate(right)]),
        ),
        QueryKind::Not { operand } => compose(prev, json!(["!", translate(operand)])),
    }
}

fn or_here(prev: Option<Value>) -> Value {
    prev.unwrap_or_else(|| json!(["here"]))
}

/// Composes `next` after `prev`, extending `prev` if it already is a
/// composition.
fn compose(prev: Option<Value>, next: Value) -> Value {
    match prev {
        None => next,
        Some(Value::Array(mut items)) if items.first().and_then(Value::as_str) == Some(COMPOSE) => {
            items.push(next);
            Value::Array(items)
        }
        Some(prev) => json!([COMPOSE, prev, next]),
    }
}

/// Integral numbers are sent as JSON integers. NaN and the infinities have
/// no JSON form and are sent as `null`.
#[allow(clippy::cast_possible_truncation)]
fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::Boolean(b) => Value::Bool(*b),
        Literal::Text(s) => Value::String(s.clone()),
        Literal::Number(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => Value::from(*n as i64),
        Literal::Number(n) => serde_json::Number::from_f64(*n).map_or(Value::Null, Value::Number),
    }
}
