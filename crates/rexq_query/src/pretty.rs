//! Renders queries in the textual mini-language.
//!
//! Pipelines are joined with `.`, so `pipeline(navigate("individual"),
//! navigate("code"))` reads `individual.code`, and combinators render as
//! calls: `filter(sex = "male")`, `define(n := sample.count)`, `limit(10)`.
//! Aggregates render as their bare name.
//!
//! # Example
//!
//! ```
//! use rexq_query::ast::{aggregate, navigate, pipeline};
//! use rexq_query::pretty::pretty_print;
//!
//! let q = pipeline([navigate("study"), aggregate("count")]);
//! assert_eq!(pretty_print(&q), "study.count");
//! ```

use std::fmt::{self, Write};

use crate::ast::{Literal, Query, QueryKind};

/// Configuration for pretty-printing.
#[derive(Debug, Clone)]
pub struct PrettyConfig {
    /// Number of spaces for each indentation level.
    pub indent_width: usize,
    /// Whether to put each select field on its own line.
    pub multi_line_select: bool,
}

impl Default for PrettyConfig {
    fn default() -> Self {
        Self {
            indent_width: 2,
            multi_line_select: false,
        }
    }
}

/// Pretty-print a query on one line.
#[must_use]
pub fn pretty_print(query: &Query) -> String {
    pretty_print_with_config(query, PrettyConfig::default())
}

/// Pretty-print a query with custom configuration.
#[must_use]
pub fn pretty_print_with_config(query: &Query, config: PrettyConfig) -> String {
    let mut printer = PrettyPrinter::new(config);
    printer.print(query);
    printer.output
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&pretty_print(self))
    }
}

/// Pretty-printer state.
struct PrettyPrinter {
    config: PrettyConfig,
    output: String,
    indent_level: usize,
}

impl PrettyPrinter {
    fn new(config: PrettyConfig) -> Self {
        Self {
            config,
            output: String::new(),
            indent_level: 0,
        }
    }

    fn print(&mut self, query: &Query) {
        match query.kind() {
            QueryKind::Here => self.output.push_str("here"),
            QueryKind::Navigate { path } => self.output.push_str(path),
            QueryKind::Aggregate { name } => self.output.push_str(name),
            QueryKind::Limit { limit } => {
                let _ = write!(self.output, "limit({limit})");
            }
            QueryKind::Pipeline { items } => {
                if items.is_empty() {
                    self.output.push_str("here");
                }
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.output.push('.');
                    }
                    self.print(item);
                }
            }
            QueryKind::Select { fields } => {
                self.output.push_str("select(");
                let multi_line = self.config.multi_line_select && !fields.is_empty();
                if multi_line {
                    self.push_indent();
                }
                for (i, (name, field)) in fields.iter().enumerate() {
                    if multi_line {
                        self.output.push('\n');
                        self.output.push_str(&self.indent());
                    } else if i > 0 {
                        self.output.push(' ');
                    }
                    self.output.push_str(name);
                    self.output.push_str(": ");
                    self.print(field);
                    if i + 1 < fields.len() {
                        self.output.push(',');
                    }
                }
                if multi_line {
                    self.pop_indent();
                    self.output.push('\n');
                    self.output.push_str(&self.indent());
                }
                self.output.push(')');
            }
            QueryKind::Define { binding } => {
                self.output.push_str("define(");
                self.output.push_str(&binding.name);
                self.output.push_str(" := ");
                self.print(&binding.query);
                self.output.push(')');
            }
            QueryKind::Filter { predicate } => {
                self.output.push_str("filter(");
                self.print(predicate);
                self.output.push(')');
            }
            QueryKind::Value(literal) => self.print_literal(literal),
            QueryKind::Binary { op, left, right } => {
                self.print_operand(left);
                self.output.push(' ');
                self.output.push_str(op.symbol());
                self.output.push(' ');
                self.print_operand(right);
            }
            QueryKind::Not { operand } => {
                self.output.push('!');
                self.print_operand(operand);
            }
        }
    }

    /// Operands that are themselves expressions are parenthesized.
    fn print_operand(&mut self, query: &Query) {
        if matches!(query.kind(), QueryKind::Binary { .. }) {
            self.output.push('(');
            self.print(query);
            self.output.push(')');
        } else {
            self.print(query);
        }
    }

    fn print_literal(&mut self, literal: &Literal) {
        match literal {
            Literal::Boolean(b) => {
                let _ = write!(self.output, "{b}");
            }
            Literal::Number(n) => {
                let _ = write!(self.output, "{n}");
            }
            Literal::Text(s) => self.print_string(s),
        }
    }

    fn print_string(&mut self, s: &str) {
        self.output.push('"');
        for c in s.chars() {
            match c {
                '"' => self.output.push_str("\\\""),
                '\\' => self.output.push_str("\\\\"),
                '\n' => self.output.push_str("\\n"),
                '\t' => self.output.push_str("\\t"),
                c => self.output.push(c),
            }
        }
        self.output.push('"');
    }

    fn indent(&self) -> String {
        " ".repeat(self.indent_level * self.config.indent_width)
    }

    fn push_indent(&mut self) {
        self.indent_level += 1;
    }

    fn pop_indent(&mut self) {
        self.indent_level = self.indent_level.saturating_sub(1);
    }
}
