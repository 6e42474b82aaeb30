//! Abstract syntax tree for queries.
//!
//! A query is an immutable tree of combinators. Nodes are shared through an
//! `Arc`, so cloning a query or keeping an old version alive for undo is O(1),
//! and every edit builds a new tree that reuses the untouched subtrees.
//!
//! Each node carries a [`Context`]: the domain it is typed against, the
//! bindings in scope, the type flowing in, and its own inferred type. A
//! missing type (`None`) marks a type error at or below the node.

use std::fmt;
use std::sync::Arc;

use rexq_foundation::{Domain, FieldMap, Key, KeyPath, QMap, QVec, Type};

/// Key path segment names used to address children.
pub mod keys {
    /// `["pipeline", i]` addresses a pipeline element.
    pub const PIPELINE: &str = "pipeline";
    /// `["select", name]` addresses a select field.
    pub const SELECT: &str = "select";
    /// `["binding", "query"]` addresses a definition's bound query.
    pub const BINDING: &str = "binding";
    /// Second segment of a binding path.
    pub const QUERY: &str = "query";
    /// `["predicate"]` addresses a filter's predicate.
    pub const PREDICATE: &str = "predicate";
    /// `["left"]` addresses a binary expression's left operand.
    pub const LEFT: &str = "left";
    /// `["right"]` addresses a binary expression's right operand.
    pub const RIGHT: &str = "right";
    /// `["operand"]` addresses a negation's operand.
    pub const OPERAND: &str = "operand";
}

/// Per-node typing information.
#[derive(Clone)]
pub struct Context {
    /// The catalog the query is typed against.
    pub domain: Arc<Domain>,
    /// Bindings introduced by preceding `define` steps.
    pub scope: QMap<String, Query>,
    /// The type this node receives from its predecessor.
    pub input_type: Option<Type>,
    /// The type this node produces; `None` on a type error.
    pub ty: Option<Type>,
}

impl Context {
    /// The context of a freshly constructed node: void in and out, no domain.
    #[must_use]
    pub fn empty() -> Self {
        Self::root(Arc::new(Domain::empty()))
    }

    /// The context a whole query is inferred in.
    #[must_use]
    pub fn root(domain: Arc<Domain>) -> Self {
        Self {
            domain,
            scope: QMap::new(),
            input_type: Some(Type::void()),
            ty: Some(Type::void()),
        }
    }

    /// Returns this context with a different output type.
    #[must_use]
    pub fn with_type(&self, ty: Option<Type>) -> Self {
        Self {
            ty,
            ..self.clone()
        }
    }

    /// Returns true if the node typed successfully.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.ty.is_some()
    }
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        (Arc::ptr_eq(&self.domain, &other.domain) || self.domain == other.domain)
            && self.scope == other.scope
            && self.input_type == other.input_type
            && self.ty == other.ty
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("scope", &self.scope.keys().collect::<Vec<_>>())
            .field("input_type", &self.input_type)
            .field("ty", &self.ty)
            .finish_non_exhaustive()
    }
}

/// A literal value inside an expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    /// `true` or `false`.
    Boolean(bool),
    /// A number.
    Number(f64),
    /// A text string.
    Text(String),
}

impl Literal {
    /// The type of the literal.
    #[must_use]
    pub fn ty(&self) -> Type {
        match self {
            Self::Boolean(_) => Type::boolean(),
            Self::Number(_) => Type::number(),
            Self::Text(_) => Type::text(),
        }
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for Literal {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Operators of binary expressions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `=`
    Equal,
    /// `!=`
    NotEqual,
    /// `<`
    Less,
    /// `<=`
    LessEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,
    /// `&`
    And,
    /// `|`
    Or,
    /// `~`, text containment.
    Contains,
}

impl BinaryOp {
    /// The operator symbol, shared by the textual and wire forms.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::NotEqual => "!=",
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
            Self::And => "&",
            Self::Or => "|",
            Self::Contains => "~",
        }
    }

    /// Returns true for `&` and `|`.
    #[must_use]
    pub const fn is_logical(self) -> bool {
        matches!(self, Self::And | Self::Or)
    }

    /// Returns true for `<`, `<=`, `>` and `>=`.
    #[must_use]
    pub const fn is_ordering(self) -> bool {
        matches!(
            self,
            Self::Less | Self::LessEqual | Self::Greater | Self::GreaterEqual
        )
    }
}

/// A named binding introduced by `define`.
#[derive(Clone, Debug, PartialEq)]
pub struct Binding {
    /// The name subsequent steps refer to.
    pub name: String,
    /// The bound query.
    pub query: Query,
}

/// The combinators a query is built from.
#[derive(Clone, Debug, PartialEq)]
pub enum QueryKind {
    /// Identity: passes its input through. A placeholder removed by
    /// normalization.
    Here,
    /// Navigate to an entity, attribute, field or binding.
    Navigate {
        /// The name to navigate to.
        path: String,
    },
    /// Build a record of named sub-queries, each evaluated per element.
    Select {
        /// Fields in display order.
        fields: FieldMap<Query>,
    },
    /// Bind a name for subsequent steps without changing the stream.
    Define {
        /// The binding.
        binding: Binding,
    },
    /// Keep the elements satisfying a predicate.
    Filter {
        /// The predicate, evaluated per element.
        predicate: Query,
    },
    /// Keep at most `limit` elements.
    Limit {
        /// Maximum number of elements.
        limit: usize,
    },
    /// Apply a domain aggregate to a sequence.
    Aggregate {
        /// The aggregate's name in the domain.
        name: String,
    },
    /// Compose steps left to right.
    Pipeline {
        /// The steps.
        items: QVec<Query>,
    },
    /// A constant.
    Value(Literal),
    /// A binary expression.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// Left operand.
        left: Query,
        /// Right operand.
        right: Query,
    },
    /// Logical negation.
    Not {
        /// The negated expression.
        operand: Query,
    },
}

struct Node {
    kind: QueryKind,
    context: Context,
}

/// A query node with its context.
#[derive(Clone)]
pub struct Query(Arc<Node>);

impl Query {
    /// Creates a node with an empty context.
    #[must_use]
    pub fn new(kind: QueryKind) -> Self {
        Self::with_kind_and_context(kind, Context::empty())
    }

    /// Creates a node with the given context.
    #[must_use]
    pub fn with_kind_and_context(kind: QueryKind, context: Context) -> Self {
        Self(Arc::new(Node { kind, context }))
    }

    /// The combinator.
    #[must_use]
    pub fn kind(&self) -> &QueryKind {
        &self.0.kind
    }

    /// The typing context.
    #[must_use]
    pub fn context(&self) -> &Context {
        &self.0.context
    }

    /// The inferred output type, `None` on a type error.
    #[must_use]
    pub fn ty(&self) -> Option<&Type> {
        self.0.context.ty.as_ref()
    }

    /// Returns this node with a different context.
    #[must_use]
    pub fn with_context(&self, context: Context) -> Self {
        Self::with_kind_and_context(self.0.kind.clone(), context)
    }

    /// Returns a node of a different kind that keeps this node's context.
    #[must_use]
    pub fn with_kind(&self, kind: QueryKind) -> Self {
        Self::with_kind_and_context(kind, self.0.context.clone())
    }

    /// Returns true if this is the `here` placeholder.
    #[must_use]
    pub fn is_here(&self) -> bool {
        matches!(self.kind(), QueryKind::Here)
    }

    /// Returns true if this is a pipeline.
    #[must_use]
    pub fn is_pipeline(&self) -> bool {
        matches!(self.kind(), QueryKind::Pipeline { .. })
    }

    /// The pipeline elements, or `None` if this is not a pipeline.
    #[must_use]
    pub fn as_pipeline(&self) -> Option<&QVec<Query>> {
        match self.kind() {
            QueryKind::Pipeline { items } => Some(items),
            _ => None,
        }
    }

    /// The select fields, or `None` if this is not a select.
    #[must_use]
    pub fn as_select(&self) -> Option<&FieldMap<Query>> {
        match self.kind() {
            QueryKind::Select { fields } => Some(fields),
            _ => None,
        }
    }

    /// Returns true if both nodes are the same allocation.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Structural equality ignoring contexts.
    #[must_use]
    pub fn shape_eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        match (self.kind(), other.kind()) {
            (QueryKind::Here, QueryKind::Here) => true,
            (QueryKind::Navigate { path: a }, QueryKind::Navigate { path: b }) => a == b,
            (QueryKind::Select { fields: a }, QueryKind::Select { fields: b }) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b.iter())
                        .all(|((ka, qa), (kb, qb))| ka == kb && qa.shape_eq(qb))
            }
            (QueryKind::Define { binding: a }, QueryKind::Define { binding: b }) => {
                a.name == b.name && a.query.shape_eq(&b.query)
            }
            (QueryKind::Filter { predicate: a }, QueryKind::Filter { predicate: b }) => {
                a.shape_eq(b)
            }
            (QueryKind::Limit { limit: a }, QueryKind::Limit { limit: b }) => a == b,
            (QueryKind::Aggregate { name: a }, QueryKind::Aggregate { name: b }) => a == b,
            (QueryKind::Pipeline { items: a }, QueryKind::Pipeline { items: b }) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(qa, qb)| qa.shape_eq(qb))
            }
            (QueryKind::Value(a), QueryKind::Value(b)) => a == b,
            (
                QueryKind::Binary {
                    op: oa,
                    left: la,
                    right: ra,
                },
                QueryKind::Binary {
                    op: ob,
                    left: lb,
                    right: rb,
                },
            ) => oa == ob && la.shape_eq(lb) && ra.shape_eq(rb),
            (QueryKind::Not { operand: a }, QueryKind::Not { operand: b }) => a.shape_eq(b),
            _ => false,
        }
    }

    // =========================================================================
    // Structural addressing
    // =========================================================================

    /// Resolves one node step at the start of `path`.
    ///
    /// Returns the child and the number of keys the step consumed, or `None`
    /// if `path` does not start with a valid child address.
    #[must_use]
    pub fn step(&self, path: &[Key]) -> Option<(&Query, usize)> {
        match (self.kind(), path) {
            (QueryKind::Pipeline { items }, [p, Key::Index(i), ..]) if p.is_name(keys::PIPELINE) => {
                items.get(*i).map(|q| (q, 2))
            }
            (QueryKind::Select { fields }, [s, Key::Name(name), ..]) if s.is_name(keys::SELECT) => {
                fields.get(name).map(|q| (q, 2))
            }
            (QueryKind::Define { binding }, [b, q, ..])
                if b.is_name(keys::BINDING) && q.is_name(keys::QUERY) =>
            {
                Some((&binding.query, 2))
            }
            (QueryKind::Filter { predicate }, [p, ..]) if p.is_name(keys::PREDICATE) => {
                Some((predicate, 1))
            }
            (QueryKind::Binary { left, .. }, [k, ..]) if k.is_name(keys::LEFT) => Some((left, 1)),
            (QueryKind::Binary { right, .. }, [k, ..]) if k.is_name(keys::RIGHT) => {
                Some((right, 1))
            }
            (QueryKind::Not { operand }, [k, ..]) if k.is_name(keys::OPERAND) => Some((operand, 1)),
            _ => None,
        }
    }

    /// Resolves a key path, which must end exactly on a query node.
    #[must_use]
    pub fn get_in(&self, path: &[Key]) -> Option<&Query> {
        let mut current = self;
        let mut rest = path;
        while !rest.is_empty() {
            let (child, consumed) = current.step(rest)?;
            current = child;
            rest = &rest[consumed..];
        }
        Some(current)
    }

    /// Splits a key path into one path per node step.
    #[must_use]
    pub fn split_path(&self, path: &[Key]) -> Option<Vec<KeyPath>> {
        let mut steps = Vec::new();
        let mut current = self;
        let mut rest = path;
        while !rest.is_empty() {
            let (child, consumed) = current.step(rest)?;
            steps.push(rest[..consumed].to_vec());
            current = child;
            rest = &rest[consumed..];
        }
        Some(steps)
    }

    /// Returns a new tree with the node at `path` replaced by `value`.
    ///
    /// Every node along the path is rebuilt with its context kept; everything
    /// off the path is shared with `self`.
    #[must_use]
    pub fn set_in(&self, path: &[Key], value: Query) -> Option<Query> {
        if path.is_empty() {
            return Some(value);
        }
        let (child, consumed) = self.step(path)?;
        let child = child.set_in(&path[consumed..], value)?;
        self.with_child(&path[..consumed], child)
    }

    /// Rebuilds this node with the child at a single step replaced.
    fn with_child(&self, step: &[Key], child: Query) -> Option<Query> {
        let kind = match (self.kind(), step) {
            (QueryKind::Pipeline { items }, [_, Key::Index(i)]) => QueryKind::Pipeline {
                items: items.update(*i, child)?,
            },
            (QueryKind::Select { fields }, [_, Key::Name(name)]) => QueryKind::Select {
                fields: fields.insert(name.clone(), child),
            },
            (QueryKind::Define { binding }, [_, _]) => QueryKind::Define {
                binding: Binding {
                    name: binding.name.clone(),
                    query: child,
                },
            },
            (QueryKind::Filter { .. }, [_]) => QueryKind::Filter { predicate: child },
            (QueryKind::Binary { op, right, .. }, [k]) if k.is_name(keys::LEFT) => {
                QueryKind::Binary {
                    op: *op,
                    left: child,
                    right: right.clone(),
                }
            }
            (QueryKind::Binary { op, left, .. }, [_]) => QueryKind::Binary {
                op: *op,
                left: left.clone(),
                right: child,
            },
            (QueryKind::Not { .. }, [_]) => QueryKind::Not { operand: child },
            _ => return None,
        };
        Some(self.with_kind(kind))
    }

    /// The direct children with the key path of each.
    #[must_use]
    pub fn children(&self) -> Vec<(KeyPath, &Query)> {
        match self.kind() {
            QueryKind::Here
            | QueryKind::Navigate { .. }
            | QueryKind::Limit { .. }
            | QueryKind::Aggregate { .. }
            | QueryKind::Value(_) => Vec::new(),
            QueryKind::Select { fields } => fields
                .iter()
                .map(|(name, q)| (vec![Key::from(keys::SELECT), Key::from(name)], q))
                .collect(),
            QueryKind::Define { binding } => vec![(
                vec![Key::from(keys::BINDING), Key::from(keys::QUERY)],
                &binding.query,
            )],
            QueryKind::Filter { predicate } => vec![(vec![Key::from(keys::PREDICATE)], predicate)],
            QueryKind::Pipeline { items } => items
                .iter()
                .enumerate()
                .map(|(i, q)| (vec![Key::from(keys::PIPELINE), Key::Index(i)], q))
                .collect(),
            QueryKind::Binary { left, right, .. } => vec![
                (vec![Key::from(keys::LEFT)], left),
                (vec![Key::from(keys::RIGHT)], right),
            ],
            QueryKind::Not { operand } => vec![(vec![Key::from(keys::OPERAND)], operand)],
        }
    }
}

impl PartialEq for Query {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || (self.0.kind == other.0.kind && self.0.context == other.0.context)
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("kind", self.kind())
            .field("ty", &self.context().ty)
            .finish()
    }
}

// =============================================================================
// Constructors
// =============================================================================

/// The identity placeholder.
#[must_use]
pub fn here() -> Query {
    Query::new(QueryKind::Here)
}

/// Navigation to an entity, attribute, field or binding.
#[must_use]
pub fn navigate(path: impl Into<String>) -> Query {
    Query::new(QueryKind::Navigate { path: path.into() })
}

/// A select over the given fields.
#[must_use]
pub fn select<K: Into<String>>(fields: impl IntoIterator<Item = (K, Query)>) -> Query {
    Query::new(QueryKind::Select {
        fields: fields.into_iter().collect(),
    })
}

/// A definition binding `name` to `query`.
#[must_use]
pub fn define(name: impl Into<String>, query: Query) -> Query {
    Query::new(QueryKind::Define {
        binding: Binding {
            name: name.into(),
            query,
        },
    })
}

/// A filter with the given predicate.
#[must_use]
pub fn filter(predicate: Query) -> Query {
    Query::new(QueryKind::Filter { predicate })
}

/// A limit.
#[must_use]
pub fn limit(limit: usize) -> Query {
    Query::new(QueryKind::Limit { limit })
}

/// An aggregate application.
#[must_use]
pub fn aggregate(name: impl Into<String>) -> Query {
    Query::new(QueryKind::Aggregate { name: name.into() })
}

/// A pipeline of the given steps.
#[must_use]
pub fn pipeline(items: impl IntoIterator<Item = Query>) -> Query {
    Query::new(QueryKind::Pipeline {
        items: items.into_iter().collect(),
    })
}

/// A constant.
#[must_use]
pub fn value(literal: impl Into<Literal>) -> Query {
    Query::new(QueryKind::Value(literal.into()))
}

/// A binary expression.
#[must_use]
pub fn binary(op: BinaryOp, left: Query, right: Query) -> Query {
    Query::new(QueryKind::Binary { op, left, right })
}

/// A logical negation.
#[must_use]
pub fn not(operand: Query) -> Query {
    Query::new(QueryKind::Not { operand })
}
