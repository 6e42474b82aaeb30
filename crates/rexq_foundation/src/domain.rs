//! The domain catalog queries are typed against.
//!
//! A [`Domain`] lists the entity classes with their attributes and the
//! aggregates that can be applied to sequences. It is produced outside the
//! query model (from a schema description) and treated as an immutable
//! snapshot: queries share it through an `Arc` and nothing here mutates it.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::types::{Atom, Type};

/// Computes the result type of an aggregate from the element type.
pub type MakeType = Arc<dyn Fn(&Type) -> Type + Send + Sync>;

/// Decides whether an aggregate accepts the element type.
pub type IsAllowed = Arc<dyn Fn(&Type) -> bool + Send + Sync>;

/// An attribute of an entity class.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeDef {
    /// Human-readable title.
    pub title: String,
    /// The attribute's type, relative to one entity.
    pub ty: Type,
}

/// An entity class.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct EntityDef {
    /// Human-readable title.
    pub title: String,
    /// Attributes by name.
    pub attributes: BTreeMap<String, AttributeDef>,
}

impl EntityDef {
    /// Creates an entity class without attributes.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Adds an attribute.
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, title: impl Into<String>, ty: Type) -> Self {
        self.attributes.insert(
            name.into(),
            AttributeDef {
                title: title.into(),
                ty,
            },
        );
        self
    }
}

/// An aggregate over a sequence, such as `count`.
#[derive(Clone)]
pub struct AggregateDef {
    /// Human-readable title.
    pub title: String,
    make_type: MakeType,
    is_allowed: IsAllowed,
}

impl AggregateDef {
    /// Creates an aggregate from its typing rules.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        make_type: impl Fn(&Type) -> Type + Send + Sync + 'static,
        is_allowed: impl Fn(&Type) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            title: title.into(),
            make_type: Arc::new(make_type),
            is_allowed: Arc::new(is_allowed),
        }
    }

    /// The result type for a sequence of `element`.
    #[must_use]
    pub fn make_type(&self, element: &Type) -> Type {
        (self.make_type)(element)
    }

    /// Whether the aggregate applies to sequences of `element`.
    #[must_use]
    pub fn is_allowed(&self, element: &Type) -> bool {
        (self.is_allowed)(element)
    }
}

impl fmt::Debug for AggregateDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregateDef")
            .field("title", &self.title)
            .finish_non_exhaustive()
    }
}

// Typing rules are closures and cannot be compared; aggregates are identified
// by their title within a domain.
impl PartialEq for AggregateDef {
    fn eq(&self, other: &Self) -> bool {
        self.title == other.title
    }
}

/// The catalog of entities and aggregates.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Domain {
    entities: BTreeMap<String, EntityDef>,
    aggregates: BTreeMap<String, AggregateDef>,
}

impl Domain {
    /// A domain with no entities and no aggregates.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Starts building a domain.
    #[must_use]
    pub fn builder() -> DomainBuilder {
        DomainBuilder::default()
    }

    /// Looks up an entity class.
    #[must_use]
    pub fn entity(&self, name: &str) -> Option<&EntityDef> {
        self.entities.get(name)
    }

    /// Looks up an attribute of an entity class.
    #[must_use]
    pub fn attribute(&self, entity: &str, attribute: &str) -> Option<&AttributeDef> {
        self.entities.get(entity)?.attributes.get(attribute)
    }

    /// Looks up an aggregate.
    #[must_use]
    pub fn aggregate(&self, name: &str) -> Option<&AggregateDef> {
        self.aggregates.get(name)
    }

    /// Iterates entity classes in name order.
    pub fn entities(&self) -> impl Iterator<Item = (&str, &EntityDef)> {
        self.entities.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates aggregates in name order.
    pub fn aggregates(&self) -> impl Iterator<Item = (&str, &AggregateDef)> {
        self.aggregates.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The aggregates every domain offers: `count`, `exists`, `sum`, `mean`,
    /// `min` and `max`.
    #[must_use]
    pub fn standard_aggregates() -> BTreeMap<String, AggregateDef> {
        fn numeric(t: &Type) -> bool {
            matches!(t.as_atom(), Atom::Number)
        }
        fn ordered(t: &Type) -> bool {
            matches!(t.as_atom(), Atom::Number | Atom::Text)
        }

        let mut aggregates = BTreeMap::new();
        aggregates.insert(
            "count".to_string(),
            AggregateDef::new("Count", |_| Type::number(), |_| true),
        );
        aggregates.insert(
            "exists".to_string(),
            AggregateDef::new("Exists", |_| Type::boolean(), |_| true),
        );
        aggregates.insert(
            "sum".to_string(),
            AggregateDef::new("Sum", |_| Type::number(), numeric),
        );
        aggregates.insert(
            "mean".to_string(),
            AggregateDef::new("Mean", |_| Type::opt(Type::number()), numeric),
        );
        aggregates.insert(
            "min".to_string(),
            AggregateDef::new("Min", |t| Type::opt(t.atom()), ordered),
        );
        aggregates.insert(
            "max".to_string(),
            AggregateDef::new("Max", |t| Type::opt(t.atom()), ordered),
        );
        aggregates
    }
}

/// Builder for [`Domain`].
#[derive(Clone, Debug, Default)]
pub struct DomainBuilder {
    domain: Domain,
}

impl DomainBuilder {
    /// Adds an entity class.
    #[must_use]
    pub fn entity(mut self, name: impl Into<String>, entity: EntityDef) -> Self {
        self.domain.entities.insert(name.into(), entity);
        self
    }

    /// Adds an aggregate.
    #[must_use]
    pub fn aggregate(mut self, name: impl Into<String>, aggregate: AggregateDef) -> Self {
        self.domain.aggregates.insert(name.into(), aggregate);
        self
    }

    /// Adds the standard aggregates.
    #[must_use]
    pub fn standard_aggregates(mut self) -> Self {
        self.domain.aggregates.extend(Domain::standard_aggregates());
        self
    }

    /// Finishes the domain.
    #[must_use]
    pub fn build(self) -> Domain {
        self.domain
    }
}

#[cfg(feature = "serde")]
pub use catalog::{AttributeSpec, Catalog, EntitySpec};

#[cfg(feature = "serde")]
mod catalog {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Serialize};

    use super::{Domain, EntityDef};
    use crate::types::Type;

    /// A serializable schema description.
    ///
    /// Aggregates carry typing rules that cannot be serialized, so a catalog
    /// names the standard aggregates it enables instead of defining them.
    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    pub struct Catalog {
        /// Entity classes by name.
        #[serde(default)]
        pub entity: BTreeMap<String, EntitySpec>,
        /// Names of standard aggregates to enable; empty enables all of them.
        #[serde(default)]
        pub aggregate: Vec<String>,
    }

    /// A serialized entity class.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct EntitySpec {
        /// Human-readable title; defaults to the entity name.
        #[serde(default)]
        pub title: Option<String>,
        /// Attributes by name.
        #[serde(default)]
        pub attribute: BTreeMap<String, AttributeSpec>,
    }

    /// A serialized attribute.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct AttributeSpec {
        /// Human-readable title; defaults to the attribute name.
        #[serde(default)]
        pub title: Option<String>,
        /// The attribute's type.
        #[serde(rename = "type")]
        pub ty: Type,
    }

    impl Catalog {
        /// Builds the domain this catalog describes.
        #[must_use]
        pub fn into_domain(self) -> Domain {
            let mut builder = Domain::builder();
            for (name, spec) in self.entity {
                let title = spec.title.unwrap_or_else(|| name.clone());
                let entity = spec.attribute.into_iter().fold(
                    EntityDef::new(title),
                    |entity, (attr, attr_spec)| {
                        let title = attr_spec.title.unwrap_or_else(|| attr.clone());
                        entity.attribute(attr, title, attr_spec.ty)
                    },
                );
                builder = builder.entity(name, entity);
            }
            for (name, aggregate) in Domain::standard_aggregates() {
                if self.aggregate.is_empty() || self.aggregate.contains(&name) {
                    builder = builder.aggregate(name, aggregate);
                }
            }
            builder.build()
        }
    }
}
