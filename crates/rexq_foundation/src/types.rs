//! Inferred types for data flowing through a query.
//!
//! A [`Type`] is an [`Atom`] (the shape of one value) wrapped in a
//! [`Cardinality`]. Keeping the cardinality as a separate field makes nested
//! wrappers such as `seq(opt(T))` unrepresentable: a sequence always absorbs
//! optionality.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::collections::FieldMap;

/// How many values a query point produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Cardinality {
    /// Exactly one value.
    One,
    /// Zero or one value.
    Opt,
    /// Any number of values.
    Seq,
}

impl Cardinality {
    /// Combines two cardinalities; `Seq` dominates `Opt`, which dominates `One`.
    #[must_use]
    pub fn join(self, other: Self) -> Self {
        self.max(other)
    }
}

/// The shape of a single value.
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Atom {
    /// The unit input of a query: nothing navigated yet.
    Void,
    /// An entity of the named class.
    Entity(String),
    /// A numeric value.
    Number,
    /// A text value.
    Text,
    /// A boolean value.
    Boolean,
    /// A record with named fields.
    Record(FieldMap<Type>),
}

/// The inferred type of a query point.
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Type {
    atom: Atom,
    card: Cardinality,
}

impl Type {
    /// Creates a type with an explicit cardinality.
    #[must_use]
    pub fn new(atom: Atom, card: Cardinality) -> Self {
        Self { atom, card }
    }

    /// The void type.
    #[must_use]
    pub fn void() -> Self {
        Atom::Void.into()
    }

    /// A single entity of the named class.
    #[must_use]
    pub fn entity(name: impl Into<String>) -> Self {
        Atom::Entity(name.into()).into()
    }

    /// The number type.
    #[must_use]
    pub fn number() -> Self {
        Atom::Number.into()
    }

    /// The text type.
    #[must_use]
    pub fn text() -> Self {
        Atom::Text.into()
    }

    /// The boolean type.
    #[must_use]
    pub fn boolean() -> Self {
        Atom::Boolean.into()
    }

    /// A record type with the given fields.
    #[must_use]
    pub fn record(fields: FieldMap<Type>) -> Self {
        Atom::Record(fields).into()
    }

    /// Wraps a type as a sequence. Any optionality is absorbed.
    #[must_use]
    pub fn seq(ty: Type) -> Self {
        ty.with_cardinality(Cardinality::Seq)
    }

    /// Wraps a type as optional. A sequence stays a sequence.
    #[must_use]
    pub fn opt(ty: Type) -> Self {
        let card = ty.card.join(Cardinality::Opt);
        ty.with_cardinality(card)
    }

    /// Returns this type with its cardinality replaced.
    #[must_use]
    pub fn with_cardinality(self, card: Cardinality) -> Self {
        Self { card, ..self }
    }

    /// Strips the cardinality wrapper, returning the single-value type.
    #[must_use]
    pub fn atom(&self) -> Type {
        Self {
            atom: self.atom.clone(),
            card: Cardinality::One,
        }
    }

    /// The shape of one value.
    #[must_use]
    pub fn as_atom(&self) -> &Atom {
        &self.atom
    }

    /// The cardinality wrapper.
    #[must_use]
    pub fn cardinality(&self) -> Cardinality {
        self.card
    }

    /// Returns true for `[T]`.
    #[must_use]
    pub fn is_seq(&self) -> bool {
        self.card == Cardinality::Seq
    }

    /// Returns true for `?T`.
    #[must_use]
    pub fn is_opt(&self) -> bool {
        self.card == Cardinality::Opt
    }

    /// Returns true if one value of this type is a boolean.
    #[must_use]
    pub fn is_boolean(&self) -> bool {
        self.atom == Atom::Boolean
    }

    /// Returns true if one value of this type is void.
    #[must_use]
    pub fn is_void(&self) -> bool {
        self.atom == Atom::Void
    }

    /// The entity class name, if one value of this type is an entity.
    #[must_use]
    pub fn entity_name(&self) -> Option<&str> {
        match &self.atom {
            Atom::Entity(name) => Some(name),
            _ => None,
        }
    }

    /// The record fields, if one value of this type is a record.
    #[must_use]
    pub fn record_fields(&self) -> Option<&FieldMap<Type>> {
        match &self.atom {
            Atom::Record(fields) => Some(fields),
            _ => None,
        }
    }
}

impl From<Atom> for Type {
    fn from(atom: Atom) -> Self {
        Self {
            atom,
            card: Cardinality::One,
        }
    }
}

/// The type after navigating from a point of type `a` to something of type `b`.
///
/// The result takes its atom from `b` and the dominant cardinality of the two:
/// navigating inside a sequence keeps the results sequenced. This is not a
/// symmetric join and `least_upper_bound(a, b) != least_upper_bound(b, a)` in
/// general.
#[must_use]
pub fn least_upper_bound(a: &Type, b: &Type) -> Type {
    Type::new(b.atom.clone(), a.card.join(b.card))
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.card {
            Cardinality::One => write!(f, "{:?}", self.atom),
            Cardinality::Opt => write!(f, "?{:?}", self.atom),
            Cardinality::Seq => write!(f, "[{:?}]", self.atom),
        }
    }
}

impl fmt::Debug for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Void => write!(f, "void"),
            Self::Entity(name) => write!(f, "{name}"),
            Self::Number => write!(f, "number"),
            Self::Text => write!(f, "text"),
            Self::Boolean => write!(f, "boolean"),
            Self::Record(fields) => {
                write!(f, "{{")?;
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {ty:?}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
