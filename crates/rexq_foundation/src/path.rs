//! Key paths locating a sub-value inside a query tree.
//!
//! A key path is a list of field names and list indices, e.g.
//! `["pipeline", 1, "select", "name"]`.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One segment of a key path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Key {
    /// A list position.
    Index(usize),
    /// A named field.
    Name(String),
}

impl Key {
    /// Returns true if this segment is the given name.
    #[must_use]
    pub fn is_name(&self, name: &str) -> bool {
        matches!(self, Self::Name(n) if n == name)
    }

    /// Returns the name, if this segment is a name.
    #[must_use]
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Name(n) => Some(n),
            Self::Index(_) => None,
        }
    }

    /// Returns the index, if this segment is an index.
    #[must_use]
    pub const fn as_index(&self) -> Option<usize> {
        match self {
            Self::Index(i) => Some(*i),
            Self::Name(_) => None,
        }
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{i}"),
            Self::Name(n) => write!(f, "{n}"),
        }
    }
}

/// A list of keys, resolved left to right.
pub type KeyPath = Vec<Key>;

/// Renders a key path as `pipeline.1.select.name`; the empty path is `.`.
#[must_use]
pub fn display_path(path: &[Key]) -> String {
    if path.is_empty() {
        return ".".to_string();
    }
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(".")
}

/// Builds a [`KeyPath`] from names and indices.
///
/// ```
/// use rexq_foundation::{Key, key_path};
///
/// let path = key_path!["pipeline", 1usize, "select", "name"];
/// assert_eq!(path[1], Key::Index(1));
/// ```
#[macro_export]
macro_rules! key_path {
    () => {
        $crate::KeyPath::new()
    };
    ($($key:expr),+ $(,)?) => {
        vec![$($crate::Key::from($key)),+]
    };
}
