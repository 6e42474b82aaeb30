//! Pointers into immutable query trees.
//!
//! A [`QueryPointer`] is a zipper kept as an explicit breadcrumb stack: the
//! first link holds the root, and each further link records the key path
//! taken from the previous node together with the node it reached. Since
//! trees are never mutated, a pointer stays valid for the tree it was made
//! from; after an edit it is carried over to the new tree with
//! [`QueryPointer::rebase`], which replays the key paths from scratch.

use rexq_foundation::{Error, Key, KeyPath, QVec, Result, display_path};

use crate::ast::{Query, keys};

/// One breadcrumb: the key path from the previous node and the node reached.
#[derive(Clone, Debug)]
pub struct Link {
    key_path: KeyPath,
    query: Query,
}

impl Link {
    /// The key path from the previous link's query.
    #[must_use]
    pub fn key_path(&self) -> &[Key] {
        &self.key_path
    }

    /// The node this link reached.
    #[must_use]
    pub fn query(&self) -> &Query {
        &self.query
    }
}

/// A position inside a query tree.
#[derive(Clone, Debug)]
pub struct QueryPointer {
    // Never empty; links[0] is the root with an empty key path.
    links: QVec<Link>,
}

impl QueryPointer {
    /// A pointer to the root of `query`.
    #[must_use]
    pub fn new(query: Query) -> Self {
        Self {
            links: QVec::new().push_back(Link {
                key_path: KeyPath::new(),
                query,
            }),
        }
    }

    fn tip(&self) -> &Link {
        // links is never empty
        self.links
            .last()
            .unwrap_or_else(|| unreachable!("query pointer without links"))
    }

    /// The node this pointer addresses.
    #[must_use]
    pub fn query(&self) -> &Query {
        &self.tip().query
    }

    /// The key path of the last link, relative to the previous node.
    #[must_use]
    pub fn key_path(&self) -> &[Key] {
        &self.tip().key_path
    }

    /// The root of the tree this pointer addresses into.
    #[must_use]
    pub fn root_query(&self) -> &Query {
        &self
            .links
            .first()
            .unwrap_or_else(|| unreachable!("query pointer without links"))
            .query
    }

    /// The pointer one link up, or `None` at the root.
    #[must_use]
    pub fn prev(&self) -> Option<QueryPointer> {
        (self.links.len() > 1).then(|| Self {
            links: self.links.truncate(self.links.len() - 1),
        })
    }

    /// The pointer to the root.
    #[must_use]
    pub fn root(&self) -> QueryPointer {
        Self {
            links: self.links.truncate(1),
        }
    }

    /// Number of links below the root.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.links.len() - 1
    }

    /// The raw links, root first.
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.iter()
    }

    /// Every pointer on the way from the root to this one, root first.
    #[must_use]
    pub fn trace(&self) -> Vec<QueryPointer> {
        (1..=self.links.len())
            .map(|len| Self {
                links: self.links.truncate(len),
            })
            .collect()
    }

    /// The key path from the root to this node, flattened.
    #[must_use]
    pub fn path(&self) -> KeyPath {
        self.links
            .iter()
            .flat_map(|link| link.key_path.iter().cloned())
            .collect()
    }

    /// Descends along `key_path`, pushing one link.
    ///
    /// # Errors
    ///
    /// Returns an invalid pointer error if `key_path` is empty or does not
    /// resolve to a query below this one.
    pub fn select(&self, key_path: &[Key]) -> Result<QueryPointer> {
        if key_path.is_empty() {
            return Err(Error::invalid_pointer(KeyPath::new()));
        }
        let query = self
            .query()
            .get_in(key_path)
            .ok_or_else(|| Error::invalid_pointer(key_path.to_vec()))?
            .clone();
        Ok(Self {
            links: self.links.push_back(Link {
                key_path: key_path.to_vec(),
                query,
            }),
        })
    }

    /// Descends along each key path in turn, one link per path.
    ///
    /// # Errors
    ///
    /// Returns an invalid pointer error on the first path that does not
    /// resolve.
    pub fn select_all<P: AsRef<[Key]>>(
        &self,
        key_paths: impl IntoIterator<Item = P>,
    ) -> Result<QueryPointer> {
        key_paths
            .into_iter()
            .try_fold(self.clone(), |pointer, path| pointer.select(path.as_ref()))
    }

    /// Descends along a flat key path, one link per node step.
    ///
    /// # Errors
    ///
    /// Returns an invalid pointer error if `path` does not resolve.
    pub fn select_path(&self, path: &[Key]) -> Result<QueryPointer> {
        let steps = self
            .query()
            .split_path(path)
            .ok_or_else(|| Error::invalid_pointer(path.to_vec()))?;
        self.select_all(steps)
    }

    /// Replays this pointer's key paths against another tree.
    ///
    /// # Errors
    ///
    /// Returns an invalid pointer error if the new tree does not have a node
    /// at this position.
    pub fn rebase(&self, query: Query) -> Result<QueryPointer> {
        self.select_all_from(QueryPointer::new(query))
    }

    fn select_all_from(&self, start: QueryPointer) -> Result<QueryPointer> {
        start.select_all(self.links.iter().skip(1).map(|link| link.key_path.as_slice()))
    }

    /// Moves to a sibling inside the enclosing pipeline.
    ///
    /// # Errors
    ///
    /// Returns a not-in-pipeline error unless the last link is
    /// `["pipeline", i]` from a pipeline, and an invalid pointer error when
    /// the target index is out of range.
    pub fn move_by(&self, delta: isize) -> Result<QueryPointer> {
        let prev = self.prev().ok_or_else(Error::not_in_pipeline)?;
        let index = match self.key_path() {
            [k, Key::Index(i)] if k.is_name(keys::PIPELINE) && prev.query().is_pipeline() => *i,
            _ => return Err(Error::not_in_pipeline()),
        };
        let target = index
            .checked_add_signed(delta)
            .ok_or_else(|| Error::invalid_pointer(self.path()))?;
        prev.select(&[Key::from(keys::PIPELINE), Key::Index(target)])
    }

    /// Positional equality: both pointers took the same key paths.
    ///
    /// Node contents are not compared, so pointers into different versions
    /// of a tree are equal when they address the same position.
    #[must_use]
    pub fn is(&self, other: &QueryPointer) -> bool {
        self.links.len() == other.links.len()
            && self
                .links
                .iter()
                .zip(other.links.iter())
                .all(|(a, b)| a.key_path == b.key_path)
    }

    /// Checks that this pointer addresses into `current`.
    ///
    /// # Errors
    ///
    /// Returns a stale pointer error if the pointer was made from another
    /// tree.
    pub fn ensure_root(&self, current: &Query) -> Result<()> {
        let root = self.root_query();
        if root.ptr_eq(current) || root == current {
            Ok(())
        } else {
            tracing::debug!(at = %display_path(&self.path()), "stale pointer");
            Err(Error::stale_pointer())
        }
    }
}
