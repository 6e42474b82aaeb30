//! Error types for the rexq query model.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.
//!
//! Only structural failures are errors. Type errors in a query are data: they
//! are recorded as a missing type on the offending node and never surface here.

use std::fmt;

use thiserror::Error;

use crate::path::{KeyPath, display_path};

/// The main error type for rexq operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Creates an invalid pointer error for a key path that does not resolve.
    #[must_use]
    pub fn invalid_pointer(key_path: KeyPath) -> Self {
        Self::new(ErrorKind::InvalidPointer { key_path })
    }

    /// Creates an error for a sibling move outside a pipeline.
    #[must_use]
    pub fn not_in_pipeline() -> Self {
        Self::new(ErrorKind::NotInPipeline)
    }

    /// Creates a stale pointer error.
    #[must_use]
    pub fn stale_pointer() -> Self {
        Self::new(ErrorKind::StalePointer)
    }

    /// Creates an empty navigation path error.
    #[must_use]
    pub fn empty_path() -> Self {
        Self::new(ErrorKind::EmptyPath)
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal(message.into()))
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A key path does not resolve to a query inside the tree.
    #[error("invalid pointer: {} does not resolve to a query", display_path(.key_path))]
    InvalidPointer {
        /// The key path that failed to resolve.
        key_path: KeyPath,
    },

    /// A sibling move was requested for a pointer whose parent is not a pipeline.
    #[error("pointer does not address a pipeline element")]
    NotInPipeline,

    /// An operation received pointers into a tree that is no longer current.
    #[error("stale pointer: pointer does not address the current query")]
    StalePointer,

    /// A navigation path had no segments.
    #[error("empty navigation path")]
    EmptyPath,

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The operation that failed, e.g. `insert_after`.
    pub operation: Option<String>,
    /// Position of the edited node, when known.
    pub at: Option<KeyPath>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the failing operation.
    #[must_use]
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Sets the position of the edited node.
    #[must_use]
    pub fn with_position(mut self, at: KeyPath) -> Self {
        self.at = Some(at);
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(operation) = &self.operation {
            write!(f, "in {operation}")?;
        }
        if let Some(at) = &self.at {
            if self.operation.is_some() {
                write!(f, " ")?;
            }
            write!(f, "at {}", display_path(at))?;
        }
        Ok(())
    }
}

/// Result type for rexq operations.
pub type Result<T> = std::result::Result<T, Error>;
