//! Error types for the Gavel system.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.

use std::fmt;

use thiserror::Error;

use crate::term::Location;

/// The main error type for Gavel operations.
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

    /// Pushes a frame onto this error's context stack.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.context
            .get_or_insert_with(ErrorContext::new)
            .stack
            .push(frame.into());
        self
    }

    /// Creates a storage not-found error for the given path.
    #[must_use]
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound(path.into()))
    }

    /// Creates a general storage error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Storage(message.into()))
    }

    /// Creates a type mismatch error.
    #[must_use]
    pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        })
    }

    /// Creates a non-composite traversal error.
    #[must_use]
    pub fn non_composite(reference: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(ErrorKind::NonComposite {
            reference: reference.into(),
            path: path.into(),
        })
    }

    /// Creates an unbound variable error.
    #[must_use]
    pub fn unbound_variable(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnboundVariable(name.into()))
    }

    /// Creates a variable object key error.
    #[must_use]
    pub fn variable_key(key: impl Into<String>) -> Self {
        Self::new(ErrorKind::VariableKey(key.into()))
    }

    /// Creates a non-string object key error.
    #[must_use]
    pub fn non_string_key(key: impl Into<String>) -> Self {
        Self::new(ErrorKind::NonStringKey(key.into()))
    }

    /// Creates a conflicting rules error.
    #[must_use]
    pub fn conflicting_rules(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConflictingRules(name.into()))
    }

    /// Creates a bad dereference error.
    #[must_use]
    pub fn bad_dereference(what: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadDereference(what.into()))
    }

    /// Creates an implicit cast error.
    #[must_use]
    pub fn implicit_cast(what: impl Into<String>) -> Self {
        Self::new(ErrorKind::ImplicitCast(what.into()))
    }

    /// Creates a halt sentinel.
    #[must_use]
    pub fn halted() -> Self {
        Self::new(ErrorKind::Halted)
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal(message.into()))
    }

    /// Returns true if this is a storage not-found error.
    ///
    /// Not-found is recovered locally by the evaluator: the affected
    /// branch produces no results instead of failing the query.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, ErrorKind::NotFound(_))
    }

    /// Returns true if this is the host cancellation sentinel.
    #[must_use]
    pub fn is_halted(&self) -> bool {
        matches!(self.kind, ErrorKind::Halted)
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// Storage has no document at the path.
    #[error("storage: not found: {0}")]
    NotFound(String),

    /// Storage failed for a reason other than a missing document.
    #[error("storage: {0}")]
    Storage(String),

    /// A value had the wrong shape for the operation.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// The expected shape.
        expected: String,
        /// The actual shape encountered.
        actual: String,
    },

    /// Reference enumeration reached a non-composite node.
    #[error("unexpected non-composite value via reference {reference} at path {path}")]
    NonComposite {
        /// The reference being evaluated.
        reference: String,
        /// The storage path where the scalar was found.
        path: String,
    },

    /// A variable had no binding where one was required.
    ///
    /// Indicates a compile-time safety violation upstream.
    #[error("unbound variable: {0}")]
    UnboundVariable(String),

    /// Unification attempted to match an object with a non-ground key.
    #[error("cannot unify object with variable key: {0}")]
    VariableKey(String),

    /// An object key was not a string where strings are required.
    #[error("cannot produce object with non-string key: {0}")]
    NonStringKey(String),

    /// More than one complete-document rule at a path.
    #[error("multiple conflicting rules: {0}")]
    ConflictingRules(String),

    /// A rule result cannot be dereferenced.
    #[error("cannot dereference value: {0}")]
    BadDereference(String),

    /// A lone non-boolean scalar appeared as an expression.
    #[error("implicit cast not supported: {0}")]
    ImplicitCast(String),

    /// Evaluation was cancelled by the host iterator.
    #[error("evaluation halted")]
    Halted,

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Source location, if known.
    pub location: Option<Location>,
    /// Stack of evaluation frames, innermost first.
    pub stack: Vec<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the source location.
    #[must_use]
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Adds a stack frame.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.stack.push(frame.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(location) = self.location {
            write!(f, "at {location}")?;
        }
        if !self.stack.is_empty() {
            writeln!(f)?;
            for frame in &self.stack {
                writeln!(f, "  in {frame}")?;
            }
        }
        Ok(())
    }
}
