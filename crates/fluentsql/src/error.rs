//! Error types for fluentsql

use thiserror::Error;

/// Result type alias for fluentsql operations
pub type QbResult<T> = Result<T, QbError>;

/// Error types for building and executing statements
#[derive(Debug, Error)]
pub enum QbError {
    /// A builder argument was rejected at construction time
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// `else_if`/`else_`/`end_if` called without an open `if_`
    #[error("Conditional chain error: {0}")]
    FluentState(String),

    /// WHERE/HAVING brackets do not pair up
    #[error("Unbalanced brackets in {section}: {open} opened, {close} closed")]
    UnbalancedBrackets {
        section: &'static str,
        open: usize,
        close: usize,
    },

    /// Query execution error
    #[cfg(feature = "postgres")]
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Error reported by a custom connection adapter
    #[error("Connection error: {0}")]
    Connection(String),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl QbError {
    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create a conditional chain error
    pub fn fluent_state(message: impl Into<String>) -> Self {
        Self::FluentState(message.into())
    }

    /// Create a connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Check if this is an invalid argument error
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    /// Check if this is a conditional chain error
    pub fn is_fluent_state(&self) -> bool {
        matches!(self, Self::FluentState(_))
    }
}
