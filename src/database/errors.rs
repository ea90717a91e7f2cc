//! Failures reported by a database collaborator

use thiserror::Error;

/// Result type for collaborator calls
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Errors raised by a [`Database`](super::Database) implementation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatabaseError {
    #[error("Query failed: {0}")]
    Query(String),

    #[error("Catalog introspection failed: {0}")]
    Introspection(String),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Connection unavailable: {0}")]
    Unavailable(String),
}
