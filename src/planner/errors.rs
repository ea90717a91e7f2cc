//! Planner error types
//!
//! Error codes:
//! - CHUNKPLAN_CONFIG_INVALID (ConfigurationError)
//! - CHUNKPLAN_SCHEMA_NO_COLUMNS (SchemaError)
//! - CHUNKPLAN_SCHEMA_INTROSPECTION (SchemaError)
//! - CHUNKPLAN_SCHEMA_KEY_LOOKUP (SchemaError)
//! - CHUNKPLAN_DATA_NO_ROWS (DataError)
//! - CHUNKPLAN_DATA_QUERY (DataError)

use std::fmt;

use crate::database::{DatabaseError, TableRef};

/// Error taxonomy exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Rejected before any planning work begins
    Configuration,
    /// The table's shape prevents planning
    Schema,
    /// The table's contents, or a data query, prevent planning
    Data,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Configuration => write!(f, "ConfigurationError"),
            ErrorCategory::Schema => write!(f, "SchemaError"),
            ErrorCategory::Data => write!(f, "DataError"),
        }
    }
}

/// Planner-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanErrorCode {
    /// Unknown dialect or unusable configuration value
    ConfigInvalid,
    /// No visible columns after the allow/deny list
    SchemaNoColumns,
    /// Column introspection failed
    SchemaIntrospection,
    /// Primary-key introspection failed
    SchemaKeyLookup,
    /// Zero filtered rows where the dialect policy requires rows
    DataNoRows,
    /// Count or boundary query failed or returned malformed rows
    DataQuery,
}

impl PlanErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            PlanErrorCode::ConfigInvalid => "CHUNKPLAN_CONFIG_INVALID",
            PlanErrorCode::SchemaNoColumns => "CHUNKPLAN_SCHEMA_NO_COLUMNS",
            PlanErrorCode::SchemaIntrospection => "CHUNKPLAN_SCHEMA_INTROSPECTION",
            PlanErrorCode::SchemaKeyLookup => "CHUNKPLAN_SCHEMA_KEY_LOOKUP",
            PlanErrorCode::DataNoRows => "CHUNKPLAN_DATA_NO_ROWS",
            PlanErrorCode::DataQuery => "CHUNKPLAN_DATA_QUERY",
        }
    }

    /// Returns the taxonomy bucket for this code
    pub fn category(&self) -> ErrorCategory {
        match self {
            PlanErrorCode::ConfigInvalid => ErrorCategory::Configuration,
            PlanErrorCode::SchemaNoColumns
            | PlanErrorCode::SchemaIntrospection
            | PlanErrorCode::SchemaKeyLookup => ErrorCategory::Schema,
            PlanErrorCode::DataNoRows | PlanErrorCode::DataQuery => ErrorCategory::Data,
        }
    }
}

impl fmt::Display for PlanErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Planner error with full context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanError {
    code: PlanErrorCode,
    message: String,
    /// Table being planned, when known
    table: Option<TableRef>,
}

impl PlanError {
    fn new(code: PlanErrorCode, message: impl Into<String>, table: Option<&TableRef>) -> Self {
        Self {
            code,
            message: message.into(),
            table: table.cloned(),
        }
    }

    /// Create a configuration error
    pub fn config_invalid(reason: impl Into<String>) -> Self {
        Self::new(PlanErrorCode::ConfigInvalid, reason, None)
    }

    /// Create a no-visible-columns error
    pub fn no_columns(dialect: &str, table: &TableRef) -> Self {
        Self::new(
            PlanErrorCode::SchemaNoColumns,
            format!("{} Database Table {} has no columns.", dialect, table),
            Some(table),
        )
    }

    /// Create a column introspection error
    pub fn introspection(table: &TableRef, cause: &DatabaseError) -> Self {
        Self::new(
            PlanErrorCode::SchemaIntrospection,
            format!("Column lookup failed for {}: {}", table, cause),
            Some(table),
        )
    }

    /// Create a primary-key lookup error
    pub fn key_lookup(table: &TableRef, cause: &DatabaseError) -> Self {
        Self::new(
            PlanErrorCode::SchemaKeyLookup,
            format!("Primary key lookup failed for {}: {}", table, cause),
            Some(table),
        )
    }

    /// Create a zero-row error
    pub fn no_rows(dialect: &str, table: &TableRef) -> Self {
        Self::new(
            PlanErrorCode::DataNoRows,
            format!("There are no records in {} for {}", dialect, table),
            Some(table),
        )
    }

    /// Create a data query error
    pub fn data_query(table: &TableRef, reason: impl fmt::Display) -> Self {
        Self::new(
            PlanErrorCode::DataQuery,
            format!("Query on {} failed: {}", table, reason),
            Some(table),
        )
    }

    /// Returns the error code
    pub fn code(&self) -> PlanErrorCode {
        self.code
    }

    /// Returns the taxonomy bucket
    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the table identity if applicable
    pub fn table(&self) -> Option<&TableRef> {
        self.table.as_ref()
    }
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.category(),
            self.code.code(),
            self.message
        )
    }
}

impl std::error::Error for PlanError {}

/// Result type for planner operations
pub type PlanResult<T> = Result<T, PlanError>;
