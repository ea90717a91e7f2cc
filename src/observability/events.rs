//! Observable planning events
//!
//! `PLAN_BEGIN`, `PLAN_COMPLETE` and `PLAN_FAILED` come from the `PLAN`
//! observation scope rather than from this enum.

use std::fmt;

use super::logger::Severity;

/// Events emitted while planning a table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Configuration file loaded
    ConfigLoaded,
    /// Column metadata built
    ColumnsLoaded,
    /// Ordering key chosen
    KeyResolved,
    /// Key discovery failed and the plan continues without a natural key
    KeyDegraded,
    /// Authoritative columns missing from the local table
    ProjectionPartial,
    /// Filtered row count obtained
    RowCount,
    /// Boundary query issued
    ChunkQuery,
    /// One chunk range computed
    ChunkRange,
    /// Ranking column is not range-comparable; one ordered chunk emitted
    ChunkRangeBypassed,
    /// All chunks computed
    ChunksReady,
    /// Base SQL assembled
    SqlAssembled,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::ColumnsLoaded => "COLUMNS_LOADED",
            Event::KeyResolved => "KEY_RESOLVED",
            Event::KeyDegraded => "KEY_DEGRADED",
            Event::ProjectionPartial => "PROJECTION_PARTIAL",
            Event::RowCount => "ROW_COUNT",
            Event::ChunkQuery => "CHUNK_QUERY",
            Event::ChunkRange => "CHUNK_RANGE",
            Event::ChunkRangeBypassed => "CHUNK_RANGE_BYPASSED",
            Event::ChunksReady => "CHUNKS_READY",
            Event::SqlAssembled => "SQL_ASSEMBLED",
        }
    }

    /// Severity the event is logged at. Degraded steps log at WARN.
    pub fn severity(&self) -> Severity {
        match self {
            Event::KeyDegraded | Event::ProjectionPartial => Severity::Warn,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
