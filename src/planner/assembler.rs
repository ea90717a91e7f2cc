//! Query assembly
//!
//! Composes the data query for one table and plans its chunks alongside,
//! so callers always receive SQL and predicates that agree on `key1`.

use serde::{Deserialize, Serialize};

use crate::database::{Database, TableRef};
use crate::dialect::Dialect;
use crate::observability::{log_event, Event};

use super::chunks::{ChunkPlanner, ChunkSet};
use super::errors::PlanResult;
use super::keys::ResolvedKey;
use super::projection::Projection;

/// Data query plus the chunks that slice it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssembledQuery {
    /// Base SQL without any chunk predicate
    pub sql: String,
    pub chunks: ChunkSet,
}

#[derive(Debug, Clone, Copy)]
pub struct QueryAssembler<'a> {
    dialect: &'a dyn Dialect,
    table: &'a TableRef,
}

impl<'a> QueryAssembler<'a> {
    pub fn new(dialect: &'a dyn Dialect, table: &'a TableRef) -> Self {
        Self { dialect, table }
    }

    /// `SELECT key1, columns FROM schema.table`, or the dialect's keyless
    /// wrapping when `key` is synthetic
    pub fn base_sql(&self, key: &ResolvedKey, key1: &str, projection: &Projection) -> String {
        let qualified = self.table.qualified();
        let columns = projection.select_list();

        if key.has_no_unique_key() {
            self.dialect
                .keyless_query(&qualified, key1, &columns, &projection.sort_list())
        } else {
            format!("SELECT {} AS key1, {} FROM {}", key1, columns, qualified)
        }
    }

    /// Builds the base SQL and plans chunks over `total_rows` rows
    pub fn assemble<D: Database + ?Sized>(
        &self,
        chunk_planner: &ChunkPlanner<'_, D>,
        key: &ResolvedKey,
        key1: &str,
        projection: &Projection,
        total_rows: u64,
        plan_id: &str,
    ) -> PlanResult<AssembledQuery> {
        let sql = self.base_sql(key, key1, projection);

        let qualified = self.table.qualified();
        let wrapping = if !key.has_no_unique_key() {
            "none"
        } else if self.dialect.ranks_ordered_inner_query() {
            "ordered_inner"
        } else {
            "windowed"
        };
        log_event(
            Event::SqlAssembled,
            &[
                ("plan_id", plan_id),
                ("table", qualified.as_str()),
                ("keyless_wrapping", wrapping),
                ("sql", sql.as_str()),
            ],
        );

        let chunks = chunk_planner.plan(key, total_rows, &projection.sort_list())?;

        Ok(AssembledQuery { sql, chunks })
    }
}
