//! Chunk planning
//!
//! Splits a table's filtered rows into ordered, disjoint ranges over the
//! resolved key. One boundary query buckets the ranked rows with `NTILE`
//! and reports each bucket's minimum, maximum and size, so discovery
//! costs one pass over the table regardless of the chunk count.
//!
//! Predicates look like
//! `WHERE (filter) AND key >= lo AND key <= hi ORDER BY sortKey` for the
//! first chunk. Every later chunk starts strictly after the previous
//! chunk's upper bound (`key > prev_hi`), so a boundary row is counted
//! exactly once and the chunks cover every row between them.

use serde::{Deserialize, Serialize};

use crate::config::ZeroRowPolicy;
use crate::database::{Database, RangeBound, RowSet, Statement, StatementKind, TableRef};
use crate::dialect::{BoundarySpec, Dialect, RankSource};
use crate::observability::{log_event, Event, Logger};

use super::errors::{PlanError, PlanResult};
use super::keys::ResolvedKey;

/// Column every keyless data query exposes for range predicates
const SYNTHETIC_KEY_COLUMN: &str = "key1";

/// One contiguous range of rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Lower bound of the range: inclusive for the first chunk, exclusive
    /// (the previous chunk's upper bound) for later ones. `None` when
    /// ranges are bypassed.
    pub lower_bound: Option<RangeBound>,
    /// Largest key value in the chunk; `None` when ranges are bypassed
    pub upper_bound: Option<RangeBound>,
    /// Rows the boundary query placed in this bucket.
    ///
    /// A keyless table is ranked and bucketed without the filter, so with
    /// a predicate filter this counts unfiltered rows and the chunk counts
    /// can exceed [`ChunkSet::row_count`].
    pub row_count: u64,
    /// Filter and order clause appended to the data query
    pub predicate: String,
}

/// Ordered chunks plus the filtered row count they cover
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSet {
    pub chunks: Vec<Chunk>,
    pub row_count: u64,
}

/// Number of buckets the boundary query asks for: `ceil(total / fetch)`,
/// never less than one
pub fn target_chunk_count(total_rows: u64, fetch_size: u64) -> u64 {
    total_rows.div_ceil(fetch_size.max(1)).max(1)
}

/// Counts and partitions the rows of one table
pub struct ChunkPlanner<'a, D: Database + ?Sized> {
    db: &'a D,
    dialect: &'a dyn Dialect,
    table: &'a TableRef,
    fetch_size: u64,
    count_filter: Option<&'a str>,
    chunk_filter: Option<&'a str>,
    zero_row_policy: ZeroRowPolicy,
    plan_id: &'a str,
}

impl<'a, D: Database + ?Sized> ChunkPlanner<'a, D> {
    pub fn new(db: &'a D, dialect: &'a dyn Dialect, table: &'a TableRef, fetch_size: u64) -> Self {
        Self {
            db,
            dialect,
            table,
            fetch_size,
            count_filter: None,
            chunk_filter: None,
            zero_row_policy: dialect.default_zero_row_policy(),
            plan_id: "",
        }
    }

    /// Filter for counting, and for chunk predicates unless `sampling`
    pub fn with_filter(mut self, filter: Option<&'a str>, sampling: bool) -> Self {
        self.count_filter = filter;
        self.chunk_filter = if sampling { None } else { filter };
        self
    }

    pub fn with_zero_row_policy(mut self, policy: ZeroRowPolicy) -> Self {
        self.zero_row_policy = policy;
        self
    }

    pub fn with_plan_id(mut self, plan_id: &'a str) -> Self {
        self.plan_id = plan_id;
        self
    }

    /// `SELECT COUNT(*)` under the count filter
    pub fn row_count_sql(&self) -> String {
        let mut sql = format!("SELECT COUNT(*) AS totalrec FROM {}", self.table.qualified());
        if let Some(filter) = self.count_filter {
            sql.push_str(" WHERE ");
            sql.push_str(filter);
        }
        sql
    }

    /// Runs the row-count query
    pub fn count_rows(&self) -> PlanResult<u64> {
        let statement = Statement::new(StatementKind::RowCount, self.table.clone(), self.row_count_sql());
        let rows = self
            .db
            .execute(&statement)
            .map_err(|e| PlanError::data_query(self.table, e))?;

        let total = rows
            .get_i64(0, "totalrec")
            .filter(|n| *n >= 0)
            .ok_or_else(|| PlanError::data_query(self.table, "row count query returned no count"))?
            as u64;

        let qualified = self.table.qualified();
        let rows_field = total.to_string();
        log_event(
            Event::RowCount,
            &[
                ("plan_id", self.plan_id),
                ("table", qualified.as_str()),
                ("rows", rows_field.as_str()),
            ],
        );

        Ok(total)
    }

    /// Partitions `total_rows` rows into chunks ordered by `key`.
    ///
    /// `sort_columns` is the ORDER BY-eligible list, used to rank rows of
    /// a table without a unique key.
    pub fn plan(&self, key: &ResolvedKey, total_rows: u64, sort_columns: &str) -> PlanResult<ChunkSet> {
        if total_rows == 0 {
            return match self.zero_row_policy {
                ZeroRowPolicy::Fail => Err(PlanError::no_rows(
                    self.dialect.kind().as_str(),
                    self.table,
                )),
                ZeroRowPolicy::Allow => Ok(ChunkSet::default()),
            };
        }

        let buckets = target_chunk_count(total_rows, self.fetch_size);
        let qualified = self.table.qualified();

        let (range_column, order_by) = match key.primary_key() {
            Some(pk) => (
                self.dialect.quote_identifier(pk).into_owned(),
                self.dialect.quote_list(key.sort_columns()),
            ),
            None => (
                SYNTHETIC_KEY_COLUMN.to_string(),
                SYNTHETIC_KEY_COLUMN.to_string(),
            ),
        };

        // The keyless data query ranks the unfiltered table, so its
        // boundary ranks must be computed without the filter too
        let spec = if key.has_no_unique_key() {
            BoundarySpec {
                table: &qualified,
                rank: RankSource::Synthetic { sort_columns },
                buckets,
                filter: None,
            }
        } else {
            BoundarySpec {
                table: &qualified,
                rank: RankSource::Column(&range_column),
                buckets,
                filter: self.chunk_filter,
            }
        };
        let sql = self.dialect.boundary_query(&spec);

        let buckets_field = buckets.to_string();
        Logger::trace(
            Event::ChunkQuery.as_str(),
            &[
                ("plan_id", self.plan_id),
                ("table", qualified.as_str()),
                ("buckets", buckets_field.as_str()),
                ("sql", sql.as_str()),
            ],
        );

        let statement = Statement::new(
            StatementKind::ChunkBoundaries {
                buckets,
                synthetic_rank: key.has_no_unique_key(),
            },
            self.table.clone(),
            sql,
        );
        let rows = self
            .db
            .execute(&statement)
            .map_err(|e| PlanError::data_query(self.table, e))?;

        let chunks = if range_comparable(&rows) {
            self.ranged_chunks(&rows, &range_column, &order_by)?
        } else {
            Logger::info(
                Event::ChunkRangeBypassed.as_str(),
                &[("plan_id", self.plan_id), ("table", qualified.as_str())],
            );
            vec![Chunk {
                lower_bound: None,
                upper_bound: None,
                row_count: total_rows,
                predicate: self.predicate(None, &order_by),
            }]
        };

        let count_field = chunks.len().to_string();
        log_event(
            Event::ChunksReady,
            &[
                ("plan_id", self.plan_id),
                ("table", qualified.as_str()),
                ("chunks", count_field.as_str()),
            ],
        );

        Ok(ChunkSet {
            chunks,
            row_count: total_rows,
        })
    }

    fn ranged_chunks(&self, rows: &RowSet, column: &str, order_by: &str) -> PlanResult<Vec<Chunk>> {
        let mut chunks: Vec<Chunk> = Vec::with_capacity(rows.rows.len());

        for i in 0..rows.rows.len() {
            let (min, upper, size) = match (
                rows.get_bound(i, "startRange"),
                rows.get_bound(i, "endRange"),
                rows.get_i64(i, "chunkSize"),
            ) {
                (Some(lower), Some(upper), Some(size)) => (lower, upper, size.max(0) as u64),
                _ => {
                    return Err(PlanError::data_query(
                        self.table,
                        format!("malformed boundary row {}", i + 1),
                    ))
                }
            };

            let (op, lower) = match chunks.last().and_then(|c| c.upper_bound.clone()) {
                Some(previous) => (">", previous),
                None => (">=", min.clone()),
            };
            let range = format!(
                "{col} {op} {lower} AND {col} <= {upper}",
                col = column,
                op = op,
                lower = lower,
                upper = upper,
            );

            let lower_field = min.to_string();
            let upper_field = upper.to_string();
            let size_field = size.to_string();
            Logger::trace(
                Event::ChunkRange.as_str(),
                &[
                    ("plan_id", self.plan_id),
                    ("min", lower_field.as_str()),
                    ("max", upper_field.as_str()),
                    ("size", size_field.as_str()),
                ],
            );

            chunks.push(Chunk {
                lower_bound: Some(lower),
                upper_bound: Some(upper),
                row_count: size,
                predicate: self.predicate(Some(&range), order_by),
            });
        }

        Ok(chunks)
    }

    fn predicate(&self, range: Option<&str>, order_by: &str) -> String {
        let filter = self.chunk_filter.map(|f| format!("({})", f));
        let conditions: Vec<&str> = filter.as_deref().into_iter().chain(range).collect();

        if conditions.is_empty() {
            format!("ORDER BY {}", order_by)
        } else {
            format!("WHERE {} ORDER BY {}", conditions.join(" AND "), order_by)
        }
    }
}

/// Whether the boundary query's ranking column can carry numeric bounds
fn range_comparable(rows: &RowSet) -> bool {
    rows.column_index("startRange")
        .and_then(|idx| rows.columns.get(idx))
        .map(|c| c.sql_type.is_range_comparable())
        .unwrap_or(true)
}
