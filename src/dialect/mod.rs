//! SQL dialects supported by the planner
//!
//! Every engine-specific decision lives behind the [`Dialect`] trait:
//! identifier case folding and quoting, the date-to-text conversion used
//! when composite keys are concatenated, the synthetic rank used when a
//! table has no unique key, the shape of the keyless data query, and the
//! derived-table alias rule used by the chunk boundary query.
//!
//! Planning code never branches on [`DialectKind`]; it asks the dialect.

mod oracle;
mod postgres;
mod sqlserver;

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::ZeroRowPolicy;
use crate::planner::PlanError;

pub use oracle::Oracle;
pub use postgres::PostgreSql;
pub use sqlserver::SqlServer;

/// Identifies one supported engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DialectKind {
    #[serde(rename = "ORACLE")]
    Oracle,
    #[serde(rename = "POSTGRESQL")]
    PostgreSql,
    #[serde(rename = "SQLSERVER")]
    SqlServer,
}

impl DialectKind {
    /// All supported dialects, in a stable order
    pub const ALL: [DialectKind; 3] = [
        DialectKind::Oracle,
        DialectKind::PostgreSql,
        DialectKind::SqlServer,
    ];

    /// Returns the configuration name of this dialect
    pub fn as_str(&self) -> &'static str {
        match self {
            DialectKind::Oracle => "ORACLE",
            DialectKind::PostgreSql => "POSTGRESQL",
            DialectKind::SqlServer => "SQLSERVER",
        }
    }

    /// Returns the strategy implementing this dialect
    pub fn dialect(&self) -> &'static dyn Dialect {
        match self {
            DialectKind::Oracle => &Oracle,
            DialectKind::PostgreSql => &PostgreSql,
            DialectKind::SqlServer => &SqlServer,
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DialectKind {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        DialectKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| PlanError::config_invalid(format!("{} not supported.", name)))
    }
}

/// Per-engine SQL strategy.
///
/// Implementations are stateless unit structs; the planner receives a
/// `&'static dyn Dialect` from [`DialectKind::dialect`].
pub trait Dialect: fmt::Debug + Send + Sync {
    /// Which engine this is
    fn kind(&self) -> DialectKind;

    /// Folds an identifier to the engine's catalog naming convention
    fn fold_identifier(&self, ident: &str) -> String;

    /// Quotes a single identifier when it contains a character the
    /// engine would otherwise reject. Never applied to a whole list.
    fn quote_identifier<'a>(&self, ident: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(ident)
    }

    /// Renders a date/time column as `YYYY-MM-DD HH24:MI:SS` text
    fn date_to_text(&self, column: &str) -> String;

    /// Expression ranking every row when the table has no unique key.
    ///
    /// `sort_columns` is the comma-joined ORDER BY-eligible column list.
    fn synthetic_rank(&self, sort_columns: &str) -> String;

    /// Whether the keyless data query ranks rows of an already-ordered
    /// inner query (as opposed to computing the rank with a window
    /// function over the base table)
    fn ranks_ordered_inner_query(&self) -> bool;

    /// Builds the data query for a table without a unique key.
    ///
    /// The result always exposes `key1` as an addressable column so chunk
    /// predicates can filter on it.
    fn keyless_query(&self, table: &str, key1: &str, columns: &str, sort_columns: &str) -> String;

    /// A constant ordering key for window functions when no column is sortable
    fn constant_order_key(&self) -> &'static str {
        "NULL"
    }

    /// Alias clause for a derived table, including the leading space,
    /// or an empty string when the engine does not require one
    fn derived_table_alias(&self, alias: &str) -> String {
        format!(" {}", alias)
    }

    /// What to do when the filtered row count is zero, absent configuration
    fn default_zero_row_policy(&self) -> ZeroRowPolicy {
        ZeroRowPolicy::Allow
    }

    /// Renders a window ORDER BY target, substituting the constant key
    /// when there is nothing to order by
    fn order_key<'a>(&self, columns: &'a str) -> &'a str {
        if columns.trim().is_empty() {
            self.constant_order_key()
        } else {
            columns
        }
    }

    /// Quotes every identifier of a comma-joined list individually
    fn quote_list(&self, columns: &[String]) -> String {
        columns
            .iter()
            .map(|c| self.quote_identifier(c).into_owned())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Builds the single boundary query that buckets ranked rows.
    ///
    /// Reports `startRange`, `endRange`, `chunkSize` and `nt` per bucket,
    /// ordered by bucket number.
    fn boundary_query(&self, spec: &BoundarySpec<'_>) -> String {
        let filter = spec
            .filter
            .map(|f| format!(" WHERE {}", f))
            .unwrap_or_default();

        let ranked = match spec.rank {
            RankSource::Column(column) => format!(
                "SELECT {col}, NTILE({n}) OVER (ORDER BY {col}) nt FROM {table}{filter}",
                col = column,
                n = spec.buckets,
                table = spec.table,
                filter = filter,
            ),
            RankSource::Synthetic { sort_columns } => format!(
                "SELECT rk, NTILE({n}) OVER (ORDER BY rk) nt FROM (SELECT ROW_NUMBER() OVER (ORDER BY {order}) AS rk FROM {table}{filter}){alias}",
                n = spec.buckets,
                order = self.order_key(sort_columns),
                table = spec.table,
                filter = filter,
                alias = self.derived_table_alias("r"),
            ),
        };

        let column = match spec.rank {
            RankSource::Column(column) => column,
            RankSource::Synthetic { .. } => "rk",
        };

        format!(
            "SELECT MIN({col}) AS startRange, MAX({col}) AS endRange, COUNT(*) AS chunkSize, nt FROM ({ranked}){alias} GROUP BY nt ORDER BY nt",
            col = column,
            ranked = ranked,
            alias = self.derived_table_alias("a"),
        )
    }
}

/// What the boundary query ranks rows by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankSource<'a> {
    /// A natural key column
    Column(&'a str),
    /// A row number over the sortable columns
    Synthetic { sort_columns: &'a str },
}

/// Inputs to [`Dialect::boundary_query`]
#[derive(Debug, Clone, Copy)]
pub struct BoundarySpec<'a> {
    /// `schema.table`
    pub table: &'a str,
    pub rank: RankSource<'a>,
    pub buckets: u64,
    /// Filter applied before ranking, without `WHERE`
    pub filter: Option<&'a str>,
}
