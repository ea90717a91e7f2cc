//! Database collaborator seam
//!
//! The planner never owns a connection. It talks to whatever implements
//! [`Database`]: column introspection, primary-key introspection and
//! statement execution. Row sets are fully materialised before `execute`
//! returns, so every cursor is released on every exit path by ownership.

mod errors;
mod memory;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use errors::{DatabaseError, DatabaseResult};
pub use memory::{CatalogSnapshot, MemoryDatabase, TableSnapshot};

/// `schema.table` identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    pub schema: String,
    pub table: String,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
        }
    }

    /// Returns `schema.table`
    pub fn qualified(&self) -> String {
        self.to_string()
    }

    /// Case-insensitive identity match
    pub fn matches(&self, other: &TableRef) -> bool {
        self.schema.eq_ignore_ascii_case(&other.schema)
            && self.table.eq_ignore_ascii_case(&other.table)
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

/// Column metadata as reported by the driver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    /// Engine type name, e.g. `VARCHAR2`, `numeric`, `CLOB`
    pub type_name: String,
    #[serde(default)]
    pub size: Option<u32>,
    #[serde(default)]
    pub decimal_digits: Option<u32>,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

fn default_nullable() -> bool {
    true
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            size: None,
            decimal_digits: None,
            nullable: true,
        }
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_decimals(mut self, digits: u32) -> Self {
        self.decimal_digits = Some(digits);
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }
}

/// One member of a primary key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryKeyColumn {
    pub name: String,
    /// 1-based position inside the key
    pub key_seq: u32,
}

impl PrimaryKeyColumn {
    pub fn new(name: impl Into<String>, key_seq: u32) -> Self {
        Self {
            name: name.into(),
            key_seq,
        }
    }
}

/// Type class of a result column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlType {
    Char,
    Varchar,
    Date,
    Time,
    Timestamp,
    SmallInt,
    Integer,
    BigInt,
    Numeric,
    Decimal,
    Float,
    Double,
    Other,
}

impl SqlType {
    /// Maps a `java.sql.Types` code, as reported by JDBC-style drivers
    pub fn from_type_code(code: i32) -> Self {
        match code {
            1 => SqlType::Char,
            12 => SqlType::Varchar,
            91 => SqlType::Date,
            92 => SqlType::Time,
            93 => SqlType::Timestamp,
            5 => SqlType::SmallInt,
            4 => SqlType::Integer,
            -5 => SqlType::BigInt,
            2 => SqlType::Numeric,
            3 => SqlType::Decimal,
            6 => SqlType::Float,
            8 => SqlType::Double,
            _ => SqlType::Other,
        }
    }

    /// Whether values of this class can be used as numeric range bounds.
    ///
    /// Character and temporal classes cannot.
    pub fn is_range_comparable(&self) -> bool {
        !matches!(
            self,
            SqlType::Char | SqlType::Varchar | SqlType::Date | SqlType::Time | SqlType::Timestamp
        )
    }
}

/// A column of a [`RowSet`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultColumn {
    pub name: String,
    pub sql_type: SqlType,
}

impl ResultColumn {
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
        }
    }
}

/// Materialised query result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowSet {
    pub columns: Vec<ResultColumn>,
    pub rows: Vec<Vec<Value>>,
}

impl RowSet {
    pub fn new(columns: Vec<ResultColumn>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn with_row(mut self, row: Vec<Value>) -> Self {
        self.rows.push(row);
        self
    }

    /// Position of a column by case-insensitive name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Cell by row and case-insensitive column name
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)
    }

    /// Reads an integral cell, such as a count, by column name.
    ///
    /// Accepts JSON integers and integer strings. Fractional values are
    /// rejected rather than truncated.
    pub fn get_i64(&self, row: usize, column: &str) -> Option<i64> {
        match self.get(row, column)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Reads a numeric cell as a range bound, keeping the driver's text.
    ///
    /// Some drivers hand back `NUMBER`/`numeric` aggregates as strings.
    pub fn get_bound(&self, row: usize, column: &str) -> Option<RangeBound> {
        RangeBound::from_value(self.get(row, column)?)
    }
}

/// A numeric chunk bound exactly as the database reported it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RangeBound {
    Int(i64),
    /// Fractional or out-of-range value, kept as its literal text
    Decimal(String),
}

impl RangeBound {
    /// Accepts JSON numbers and numeric strings; anything else is `None`
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => Some(match n.as_i64() {
                Some(i) => RangeBound::Int(i),
                None => RangeBound::Decimal(n.to_string()),
            }),
            Value::String(s) => {
                let text = s.trim();
                if let Ok(i) = text.parse::<i64>() {
                    Some(RangeBound::Int(i))
                } else if text.parse::<f64>().map(f64::is_finite).unwrap_or(false) {
                    Some(RangeBound::Decimal(text.to_string()))
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            RangeBound::Int(i) => Some(*i),
            RangeBound::Decimal(_) => None,
        }
    }
}

impl fmt::Display for RangeBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeBound::Int(i) => write!(f, "{}", i),
            RangeBound::Decimal(text) => write!(f, "{}", text),
        }
    }
}

/// What a statement asks the database for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    /// `SELECT COUNT(*) AS totalrec ...`
    RowCount,
    /// Per-bucket `startRange`, `endRange`, `chunkSize`, `nt`
    ChunkBoundaries { buckets: u64, synthetic_rank: bool },
}

/// A statement issued by the planner.
///
/// Real drivers only need `sql`; `kind` and `table` let test doubles
/// answer without parsing SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub kind: StatementKind,
    pub table: TableRef,
    pub sql: String,
}

impl Statement {
    pub fn new(kind: StatementKind, table: TableRef, sql: impl Into<String>) -> Self {
        Self {
            kind,
            table,
            sql: sql.into(),
        }
    }
}

/// Live database handle consumed by the planner
pub trait Database {
    /// Columns of a table, in database-reported order
    fn columns(&self, table: &TableRef) -> DatabaseResult<Vec<ColumnInfo>>;

    /// Primary-key members of a table, in any order
    fn primary_keys(&self, table: &TableRef) -> DatabaseResult<Vec<PrimaryKeyColumn>>;

    /// Executes a statement and materialises its result
    fn execute(&self, statement: &Statement) -> DatabaseResult<RowSet>;
}

impl<D: Database + ?Sized> Database for &D {
    fn columns(&self, table: &TableRef) -> DatabaseResult<Vec<ColumnInfo>> {
        (**self).columns(table)
    }

    fn primary_keys(&self, table: &TableRef) -> DatabaseResult<Vec<PrimaryKeyColumn>> {
        (**self).primary_keys(table)
    }

    fn execute(&self, statement: &Statement) -> DatabaseResult<RowSet> {
        (**self).execute(statement)
    }
}
