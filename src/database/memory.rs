//! In-memory database backed by a catalog snapshot
//!
//! Answers introspection from the snapshot and evaluates the two
//! statement kinds the planner issues (row count and chunk boundaries)
//! without parsing SQL. Filters are not evaluated: a snapshot describes
//! the rows that survive the filter.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::errors::{DatabaseError, DatabaseResult};
use super::{
    ColumnInfo, Database, PrimaryKeyColumn, ResultColumn, RowSet, SqlType, Statement,
    StatementKind, TableRef,
};

/// Serializable description of a set of tables
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub tables: Vec<TableSnapshot>,
}

impl CatalogSnapshot {
    /// Reads a snapshot from a JSON file
    pub fn load(path: &Path) -> DatabaseResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            DatabaseError::Unavailable(format!("Failed to read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            DatabaseError::Unavailable(format!("Invalid catalog snapshot {}: {}", path.display(), e))
        })
    }
}

/// One table of a [`CatalogSnapshot`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub schema: String,
    pub table: String,
    pub columns: Vec<ColumnInfo>,
    #[serde(default)]
    pub primary_key: Vec<PrimaryKeyColumn>,
    /// Type class of the first primary-key member
    #[serde(default = "default_key_type")]
    pub key_type: SqlType,
    /// Value of the first primary-key member for every row
    #[serde(default)]
    pub key_values: Vec<Value>,
    /// Row count for tables described without key values
    #[serde(default)]
    pub row_count: Option<u64>,
}

fn default_key_type() -> SqlType {
    SqlType::Numeric
}

impl TableSnapshot {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
            key_type: default_key_type(),
            key_values: Vec::new(),
            row_count: None,
        }
    }

    pub fn with_column(mut self, column: ColumnInfo) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_primary_key(mut self, name: impl Into<String>, key_seq: u32) -> Self {
        self.primary_key.push(PrimaryKeyColumn::new(name, key_seq));
        self
    }

    pub fn with_key_type(mut self, key_type: SqlType) -> Self {
        self.key_type = key_type;
        self
    }

    pub fn with_key_values(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.key_values = values.into_iter().collect();
        self
    }

    pub fn with_row_count(mut self, rows: u64) -> Self {
        self.row_count = Some(rows);
        self
    }

    fn table_ref(&self) -> TableRef {
        TableRef::new(&self.schema, &self.table)
    }

    fn rows(&self) -> u64 {
        self.row_count.unwrap_or(self.key_values.len() as u64)
    }
}

/// [`Database`] implementation over a [`CatalogSnapshot`]
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    snapshot: CatalogSnapshot,
    fail_columns: bool,
    fail_primary_keys: bool,
    fail_execute: bool,
    executed: RefCell<Vec<Statement>>,
}

impl MemoryDatabase {
    pub fn new(snapshot: CatalogSnapshot) -> Self {
        Self {
            snapshot,
            ..Self::default()
        }
    }

    /// Convenience constructor for a single table
    pub fn with_table(table: TableSnapshot) -> Self {
        Self::new(CatalogSnapshot {
            tables: vec![table],
        })
    }

    /// Makes column introspection fail
    pub fn failing_columns(mut self) -> Self {
        self.fail_columns = true;
        self
    }

    /// Makes primary-key introspection fail
    pub fn failing_primary_keys(mut self) -> Self {
        self.fail_primary_keys = true;
        self
    }

    /// Makes statement execution fail
    pub fn failing_execute(mut self) -> Self {
        self.fail_execute = true;
        self
    }

    /// Statements executed so far, oldest first
    pub fn executed(&self) -> Vec<Statement> {
        self.executed.borrow().clone()
    }

    fn find(&self, table: &TableRef) -> DatabaseResult<&TableSnapshot> {
        self.snapshot
            .tables
            .iter()
            .find(|t| t.table_ref().matches(table))
            .ok_or_else(|| DatabaseError::TableNotFound(table.qualified()))
    }

    fn row_count(&self, table: &TableSnapshot) -> RowSet {
        RowSet::new(vec![ResultColumn::new("totalrec", SqlType::BigInt)])
            .with_row(vec![json!(table.rows())])
    }

    fn boundaries(&self, table: &TableSnapshot, buckets: u64, synthetic: bool) -> RowSet {
        let (values, key_type): (Vec<Value>, SqlType) = if synthetic {
            ((1..=table.rows()).map(|rank| json!(rank)).collect(), SqlType::BigInt)
        } else {
            let mut values = table.key_values.clone();
            values.sort_by(compare_values);
            (values, table.key_type)
        };

        let mut result = RowSet::new(vec![
            ResultColumn::new("startRange", key_type),
            ResultColumn::new("endRange", key_type),
            ResultColumn::new("chunkSize", SqlType::BigInt),
            ResultColumn::new("nt", SqlType::BigInt),
        ]);

        for (nt, bucket) in ntile(&values, buckets).into_iter().enumerate() {
            if let (Some(first), Some(last)) = (bucket.first(), bucket.last()) {
                result = result.with_row(vec![
                    first.clone(),
                    last.clone(),
                    json!(bucket.len()),
                    json!(nt + 1),
                ]);
            }
        }

        result
    }
}

impl Database for MemoryDatabase {
    fn columns(&self, table: &TableRef) -> DatabaseResult<Vec<ColumnInfo>> {
        if self.fail_columns {
            return Err(DatabaseError::Introspection(format!(
                "column metadata unavailable for {}",
                table
            )));
        }
        Ok(self.find(table)?.columns.clone())
    }

    fn primary_keys(&self, table: &TableRef) -> DatabaseResult<Vec<PrimaryKeyColumn>> {
        if self.fail_primary_keys {
            return Err(DatabaseError::Introspection(format!(
                "primary key metadata unavailable for {}",
                table
            )));
        }
        Ok(self.find(table)?.primary_key.clone())
    }

    fn execute(&self, statement: &Statement) -> DatabaseResult<RowSet> {
        self.executed.borrow_mut().push(statement.clone());

        if self.fail_execute {
            return Err(DatabaseError::Query(format!(
                "statement rejected: {}",
                statement.sql
            )));
        }

        let table = self.find(&statement.table)?;
        Ok(match statement.kind {
            StatementKind::RowCount => self.row_count(table),
            StatementKind::ChunkBoundaries {
                buckets,
                synthetic_rank,
            } => self.boundaries(table, buckets, synthetic_rank),
        })
    }
}

/// Splits ordered values into `buckets` groups the way `NTILE` does:
/// sizes differ by at most one and larger groups come first.
fn ntile(values: &[Value], buckets: u64) -> Vec<&[Value]> {
    let n = buckets.max(1) as usize;
    let base = values.len() / n;
    let extra = values.len() % n;

    let mut groups = Vec::with_capacity(n);
    let mut start = 0;
    for i in 0..n {
        let len = base + usize::from(i < extra);
        if len == 0 {
            break;
        }
        groups.push(&values[start..start + len]);
        start += len;
    }
    groups
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        _ => a.to_string().cmp(&b.to_string()),
    }
}
