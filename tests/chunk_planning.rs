//! Chunk Planning Tests
//!
//! Tests for chunk invariants:
//! - Chunk count is ceil(rows / fetch size), at least one
//! - First chunk uses an inclusive lower bound, later chunks exclusive
//! - Chunks partition every filtered row exactly once
//! - Zero filtered rows fail or succeed per dialect

use chunkplan::config::{PlannerConfig, ZeroRowPolicy};
use chunkplan::database::{ColumnInfo, MemoryDatabase, RangeBound, SqlType, TableRef, TableSnapshot};
use chunkplan::planner::{target_chunk_count, ErrorCategory, PlanRequest, TablePlan, TablePlanner};
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

fn accounts(dialect: &str, rows: i64) -> TableSnapshot {
    let (schema, table, id, name) = if dialect == "POSTGRESQL" {
        ("bank", "accounts", "account_id", "holder")
    } else {
        ("BANK", "ACCOUNTS", "ACCOUNT_ID", "HOLDER")
    };
    TableSnapshot::new(schema, table)
        .with_column(ColumnInfo::new(id, "NUMBER").with_size(12).not_null())
        .with_column(ColumnInfo::new(name, "VARCHAR2").with_size(80))
        .with_primary_key(id, 1)
        .with_key_values((1..=rows).map(|v| json!(v * 10)))
}

fn plan(dialect: &str, db: &MemoryDatabase, config: PlannerConfig) -> TablePlan {
    let table = if dialect == "POSTGRESQL" {
        TableRef::new("bank", "accounts")
    } else {
        TableRef::new("BANK", "ACCOUNTS")
    };
    TablePlanner::new(dialect, db, config)
        .unwrap()
        .plan(&PlanRequest::new(table))
        .unwrap()
        .as_detail()
        .cloned()
        .unwrap()
}

fn int(bound: &Option<RangeBound>) -> i64 {
    bound.as_ref().and_then(RangeBound::as_i64).unwrap()
}

fn rates(values: Vec<serde_json::Value>) -> MemoryDatabase {
    MemoryDatabase::with_table(
        TableSnapshot::new("FIN", "RATES")
            .with_column(ColumnInfo::new("RATE_ID", "NUMBER").with_size(6).with_decimals(2))
            .with_primary_key("RATE_ID", 1)
            .with_key_type(SqlType::Decimal)
            .with_key_values(values),
    )
}

fn plan_rates(db: &MemoryDatabase, fetch_size: u64) -> TablePlan {
    TablePlanner::new("ORACLE", db, PlannerConfig::default().with_fetch_size(fetch_size))
        .unwrap()
        .plan(&PlanRequest::new(TableRef::new("FIN", "RATES")))
        .unwrap()
        .as_detail()
        .cloned()
        .unwrap()
}

// =============================================================================
// Chunk Count Tests
// =============================================================================

/// 250 rows at fetch size 100 yield exactly 3 chunks.
#[test]
fn test_250_rows_fetch_100_yields_three_chunks() {
    assert_eq!(target_chunk_count(250, 100), 3);

    for dialect in ["ORACLE", "POSTGRESQL", "SQLSERVER"] {
        let db = MemoryDatabase::with_table(accounts(dialect, 250));
        let plan = plan(dialect, &db, PlannerConfig::default().with_fetch_size(100));
        assert_eq!(plan.chunks.len(), 3, "{}", dialect);
        assert_eq!(plan.row_count, 250);
    }
}

/// An empty table still asks for one bucket.
#[test]
fn test_zero_rows_minimum_one_target() {
    assert_eq!(target_chunk_count(0, 100), 1);
    assert_eq!(target_chunk_count(0, 1), 1);
}

// =============================================================================
// Predicate Shape Tests
// =============================================================================

/// First chunk uses >=, later chunks use >, every chunk ends its range with <=.
#[test]
fn test_bound_operators() {
    let db = MemoryDatabase::with_table(accounts("ORACLE", 250));
    let plan = plan("ORACLE", &db, PlannerConfig::default().with_fetch_size(100));

    assert!(plan.chunks[0].predicate.contains("ACCOUNT_ID >= "));
    for chunk in &plan.chunks[1..] {
        assert!(chunk.predicate.contains("ACCOUNT_ID > "));
        assert!(!chunk.predicate.contains(">="));
    }
    for chunk in &plan.chunks {
        assert!(chunk.predicate.contains("ACCOUNT_ID <= "));
        assert!(chunk.predicate.ends_with("ORDER BY ACCOUNT_ID"));
    }
}

/// Adjacent chunks share a bound: each starts strictly after the previous upper bound.
#[test]
fn test_chunks_are_contiguous_and_disjoint() {
    let db = MemoryDatabase::with_table(accounts("SQLSERVER", 1003));
    let plan = plan("SQLSERVER", &db, PlannerConfig::default().with_fetch_size(100));

    assert_eq!(plan.chunks.len(), 11);
    for pair in plan.chunks.windows(2) {
        assert_eq!(pair[1].lower_bound, pair[0].upper_bound);
        assert!(int(&pair[1].upper_bound) > int(&pair[0].upper_bound));
    }

    // Every key value falls in exactly one chunk
    for value in (1..=1003).map(|v| v * 10) {
        let owners = plan
            .chunks
            .iter()
            .enumerate()
            .filter(|(i, c)| {
                let lower = int(&c.lower_bound);
                let upper = int(&c.upper_bound);
                let above = if *i == 0 { value >= lower } else { value > lower };
                above && value <= upper
            })
            .count();
        assert_eq!(owners, 1, "key {}", value);
    }

    let covered: u64 = plan.chunks.iter().map(|c| c.row_count).sum();
    assert_eq!(covered, 1003);
}

/// A predicate filter is parenthesized and ANDed into every chunk.
#[test]
fn test_filter_in_every_chunk() {
    let db = MemoryDatabase::with_table(accounts("ORACLE", 30));
    let config = PlannerConfig::default()
        .with_fetch_size(10)
        .with_filter("HOLDER LIKE 'A%' OR HOLDER IS NULL", None);
    let plan = plan("ORACLE", &db, config);

    for chunk in &plan.chunks {
        assert!(chunk
            .predicate
            .starts_with("WHERE (HOLDER LIKE 'A%' OR HOLDER IS NULL) AND ACCOUNT_ID"));
    }
}

/// Fractional and negative keys keep their exact text in the bounds.
#[test]
fn test_fractional_keys_covered() {
    let keys: Vec<f64> = (0..10).map(|v| v as f64 - 4.5).collect();
    let db = rates(keys.iter().map(|v| json!(v)).collect());
    let plan = plan_rates(&db, 5);

    assert_eq!(plan.chunks.len(), 2);
    assert_eq!(
        plan.chunks[0].predicate,
        "WHERE RATE_ID >= -4.5 AND RATE_ID <= -0.5 ORDER BY RATE_ID"
    );
    assert_eq!(
        plan.chunks[1].predicate,
        "WHERE RATE_ID > -0.5 AND RATE_ID <= 4.5 ORDER BY RATE_ID"
    );
    assert_eq!(plan.chunks[1].upper_bound, Some(RangeBound::Decimal("4.5".into())));
}

/// Bounds returned as numeric strings are used verbatim.
#[test]
fn test_numeric_string_bounds() {
    let db = rates(vec![json!("1.25"), json!("2.50"), json!("3.75")]);
    let plan = plan_rates(&db, 2);

    assert_eq!(plan.chunks.len(), 2);
    assert_eq!(
        plan.chunks[0].predicate,
        "WHERE RATE_ID >= 1.25 AND RATE_ID <= 2.50 ORDER BY RATE_ID"
    );
    assert_eq!(
        plan.chunks[1].predicate,
        "WHERE RATE_ID > 2.50 AND RATE_ID <= 3.75 ORDER BY RATE_ID"
    );
}

// =============================================================================
// Zero Row Policy Tests
// =============================================================================

/// PostgreSQL rejects an empty filtered table; the others return no chunks.
#[test]
fn test_zero_rows_per_dialect() {
    let db = MemoryDatabase::with_table(accounts("POSTGRESQL", 0));
    let err = TablePlanner::new("POSTGRESQL", &db, PlannerConfig::default())
        .unwrap()
        .plan(&PlanRequest::new(TableRef::new("bank", "accounts")))
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Data);
    assert!(err.message().contains("bank.accounts"));
    assert_eq!(err.table(), Some(&TableRef::new("bank", "accounts")));

    for dialect in ["ORACLE", "SQLSERVER"] {
        let db = MemoryDatabase::with_table(accounts(dialect, 0));
        let plan = plan(dialect, &db, PlannerConfig::default());
        assert!(plan.chunks.is_empty());
        assert_eq!(plan.row_count, 0);
    }
}

/// Configuration can override the per-dialect zero-row default.
#[test]
fn test_zero_row_policy_configurable() {
    let db = MemoryDatabase::with_table(accounts("POSTGRESQL", 0));
    let config = PlannerConfig::default().with_zero_row_policy(ZeroRowPolicy::Allow);
    let plan = plan("POSTGRESQL", &db, config);
    assert!(plan.chunks.is_empty());
}
