//! Key Resolution Tests
//!
//! Tests for key invariants:
//! - Composite keys wrap exactly their date/timestamp members
//! - Tables without a key fall back to the dialect's synthetic rank
//! - Paired-side keys take priority over discovery

use chunkplan::config::{IntrospectionPolicy, PlannerConfig};
use chunkplan::database::{ColumnInfo, MemoryDatabase, TableRef, TableSnapshot};
use chunkplan::planner::{PairedSide, PlanRequest, TablePlan, TablePlanner};
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

fn shipments() -> TableSnapshot {
    TableSnapshot::new("OPS", "SHIPMENTS")
        .with_column(ColumnInfo::new("DEPOT", "VARCHAR2").with_size(8))
        .with_column(ColumnInfo::new("SHIPPED_AT", "TIMESTAMP(6)"))
        .with_column(ColumnInfo::new("SEQ", "NUMBER").with_size(6))
        .with_column(ColumnInfo::new("WEIGHT", "NUMBER").with_size(9).with_decimals(3))
        .with_primary_key("DEPOT", 1)
        .with_primary_key("SHIPPED_AT", 2)
        .with_primary_key("SEQ", 3)
        .with_key_values((1..=12).map(|v| json!(v)))
}

fn events(schema: &str, table: &str, column: &str) -> TableSnapshot {
    TableSnapshot::new(schema, table)
        .with_column(ColumnInfo::new(column, "VARCHAR2").with_size(200))
        .with_row_count(7)
}

fn plan_table(dialect: &str, db: &MemoryDatabase, table: TableRef) -> TablePlan {
    TablePlanner::new(dialect, db, PlannerConfig::default())
        .unwrap()
        .plan(&PlanRequest::new(table))
        .unwrap()
        .as_detail()
        .cloned()
        .unwrap()
}

// =============================================================================
// Composite Key Tests
// =============================================================================

/// Only the timestamp member is converted to text before concatenation.
#[test]
fn test_composite_key_wraps_temporal_members_only() {
    let db = MemoryDatabase::with_table(shipments());
    let plan = plan_table("ORACLE", &db, TableRef::new("OPS", "SHIPMENTS"));

    assert_eq!(
        plan.unique_key,
        "concat(concat(DEPOT,TO_CHAR(SHIPPED_AT, 'YYYY-MM-DD HH24:MI:SS')),SEQ)"
    );
    assert!(!plan.unique_key.contains("TO_CHAR(DEPOT"));
    assert!(!plan.unique_key.contains("TO_CHAR(SEQ"));
    assert_eq!(plan.sort_key.as_deref(), Some("DEPOT,SHIPPED_AT,SEQ"));
    assert_eq!(plan.primary_key.as_deref(), Some("DEPOT"));
    assert!(plan.sql.starts_with("SELECT concat(concat(DEPOT,"));
}

/// SQL Server renders dates with CONVERT style 120.
#[test]
fn test_composite_key_sqlserver_conversion() {
    let db = MemoryDatabase::with_table(shipments());
    let plan = plan_table("SQLSERVER", &db, TableRef::new("OPS", "SHIPMENTS"));
    assert_eq!(
        plan.unique_key,
        "concat(concat(DEPOT,CONVERT(VARCHAR(19), SHIPPED_AT, 120)),SEQ)"
    );
}

/// Key members left out by the allow list are still typed from the catalog.
#[test]
fn test_composite_key_typed_when_members_filtered() {
    let db = MemoryDatabase::with_table(shipments());
    let config = PlannerConfig {
        columns: vec!["DEPOT".into(), "WEIGHT".into()],
        ..PlannerConfig::default()
    };
    let plan = TablePlanner::new("ORACLE", &db, config)
        .unwrap()
        .plan(&PlanRequest::new(TableRef::new("OPS", "SHIPMENTS")))
        .unwrap()
        .as_detail()
        .cloned()
        .unwrap();

    assert_eq!(plan.columns.len(), 2);
    assert!(plan.columns.get("SHIPPED_AT").is_none());
    assert_eq!(
        plan.unique_key,
        "concat(concat(DEPOT,TO_CHAR(SHIPPED_AT, 'YYYY-MM-DD HH24:MI:SS')),SEQ)"
    );
}

// =============================================================================
// Keyless Tests
// =============================================================================

/// No primary key and no paired key means a synthetic rank.
#[test]
fn test_keyless_table_uses_synthetic_rank() {
    let cases = [
        ("ORACLE", "LOGS", "EVENTS", "MSG", "ROWNUM"),
        ("POSTGRESQL", "logs", "events", "msg", "row_number() over()"),
        ("SQLSERVER", "LOGS", "EVENTS", "MSG", "ROW_NUMBER() OVER (ORDER BY MSG)"),
    ];

    for (dialect, schema, table, column, key1) in cases {
        let db = MemoryDatabase::with_table(events(schema, table, column));
        let plan = plan_table(dialect, &db, TableRef::new(schema, table));

        assert!(plan.has_no_unique_key, "{}", dialect);
        assert_eq!(plan.unique_key, key1);
        assert!(plan.sort_key.is_none());
        assert!(plan.primary_key.is_none());
        assert!(plan.sql.contains(&format!("{} AS key1", key1)));
        assert!(plan.chunks[0].predicate.contains("key1 >= 1"));
    }
}

/// Oracle and PostgreSQL rank an ordered inner query; SQL Server does not.
#[test]
fn test_keyless_outer_wrapping() {
    let db = MemoryDatabase::with_table(events("LOGS", "EVENTS", "MSG"));
    let oracle = plan_table("ORACLE", &db, TableRef::new("LOGS", "EVENTS"));
    assert!(oracle.sql.contains("(SELECT MSG FROM LOGS.EVENTS ORDER BY MSG)"));

    let sqlserver = plan_table("SQLSERVER", &db, TableRef::new("LOGS", "EVENTS"));
    assert!(!sqlserver.sql.contains("(SELECT MSG FROM"));
    assert!(sqlserver.sql.contains("FROM LOGS.EVENTS) t2"));
}

/// A keyless paired side forces this side keyless without discovery.
#[test]
fn test_paired_keyless_propagates() {
    let db = MemoryDatabase::with_table(shipments()).failing_primary_keys();
    let paired = PairedSide {
        has_no_unique_key: true,
        ..PairedSide::default()
    };
    let config = PlannerConfig::default().with_introspection_policy(IntrospectionPolicy::Fail);

    let report = TablePlanner::new("ORACLE", &db, config)
        .unwrap()
        .plan(&PlanRequest::new(TableRef::new("OPS", "SHIPMENTS")).with_paired(paired))
        .unwrap();
    let plan = report.as_detail().unwrap();

    assert!(plan.has_no_unique_key);
    assert!(plan.degraded.is_empty());
}

/// Key lookup failure degrades to synthetic under the default policy.
#[test]
fn test_key_lookup_failure_degrades() {
    let db = MemoryDatabase::with_table(shipments()).failing_primary_keys();
    let plan = plan_table("POSTGRESQL", &db, TableRef::new("OPS", "SHIPMENTS"));

    assert!(plan.has_no_unique_key);
    assert_eq!(plan.degraded.len(), 1);
    assert!(plan.degraded[0].reason.contains("CHUNKPLAN_SCHEMA_KEY_LOOKUP"));
}
