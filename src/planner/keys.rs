//! Key resolution
//!
//! Chooses the ordering/identity key of a table, first match wins:
//!
//! 1. Sort key and primary key supplied by the paired side
//! 2. Primary key discovered through introspection, ordered by key sequence
//! 3. No key: rows are ranked by a dialect-specific synthetic expression
//!
//! Also synthesizes `key1`, the single expression used both for chunk
//! boundaries and for pairing rows across the two sides.

use serde::{Deserialize, Serialize};

use crate::catalog::TableMetadata;
use crate::database::{Database, TableRef};
use crate::dialect::Dialect;

use super::errors::PlanError;
use super::outcome::StepOutcome;
use super::planner::PairedSide;

/// The active ordering/identity key of a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ResolvedKey {
    /// Propagated from the paired side so both sides order identically
    Explicit {
        sort_key: Vec<String>,
        primary_key: String,
    },
    /// Read from the table's primary key
    Discovered {
        sort_key: Vec<String>,
        primary_key: String,
    },
    /// No natural key; rows are ranked synthetically
    Synthetic,
}

impl ResolvedKey {
    /// Sort key members in order; empty for a synthetic key
    pub fn sort_columns(&self) -> &[String] {
        match self {
            ResolvedKey::Explicit { sort_key, .. } | ResolvedKey::Discovered { sort_key, .. } => {
                sort_key
            }
            ResolvedKey::Synthetic => &[],
        }
    }

    /// Comma-joined sort key
    pub fn sort_key(&self) -> Option<String> {
        match self {
            ResolvedKey::Synthetic => None,
            _ => Some(self.sort_columns().join(",")),
        }
    }

    /// Column used for range predicates
    pub fn primary_key(&self) -> Option<&str> {
        match self {
            ResolvedKey::Explicit { primary_key, .. }
            | ResolvedKey::Discovered { primary_key, .. } => Some(primary_key),
            ResolvedKey::Synthetic => None,
        }
    }

    pub fn has_no_unique_key(&self) -> bool {
        matches!(self, ResolvedKey::Synthetic)
    }

    pub fn source(&self) -> &'static str {
        match self {
            ResolvedKey::Explicit { .. } => "explicit",
            ResolvedKey::Discovered { .. } => "discovered",
            ResolvedKey::Synthetic => "synthetic",
        }
    }
}

/// Resolves the key of one table for one dialect
#[derive(Debug, Clone, Copy)]
pub struct KeyResolver<'a> {
    dialect: &'a dyn Dialect,
}

impl<'a> KeyResolver<'a> {
    pub fn new(dialect: &'a dyn Dialect) -> Self {
        Self { dialect }
    }

    /// Resolves the key by strict priority.
    ///
    /// A failed primary-key lookup yields [`StepOutcome::Degraded`] with a
    /// synthetic key; the caller's policy decides whether that is fatal.
    pub fn resolve<D: Database + ?Sized>(
        &self,
        db: &D,
        table: &TableRef,
        paired: Option<&PairedSide>,
    ) -> StepOutcome<ResolvedKey> {
        if let Some(paired) = paired {
            if paired.has_no_unique_key {
                return StepOutcome::Complete(ResolvedKey::Synthetic);
            }
            if let Some(key) = self.explicit(paired) {
                return StepOutcome::Complete(key);
            }
        }

        let mut members = match db.primary_keys(table) {
            Ok(members) => members,
            Err(e) => {
                return StepOutcome::Degraded {
                    value: ResolvedKey::Synthetic,
                    cause: PlanError::key_lookup(table, &e),
                }
            }
        };

        if members.is_empty() {
            return StepOutcome::Complete(ResolvedKey::Synthetic);
        }

        members.sort_by_key(|m| m.key_seq);
        let sort_key: Vec<String> = members.into_iter().map(|m| m.name).collect();
        let primary_key = sort_key[0].clone();

        StepOutcome::Complete(ResolvedKey::Discovered {
            sort_key,
            primary_key,
        })
    }

    fn explicit(&self, paired: &PairedSide) -> Option<ResolvedKey> {
        let sort_key: Vec<String> = paired
            .sort_key
            .as_deref()?
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(|c| self.dialect.fold_identifier(c))
            .collect();

        let first = sort_key.first()?.clone();

        let primary_key = paired
            .primary_key
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| self.dialect.fold_identifier(p))
            .unwrap_or(first);

        Some(ResolvedKey::Explicit {
            sort_key,
            primary_key,
        })
    }
}

/// Builds the `key1` expression.
///
/// - Composite keys concatenate their members with nested two-argument
///   `concat`, rendering date/timestamp members as text first so both
///   engines produce the same string.
/// - Single-column keys use the primary key column as is.
/// - Synthetic keys use the dialect's rank expression over `sort_columns`.
pub fn unique_key_expression(
    key: &ResolvedKey,
    dialect: &dyn Dialect,
    metadata: &TableMetadata,
    sort_columns: &str,
) -> String {
    let members = key.sort_columns();

    if key.has_no_unique_key() {
        return dialect.synthetic_rank(sort_columns);
    }

    if members.len() > 1 {
        return members
            .iter()
            .map(|member| {
                let quoted = dialect.quote_identifier(member).into_owned();
                match metadata.find(member) {
                    Some(column) if column.is_temporal() => dialect.date_to_text(&quoted),
                    _ => quoted,
                }
            })
            .reduce(|acc, member| format!("concat({},{})", acc, member))
            .unwrap_or_default();
    }

    key.primary_key()
        .map(|pk| dialect.quote_identifier(pk).into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogBuilder;
    use crate::database::{ColumnInfo, MemoryDatabase, TableSnapshot};
    use crate::dialect::DialectKind;

    fn orders() -> TableSnapshot {
        TableSnapshot::new("SALES", "ORDERS")
            .with_column(ColumnInfo::new("ORDER_DATE", "DATE"))
            .with_column(ColumnInfo::new("REGION", "VARCHAR2").with_size(10))
            .with_column(ColumnInfo::new("ORDER_NO", "NUMBER").with_size(10))
            .with_primary_key("ORDER_NO", 3)
            .with_primary_key("REGION", 1)
            .with_primary_key("ORDER_DATE", 2)
    }

    fn table() -> TableRef {
        TableRef::new("SALES", "ORDERS")
    }

    #[test]
    fn test_discovered_key_ordered_by_sequence() {
        let db = MemoryDatabase::with_table(orders());
        let outcome = KeyResolver::new(DialectKind::Oracle.dialect()).resolve(&db, &table(), None);

        let key = outcome.value().unwrap().clone();
        assert!(outcome.is_complete());
        assert_eq!(key.sort_key().as_deref(), Some("REGION,ORDER_DATE,ORDER_NO"));
        assert_eq!(key.primary_key(), Some("REGION"));
        assert!(!key.has_no_unique_key());
    }

    #[test]
    fn test_explicit_key_wins_and_is_case_folded() {
        let db = MemoryDatabase::with_table(orders());
        let paired = PairedSide {
            sort_key: Some("ORDER_NO, REGION".into()),
            primary_key: Some("ORDER_NO".into()),
            ..PairedSide::default()
        };
        let key = KeyResolver::new(DialectKind::PostgreSql.dialect())
            .resolve(&db, &table(), Some(&paired))
            .value()
            .cloned()
            .unwrap();

        assert_eq!(
            key,
            ResolvedKey::Explicit {
                sort_key: vec!["order_no".into(), "region".into()],
                primary_key: "order_no".into(),
            }
        );
        // No introspection needed
        assert_eq!(key.source(), "explicit");
    }

    #[test]
    fn test_paired_keyless_skips_discovery() {
        let db = MemoryDatabase::with_table(orders()).failing_primary_keys();
        let paired = PairedSide {
            has_no_unique_key: true,
            ..PairedSide::default()
        };
        let outcome =
            KeyResolver::new(DialectKind::Oracle.dialect()).resolve(&db, &table(), Some(&paired));
        assert_eq!(outcome, StepOutcome::Complete(ResolvedKey::Synthetic));
    }

    #[test]
    fn test_no_primary_key_is_synthetic() {
        let db = MemoryDatabase::with_table(
            TableSnapshot::new("APP", "LOG").with_column(ColumnInfo::new("MSG", "VARCHAR2")),
        );
        let outcome = KeyResolver::new(DialectKind::Oracle.dialect()).resolve(
            &db,
            &TableRef::new("APP", "LOG"),
            None,
        );
        assert_eq!(outcome, StepOutcome::Complete(ResolvedKey::Synthetic));
    }

    #[test]
    fn test_lookup_failure_degrades() {
        let db = MemoryDatabase::with_table(orders()).failing_primary_keys();
        let outcome = KeyResolver::new(DialectKind::Oracle.dialect()).resolve(&db, &table(), None);
        match outcome {
            StepOutcome::Degraded { value, cause } => {
                assert_eq!(value, ResolvedKey::Synthetic);
                assert_eq!(cause.code().code(), "CHUNKPLAN_SCHEMA_KEY_LOOKUP");
            }
            other => panic!("expected degraded outcome, got {:?}", other),
        }
    }

    #[test]
    fn test_composite_key_wraps_only_temporal_members() {
        let dialect = DialectKind::Oracle.dialect();
        let db = MemoryDatabase::with_table(orders());
        let metadata = CatalogBuilder::new(dialect, 4000, 5)
            .build(&db, &table())
            .unwrap();
        let key = KeyResolver::new(dialect)
            .resolve(&db, &table(), None)
            .value()
            .cloned()
            .unwrap();

        let key1 = unique_key_expression(&key, dialect, &metadata, "");
        assert_eq!(
            key1,
            "concat(concat(REGION,TO_CHAR(ORDER_DATE, 'YYYY-MM-DD HH24:MI:SS')),ORDER_NO)"
        );
    }

    #[test]
    fn test_two_member_key_single_concat() {
        let key = ResolvedKey::Discovered {
            sort_key: vec!["a".into(), "b".into()],
            primary_key: "a".into(),
        };
        let key1 = unique_key_expression(
            &key,
            DialectKind::PostgreSql.dialect(),
            &TableMetadata::new(),
            "",
        );
        assert_eq!(key1, "concat(a,b)");
    }

    #[test]
    fn test_single_column_key() {
        let key = ResolvedKey::Discovered {
            sort_key: vec!["acct#".into()],
            primary_key: "acct#".into(),
        };
        let key1 = unique_key_expression(
            &key,
            DialectKind::PostgreSql.dialect(),
            &TableMetadata::new(),
            "",
        );
        assert_eq!(key1, "\"acct#\"");
    }

    #[test]
    fn test_synthetic_key_uses_dialect_rank() {
        let metadata = TableMetadata::new();
        assert_eq!(
            unique_key_expression(&ResolvedKey::Synthetic, DialectKind::Oracle.dialect(), &metadata, "A"),
            "ROWNUM"
        );
        assert_eq!(
            unique_key_expression(&ResolvedKey::Synthetic, DialectKind::PostgreSql.dialect(), &metadata, "a"),
            "row_number() over()"
        );
        assert_eq!(
            unique_key_expression(&ResolvedKey::Synthetic, DialectKind::SqlServer.dialect(), &metadata, "A"),
            "ROW_NUMBER() OVER (ORDER BY A)"
        );
    }
}
