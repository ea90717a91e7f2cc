//! PostgreSQL dialect

use std::borrow::Cow;

use super::{Dialect, DialectKind};
use crate::config::ZeroRowPolicy;

/// Marker character that forces an identifier to be quoted
const QUOTE_MARKER: char = '#';

#[derive(Debug, Clone, Copy, Default)]
pub struct PostgreSql;

impl Dialect for PostgreSql {
    fn kind(&self) -> DialectKind {
        DialectKind::PostgreSql
    }

    fn fold_identifier(&self, ident: &str) -> String {
        ident.to_lowercase()
    }

    fn quote_identifier<'a>(&self, ident: &'a str) -> Cow<'a, str> {
        if ident.contains(QUOTE_MARKER) && !ident.starts_with('"') {
            Cow::Owned(format!("\"{}\"", ident))
        } else {
            Cow::Borrowed(ident)
        }
    }

    fn date_to_text(&self, column: &str) -> String {
        format!("TO_CHAR({}, 'YYYY-MM-DD HH24:MI:SS')", column)
    }

    fn synthetic_rank(&self, _sort_columns: &str) -> String {
        "row_number() over()".to_string()
    }

    fn ranks_ordered_inner_query(&self) -> bool {
        true
    }

    fn keyless_query(&self, table: &str, key1: &str, columns: &str, sort_columns: &str) -> String {
        let order = if sort_columns.is_empty() {
            String::new()
        } else {
            format!(" ORDER BY {}", sort_columns)
        };
        format!(
            "SELECT t2.* FROM (SELECT {key1} AS key1, {cols} FROM (SELECT {cols} FROM {table}{order}) t1) t2",
            key1 = key1,
            cols = columns,
            table = table,
            order = order,
        )
    }

    fn default_zero_row_policy(&self) -> ZeroRowPolicy {
        ZeroRowPolicy::Fail
    }
}
