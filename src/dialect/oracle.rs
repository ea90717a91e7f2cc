//! Oracle dialect

use super::{Dialect, DialectKind};

#[derive(Debug, Clone, Copy, Default)]
pub struct Oracle;

impl Dialect for Oracle {
    fn kind(&self) -> DialectKind {
        DialectKind::Oracle
    }

    fn fold_identifier(&self, ident: &str) -> String {
        ident.to_uppercase()
    }

    fn date_to_text(&self, column: &str) -> String {
        format!("TO_CHAR({}, 'YYYY-MM-DD HH24:MI:SS')", column)
    }

    fn synthetic_rank(&self, _sort_columns: &str) -> String {
        "ROWNUM".to_string()
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
            "SELECT * FROM (SELECT {key1} AS key1, {cols} FROM (SELECT {cols} FROM {table}{order}))",
            key1 = key1,
            cols = columns,
            table = table,
            order = order,
        )
    }

    // Oracle accepts unaliased inline views
    fn derived_table_alias(&self, _alias: &str) -> String {
        String::new()
    }
}
