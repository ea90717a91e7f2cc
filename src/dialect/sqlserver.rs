//! SQL Server dialect

use super::{Dialect, DialectKind};

#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServer;

impl Dialect for SqlServer {
    fn kind(&self) -> DialectKind {
        DialectKind::SqlServer
    }

    fn fold_identifier(&self, ident: &str) -> String {
        ident.to_uppercase()
    }

    // Style 120 is ODBC canonical: yyyy-mm-dd hh:mi:ss
    fn date_to_text(&self, column: &str) -> String {
        format!("CONVERT(VARCHAR(19), {}, 120)", column)
    }

    fn synthetic_rank(&self, sort_columns: &str) -> String {
        format!("ROW_NUMBER() OVER (ORDER BY {})", self.order_key(sort_columns))
    }

    fn ranks_ordered_inner_query(&self) -> bool {
        false
    }

    fn keyless_query(&self, table: &str, key1: &str, columns: &str, _sort_columns: &str) -> String {
        format!(
            "SELECT * FROM (SELECT {key1} AS key1, {cols} FROM {table}) t2",
            key1 = key1,
            cols = columns,
            table = table,
        )
    }

    fn constant_order_key(&self) -> &'static str {
        "(SELECT NULL)"
    }
}
