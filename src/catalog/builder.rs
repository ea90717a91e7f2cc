//! Builds [`TableMetadata`] from column introspection

use crate::config::PlannerConfig;
use crate::database::{ColumnInfo, Database, TableRef};
use crate::dialect::Dialect;
use crate::observability::{Event, Logger};
use crate::planner::{PlanError, PlanResult};

use super::classify;
use super::types::{ColumnFilter, ColumnMetadata, TableMetadata};

/// Column sets produced by one introspection
#[derive(Debug, Clone, PartialEq)]
pub struct TableCatalog {
    /// Columns that survive the allow/deny list
    pub visible: TableMetadata,
    /// Every column the database reported. Key expressions are typed
    /// from this set, since key members may be filtered out.
    pub reported: TableMetadata,
}

/// Reads, filters and classifies the columns of one table
#[derive(Debug, Clone)]
pub struct CatalogBuilder<'a> {
    dialect: &'a dyn Dialect,
    filter: ColumnFilter,
    max_text_size: u32,
    max_decimals: u32,
    plan_id: &'a str,
}

impl<'a> CatalogBuilder<'a> {
    pub fn new(dialect: &'a dyn Dialect, max_text_size: u32, max_decimals: u32) -> Self {
        Self {
            dialect,
            filter: ColumnFilter::all(),
            max_text_size,
            max_decimals,
            plan_id: "",
        }
    }

    /// Builder configured from the planner configuration
    pub fn from_config(dialect: &'a dyn Dialect, config: &PlannerConfig) -> Self {
        Self::new(dialect, config.max_text_size, config.max_decimals).with_filter(
            ColumnFilter::new(config.columns.clone(), config.ignore_columns),
        )
    }

    pub fn with_filter(mut self, filter: ColumnFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Tags log lines with the plan they belong to
    pub fn with_plan_id(mut self, plan_id: &'a str) -> Self {
        self.plan_id = plan_id;
        self
    }

    /// Introspects the table and returns its visible columns.
    ///
    /// Fails with a schema error when introspection fails or when no
    /// column survives the allow/deny list.
    pub fn build<D: Database + ?Sized>(&self, db: &D, table: &TableRef) -> PlanResult<TableMetadata> {
        Ok(self.introspect(db, table)?.visible)
    }

    /// Introspects the table once, keeping both the filtered and the full
    /// column set.
    pub fn introspect<D: Database + ?Sized>(&self, db: &D, table: &TableRef) -> PlanResult<TableCatalog> {
        let columns = db
            .columns(table)
            .map_err(|e| PlanError::introspection(table, &e))?;

        let reported: TableMetadata = columns.iter().map(|c| self.describe(c)).collect();
        let visible: TableMetadata = reported
            .iter()
            .filter(|c| self.filter.admits(&c.name))
            .cloned()
            .collect();

        if visible.is_empty() {
            return Err(PlanError::no_columns(self.dialect.kind().as_str(), table));
        }

        let qualified = table.qualified();
        let reported_count = reported.len().to_string();
        let visible_count = visible.len().to_string();
        Logger::trace(
            Event::ColumnsLoaded.as_str(),
            &[
                ("plan_id", self.plan_id),
                ("table", qualified.as_str()),
                ("reported", reported_count.as_str()),
                ("visible", visible_count.as_str()),
            ],
        );

        Ok(TableCatalog { visible, reported })
    }

    fn describe(&self, info: &ColumnInfo) -> ColumnMetadata {
        let size = info.size.unwrap_or(0);
        let decimal_digits = info.decimal_digits.unwrap_or(0);

        ColumnMetadata {
            name: info.name.clone(),
            type_name: info.type_name.clone(),
            size,
            decimal_digits,
            nullable: info.nullable,
            decimal_format: classify::decimal_format(
                &info.type_name,
                size,
                decimal_digits,
                self.max_decimals,
            ),
            alias: info.name.clone(),
            max_text_size: self.max_text_size,
        }
    }
}
