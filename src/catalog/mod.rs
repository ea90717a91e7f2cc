//! Catalog builder
//!
//! Introspects a table's columns, applies the configured allow/deny list,
//! classifies each column and computes its decimal rounding pattern. The
//! resulting [`TableMetadata`] is never mutated afterwards.

mod builder;
pub mod classify;
mod types;

pub use builder::{CatalogBuilder, TableCatalog};
pub use types::{ColumnFilter, ColumnMetadata, TableMetadata};
