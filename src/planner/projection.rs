//! Projection planning
//!
//! Builds the SELECT list and the ORDER BY-eligible list from the
//! authoritative column map, classifying each column against the local
//! table. This is a pure function: two calls on the same inputs return
//! the same lists in the same order.

use serde::{Deserialize, Serialize};

use crate::catalog::TableMetadata;
use crate::database::TableRef;
use crate::dialect::Dialect;

use super::errors::PlanError;
use super::outcome::StepOutcome;

/// Projected and sortable columns, already quoted for the dialect
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projection {
    pub select_columns: Vec<String>,
    /// Subset of `select_columns` that can appear in ORDER BY
    pub sort_columns: Vec<String>,
}

impl Projection {
    pub fn select_list(&self) -> String {
        self.select_columns.join(",")
    }

    pub fn sort_list(&self) -> String {
        self.sort_columns.join(",")
    }
}

/// Plans the projection of `table`.
///
/// Names come from `authoritative` (the paired side's map, or the local
/// map when planning alone) and are folded to the dialect's convention
/// before lookup in `local`. Binary and oversized columns are projected
/// but never sorted. Authoritative columns with no local counterpart are
/// skipped and reported through [`StepOutcome::Partial`].
pub fn plan_projection(
    authoritative: &TableMetadata,
    local: &TableMetadata,
    dialect: &dyn Dialect,
    table: &TableRef,
) -> StepOutcome<Projection> {
    let mut projection = Projection::default();
    let mut skipped = Vec::new();

    for column in authoritative.iter() {
        let folded = dialect.fold_identifier(&column.name);
        let Some(local_column) = local.find(&folded) else {
            skipped.push(column.name.clone());
            continue;
        };

        let projected = dialect.quote_identifier(&local_column.alias).into_owned();
        if !local_column.is_binary_or_oversized() {
            projection.sort_columns.push(projected.clone());
        }
        projection.select_columns.push(projected);
    }

    if projection.select_columns.is_empty() {
        return StepOutcome::Failed(PlanError::no_columns(dialect.kind().as_str(), table));
    }

    if skipped.is_empty() {
        StepOutcome::Complete(projection)
    } else {
        StepOutcome::Partial {
            value: projection,
            skipped,
        }
    }
}
