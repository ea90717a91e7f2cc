//! Column and table metadata

use serde::{Deserialize, Serialize};

use super::classify;

/// Metadata for one visible column, immutable once built
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    pub name: String,
    pub type_name: String,
    pub size: u32,
    pub decimal_digits: u32,
    pub nullable: bool,
    /// Rounding pattern for numeric columns, empty otherwise
    pub decimal_format: String,
    /// Expression projected for this column
    pub alias: String,
    /// Threshold used to classify this column as oversized
    pub max_text_size: u32,
}

impl ColumnMetadata {
    /// Whether the column may be projected but not ordered by
    pub fn is_binary_or_oversized(&self) -> bool {
        classify::is_binary_or_oversized(&self.type_name, self.size, self.max_text_size)
    }

    /// Whether the column holds a date, time or timestamp
    pub fn is_temporal(&self) -> bool {
        classify::is_temporal(&self.type_name)
    }
}

/// Ordered column-name to metadata mapping.
///
/// Order is the database-reported column order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableMetadata {
    columns: Vec<ColumnMetadata>,
}

impl TableMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a column, replacing an existing entry of the same name in place
    pub fn insert(&mut self, column: ColumnMetadata) {
        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
    }

    /// Exact-name lookup
    pub fn get(&self, name: &str) -> Option<&ColumnMetadata> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Exact-name lookup, falling back to a case-insensitive match
    pub fn find(&self, name: &str) -> Option<&ColumnMetadata> {
        self.get(name).or_else(|| {
            self.columns
                .iter()
                .find(|c| c.name.eq_ignore_ascii_case(name))
        })
    }

    /// Column names in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnMetadata> {
        self.columns.iter()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl FromIterator<ColumnMetadata> for TableMetadata {
    fn from_iter<I: IntoIterator<Item = ColumnMetadata>>(iter: I) -> Self {
        let mut metadata = TableMetadata::new();
        for column in iter {
            metadata.insert(column);
        }
        metadata
    }
}

/// Allow or deny list applied while reading columns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnFilter {
    names: Vec<String>,
    /// true: `names` is a deny list; false: an allow list
    ignore: bool,
}

impl ColumnFilter {
    pub fn new(names: Vec<String>, ignore: bool) -> Self {
        Self { names, ignore }
    }

    /// A filter that admits every column
    pub fn all() -> Self {
        Self::default()
    }

    /// Whether a column is visible.
    ///
    /// Listed columns are admitted by an allow list and excluded by a deny
    /// list; unlisted columns are excluded by a non-empty allow list.
    pub fn admits(&self, column: &str) -> bool {
        let listed = self.names.iter().any(|n| n.eq_ignore_ascii_case(column));
        if listed {
            !self.ignore
        } else {
            self.names.is_empty() || self.ignore
        }
    }
}
