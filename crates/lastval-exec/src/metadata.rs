//! Column metadata for record shapes.

use lastval_common::{ColumnType, LastValError, Result};
use std::collections::HashMap;

/// Name and type of a single column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMetadata {
    name: String,
    column_type: ColumnType,
}

impl ColumnMetadata {
    /// Creates column metadata.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }

    /// Returns the column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the column type.
    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }
}

/// Ordered list of columns with lookup by name.
#[derive(Debug, Clone, Default)]
pub struct RecordMetadata {
    columns: Vec<ColumnMetadata>,
    by_name: HashMap<String, usize>,
}

impl RecordMetadata {
    /// Creates metadata from an ordered column list. If a name repeats, the
    /// first column with that name wins lookups.
    pub fn new(columns: Vec<ColumnMetadata>) -> Self {
        let mut by_name = HashMap::with_capacity(columns.len());
        for (index, column) in columns.iter().enumerate() {
            by_name.entry(column.name.clone()).or_insert(index);
        }
        Self { columns, by_name }
    }

    /// Creates metadata from `(name, type)` pairs.
    pub fn from_pairs(pairs: &[(&str, ColumnType)]) -> Self {
        Self::new(
            pairs
                .iter()
                .map(|(name, column_type)| ColumnMetadata::new(*name, *column_type))
                .collect(),
        )
    }

    /// Returns the number of columns.
    #[inline]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Returns all columns in order.
    pub fn columns(&self) -> &[ColumnMetadata] {
        &self.columns
    }

    /// Returns the column at `index`.
    ///
    /// # Panics
    /// Panics if `index` is out of range.
    pub fn column(&self, index: usize) -> &ColumnMetadata {
        &self.columns[index]
    }

    /// Returns the type of the column at `index`.
    pub fn column_type(&self, index: usize) -> ColumnType {
        self.columns[index].column_type
    }

    /// Returns the index of the named column.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.column_index_quiet(name)
            .ok_or_else(|| LastValError::ColumnNotFound(name.to_string()))
    }

    /// Returns the index of the named column, or None.
    pub fn column_index_quiet(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Returns metadata holding the given columns, in the given order.
    pub fn select(&self, indexes: &[usize]) -> RecordMetadata {
        Self::new(indexes.iter().map(|&i| self.columns[i].clone()).collect())
    }
}
