use std::collections::HashMap;
use std::sync::Arc;

use crate::types::RowValues;

/// Column name to position, shared by every row of a result.
pub(crate) type ColumnIndex = Arc<HashMap<String, usize>>;

pub(crate) fn build_column_index(column_names: &[String]) -> ColumnIndex {
    let mut index = HashMap::with_capacity(column_names.len());
    for (i, name) in column_names.iter().enumerate() {
        // first occurrence wins for duplicated names
        index.entry(name.clone()).or_insert(i);
    }
    Arc::new(index)
}

/// A single decoded row.
///
/// Column names and the name lookup table are shared with the other rows of the result.
#[derive(Debug, Clone)]
pub struct Row {
    /// The column names for this row (shared across all rows of a result)
    pub column_names: Arc<Vec<String>>,
    /// The values for this row, one per column
    pub values: Vec<RowValues>,
    column_index: ColumnIndex,
}

impl Row {
    /// Create a row from column names and values
    ///
    /// # Arguments
    ///
    /// * `column_names` - The column names, shared with the other rows of the result
    /// * `values` - The values for this row, in column order
    ///
    /// # Returns
    ///
    /// A new `Row` with its own name lookup table
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>, values: Vec<RowValues>) -> Self {
        let column_index = build_column_index(&column_names);
        Self {
            column_names,
            values,
            column_index,
        }
    }

    pub(crate) fn with_index(
        column_names: Arc<Vec<String>>,
        column_index: ColumnIndex,
        values: Vec<RowValues>,
    ) -> Self {
        Self {
            column_names,
            values,
            column_index,
        }
    }

    /// Get the index of a column by name
    ///
    /// # Arguments
    ///
    /// * `column_name` - The name of the column
    ///
    /// # Returns
    ///
    /// The index of the column, or `None` if not found. With duplicated names the first
    /// column wins.
    #[must_use]
    pub fn get_column_index(&self, column_name: &str) -> Option<usize> {
        self.column_index.get(column_name).copied()
    }

    /// Get a value by column name
    ///
    /// # Arguments
    ///
    /// * `column_name` - The name of the column
    ///
    /// # Returns
    ///
    /// The value, or `None` if there is no such column
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&RowValues> {
        self.get_column_index(column_name)
            .and_then(|idx| self.values.get(idx))
    }

    /// Get a value by column position; `None` if out of bounds.
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&RowValues> {
        self.values.get(index)
    }

    /// Number of values in the row
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the row has no values
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
