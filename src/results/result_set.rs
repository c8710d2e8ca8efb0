use std::sync::Arc;

use super::row::Row;

/// A fully materialized query result.
///
/// Built by [`Rows::into_result_set`](super::Rows::into_result_set) when the caller would
/// rather hold every row than iterate page by page.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    /// The rows returned by the query
    pub results: Vec<Row>,
    /// Column names shared by all rows
    column_names: Option<Arc<Vec<String>>>,
}

impl ResultSet {
    /// Create an empty result set with a known capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - The initial capacity for the result rows
    ///
    /// # Returns
    ///
    /// A new `ResultSet` with preallocated row storage
    #[must_use]
    pub fn with_capacity(capacity: usize) -> ResultSet {
        ResultSet {
            results: Vec::with_capacity(capacity),
            column_names: None,
        }
    }

    /// Set the column names for this result set (to be shared by all rows)
    pub fn set_column_names(&mut self, column_names: Arc<Vec<String>>) {
        self.column_names = Some(column_names);
    }

    /// Get the column names for this result set
    #[must_use]
    pub fn get_column_names(&self) -> Option<&Arc<Vec<String>>> {
        self.column_names.as_ref()
    }

    /// Add a row to the result set
    ///
    /// The first row added also provides the column names if none were set.
    ///
    /// # Arguments
    ///
    /// * `row` - The decoded row
    pub fn add_row(&mut self, row: Row) {
        if self.column_names.is_none() {
            self.column_names = Some(Arc::clone(&row.column_names));
        }
        self.results.push(row);
    }

    /// Number of rows held
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether the result set holds no rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
