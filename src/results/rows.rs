use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime};
use tracing::{Dispatch, debug, dispatcher, warn};

use crate::client::DataApiClient;
use crate::error::RedshiftDataError;
use crate::model::{Field, GetStatementResultOutput};
use crate::types::RowValues;

use super::result_set::ResultSet;
use super::row::{ColumnIndex, Row, build_column_index};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
const TIMESTAMPTZ_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f%#z";

/// Cursor over a paginated statement result.
///
/// Pages are fetched lazily: nothing is requested until [`Rows::columns`] or
/// [`Rows::next_row`] needs it, and each page replaces the previous one.
pub struct Rows {
    id: String,
    client: Option<Arc<dyn DataApiClient>>,
    dispatch: Dispatch,
    page: Option<GetStatementResultOutput>,
    next_token: Option<String>,
    fetched_first: bool,
    closed: bool,
    cursor: usize,
    column_names: Option<Arc<Vec<String>>>,
    column_index: Option<ColumnIndex>,
    column_types: Vec<String>,
}

impl std::fmt::Debug for Rows {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rows")
            .field("id", &self.id)
            .field("fetched_first", &self.fetched_first)
            .field("next_token", &self.next_token)
            .field("cursor", &self.cursor)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl Rows {
    pub(crate) fn new(id: String, client: Arc<dyn DataApiClient>, dispatch: Dispatch) -> Self {
        dispatcher::with_default(&dispatch, || debug!(statement_id = %id, "create rows"));
        Self {
            id,
            client: Some(client),
            dispatch,
            page: None,
            next_token: None,
            fetched_first: false,
            closed: false,
            cursor: 0,
            column_names: None,
            column_index: None,
            column_types: Vec::new(),
        }
    }

    /// Rows for a statement that finished without a result set.
    pub(crate) fn empty(id: String, dispatch: Dispatch) -> Self {
        Self {
            id,
            client: None,
            dispatch,
            page: None,
            next_token: None,
            fetched_first: true,
            closed: false,
            cursor: 0,
            column_names: Some(Arc::new(Vec::new())),
            column_index: None,
            column_types: Vec::new(),
        }
    }

    /// Statement handle these rows belong to
    ///
    /// # Returns
    ///
    /// The backend id of the statement, or of the sub-statement for batch results
    #[must_use]
    pub fn statement_id(&self) -> &str {
        &self.id
    }

    /// Column names, if the first page has been fetched already
    ///
    /// # Returns
    ///
    /// `None` until [`Rows::columns`] or [`Rows::next_row`] has requested a page; an empty
    /// slice for a statement without a result set
    #[must_use]
    pub fn column_names(&self) -> Option<&[String]> {
        self.column_names.as_deref().map(Vec::as_slice)
    }

    /// Column names, fetching the first page if needed.
    ///
    /// # Errors
    /// Returns `RedshiftDataError::Client` if the page request fails.
    pub async fn columns(&mut self) -> Result<Arc<Vec<String>>, RedshiftDataError> {
        if self.column_names.is_none() && self.has_more_pages() {
            self.fetch_page().await?;
        }
        Ok(self
            .column_names
            .clone()
            .unwrap_or_else(|| Arc::new(Vec::new())))
    }

    /// Next decoded row, or `None` once every page is exhausted.
    ///
    /// # Errors
    /// Returns `RedshiftDataError::Client` if a page request fails.
    pub async fn next_row(&mut self) -> Result<Option<Row>, RedshiftDataError> {
        loop {
            if self.closed {
                return Ok(None);
            }
            if let Some(page) = &self.page
                && self.cursor < page.records.len()
            {
                break;
            }
            if !self.has_more_pages() {
                return Ok(None);
            }
            self.fetch_page().await?;
        }

        let Some(page) = self.page.as_ref() else {
            return Ok(None);
        };
        let record = &page.records[self.cursor];
        let column_names = self
            .column_names
            .clone()
            .unwrap_or_else(|| Arc::new(Vec::new()));
        let column_index = self
            .column_index
            .clone()
            .unwrap_or_else(|| build_column_index(&column_names));
        let width = if column_names.is_empty() {
            record.len()
        } else {
            column_names.len()
        };

        let column_types = &self.column_types;
        let values = dispatcher::with_default(&self.dispatch, || {
            (0..width)
                .map(|i| {
                    let type_name = column_types.get(i).map_or("", String::as_str);
                    record
                        .get(i)
                        .map_or(RowValues::Null, |field| decode_field(field, type_name))
                })
                .collect::<Vec<_>>()
        });
        self.cursor += 1;

        Ok(Some(Row::with_index(column_names, column_index, values)))
    }

    /// Stop iterating; later calls to [`Rows::next_row`] return `None`.
    ///
    /// # Errors
    /// Never fails today; kept fallible to mirror the driver contract.
    pub fn close(&mut self) -> Result<(), RedshiftDataError> {
        dispatcher::with_default(&self.dispatch, || {
            debug!(statement_id = %self.id, "rows close called");
        });
        self.closed = true;
        self.page = None;
        Ok(())
    }

    /// Drain the remaining rows into a [`ResultSet`].
    ///
    /// # Errors
    /// Returns `RedshiftDataError::Client` if a page request fails.
    pub async fn into_result_set(mut self) -> Result<ResultSet, RedshiftDataError> {
        let columns = self.columns().await?;
        let mut result_set = ResultSet::default();
        result_set.set_column_names(columns);
        while let Some(row) = self.next_row().await? {
            result_set.add_row(row);
        }
        Ok(result_set)
    }

    fn has_more_pages(&self) -> bool {
        self.client.is_some() && (!self.fetched_first || self.next_token.is_some())
    }

    async fn fetch_page(&mut self) -> Result<(), RedshiftDataError> {
        let Some(client) = &self.client else {
            return Ok(());
        };
        let page = client
            .get_statement_result(&self.id, self.next_token.as_deref())
            .await
            .map_err(|e| RedshiftDataError::client("get statement result", e))?;

        dispatcher::with_default(&self.dispatch, || {
            debug!(
                statement_id = %self.id,
                records = page.records.len(),
                has_next = page.next_token.is_some(),
                "fetched result page"
            );
        });

        if !page.column_metadata.is_empty() {
            self.column_types = page
                .column_metadata
                .iter()
                .map(|meta| meta.type_name.clone())
                .collect();
            if self.column_names.is_none() {
                let names: Vec<String> = page
                    .column_metadata
                    .iter()
                    .map(|meta| meta.name.clone())
                    .collect();
                self.column_index = Some(build_column_index(&names));
                self.column_names = Some(Arc::new(names));
            }
        }
        self.fetched_first = true;
        self.next_token = page.next_token.clone();
        self.cursor = 0;
        self.page = Some(page);
        Ok(())
    }
}

/// Convert one backend field according to its declared column type.
///
/// Timestamp text that does not parse is logged and decoded as `Null`.
pub(crate) fn decode_field(field: &Field, type_name: &str) -> RowValues {
    match field {
        Field::IsNull(_) => RowValues::Null,
        Field::StringValue(s) if type_name.eq_ignore_ascii_case("timestamp") => {
            match NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT) {
                Ok(ts) => RowValues::Timestamp(ts),
                Err(e) => {
                    warn!(value = %s, error = %e, "failed to parse timestamp");
                    RowValues::Null
                }
            }
        }
        Field::StringValue(s) if type_name.eq_ignore_ascii_case("timestamptz") => {
            match DateTime::parse_from_str(s, TIMESTAMPTZ_FORMAT) {
                Ok(ts) => RowValues::TimestampTz(ts),
                Err(e) => {
                    warn!(value = %s, error = %e, "failed to parse timestamptz");
                    RowValues::Null
                }
            }
        }
        Field::StringValue(s) => RowValues::Text(s.clone()),
        Field::LongValue(v) => RowValues::Int(*v),
        Field::BooleanValue(v) => RowValues::Bool(*v),
        Field::DoubleValue(v) => RowValues::Float(*v),
        Field::BlobValue(v) => RowValues::Blob(v.clone()),
    }
}
