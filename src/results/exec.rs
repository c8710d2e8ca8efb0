use std::sync::{Arc, OnceLock};

use crate::error::RedshiftDataError;
use crate::model::{DescribeStatementOutput, SubStatementData};

/// Row count reported for a finished statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatementResult {
    affected_rows: i64,
}

impl StatementResult {
    /// Create a result from a row count
    ///
    /// # Arguments
    ///
    /// * `affected_rows` - Row count reported by the backend
    #[must_use]
    pub fn new(affected_rows: i64) -> Self {
        Self { affected_rows }
    }

    /// Rows affected by the statement (or returned, for a query)
    #[must_use]
    pub fn rows_affected(&self) -> i64 {
        self.affected_rows
    }
}

impl From<&DescribeStatementOutput> for StatementResult {
    fn from(desc: &DescribeStatementOutput) -> Self {
        Self::new(desc.result_rows)
    }
}

impl From<&SubStatementData> for StatementResult {
    fn from(sub: &SubStatementData) -> Self {
        Self::new(sub.result_rows)
    }
}

/// Placeholder result for a statement buffered inside a transaction.
///
/// Clones share the same slot. The slot is written once, at commit; reading it earlier
/// returns `RedshiftDataError::BeforeCommit` instead of waiting.
#[derive(Debug, Clone, Default)]
pub struct DelayedResult {
    slot: Arc<OnceLock<StatementResult>>,
}

impl DelayedResult {
    /// Create an empty placeholder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Back-fill the slot. Returns false if it was already filled.
    pub(crate) fn fill(&self, result: StatementResult) -> bool {
        self.slot.set(result).is_ok()
    }

    /// Whether the commit has filled this placeholder
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.slot.get().is_some()
    }

    /// # Errors
    /// Returns `RedshiftDataError::BeforeCommit` until the transaction commits.
    pub fn rows_affected(&self) -> Result<i64, RedshiftDataError> {
        self.slot
            .get()
            .map(StatementResult::rows_affected)
            .ok_or(RedshiftDataError::BeforeCommit)
    }

    /// # Errors
    /// Returns `RedshiftDataError::BeforeCommit` until the transaction commits, and
    /// `RedshiftDataError::NotSupported` afterwards.
    pub fn last_insert_id(&self) -> Result<i64, RedshiftDataError> {
        if self.is_ready() {
            Err(RedshiftDataError::NotSupported("LastInsertId".to_string()))
        } else {
            Err(RedshiftDataError::BeforeCommit)
        }
    }
}

/// Outcome of [`Connection::exec`](crate::connection::Connection::exec).
#[derive(Debug, Clone)]
pub enum ExecResult {
    /// The statement ran to completion.
    Completed(StatementResult),
    /// The statement was buffered in an open transaction.
    Deferred(DelayedResult),
}

impl ExecResult {
    /// # Errors
    /// Returns `RedshiftDataError::BeforeCommit` for a deferred result read before commit.
    pub fn rows_affected(&self) -> Result<i64, RedshiftDataError> {
        match self {
            ExecResult::Completed(result) => Ok(result.rows_affected()),
            ExecResult::Deferred(delayed) => delayed.rows_affected(),
        }
    }

    /// The Data API never reports generated keys.
    ///
    /// # Errors
    /// Always fails: `NotSupported`, or `BeforeCommit` for a deferred result.
    pub fn last_insert_id(&self) -> Result<i64, RedshiftDataError> {
        match self {
            ExecResult::Completed(_) => {
                Err(RedshiftDataError::NotSupported("LastInsertId".to_string()))
            }
            ExecResult::Deferred(delayed) => delayed.last_insert_id(),
        }
    }
}
