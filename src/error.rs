use thiserror::Error;

/// Error type returned by a [`DataApiClient`](crate::client::DataApiClient) implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum RedshiftDataError {
    #[error("dsn is empty")]
    EmptyDsn,

    #[error("dsn is invalid: {0}")]
    InvalidDsn(String),

    #[error("{0}: not supported")]
    NotSupported(String),

    #[error("transaction already open")]
    InTransaction,

    #[error("no transaction open")]
    NotInTransaction,

    #[error("result is not available before commit")]
    BeforeCommit,

    #[error("connection closed")]
    ConnectionClosed,

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("{context}: {source}")]
    Client {
        context: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("query aborted: {0}")]
    QueryAborted(String),

    #[error("query failed: {0}")]
    QueryFailed(String),

    #[error("query status is not finished: {0}")]
    UnexpectedStatus(String),

    #[error("protocol error: {0}")]
    Protocol(String),
}

impl RedshiftDataError {
    pub(crate) fn client(context: &'static str, source: BoxError) -> Self {
        RedshiftDataError::Client { context, source }
    }

    /// True for the errors that come from abandoning a statement mid-poll.
    #[must_use]
    pub fn is_abandoned(&self) -> bool {
        matches!(
            self,
            RedshiftDataError::DeadlineExceeded | RedshiftDataError::ConnectionClosed
        )
    }
}
