use std::convert::Infallible;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::instrument::WithSubscriber;
use tracing::{Dispatch, debug};

use crate::client::DataApiClient;
use crate::config::Config;
use crate::error::RedshiftDataError;
use crate::executor::{
    BatchOutcome, ExecContext, PollSettings, StatementOutcome, batch_execute_statement,
    execute_statement,
};
use crate::params::convert_args;
use crate::results::{DelayedResult, ExecResult, Rows, StatementResult};
use crate::transaction::{Transaction, TxState, flush};
use crate::translation::rewrite_placeholders;
use crate::types::{Arg, TxOptions};

/// A logical session against one Data API target.
///
/// The connection holds no server-side state: every query or exec is an independent
/// statement submission. Transactions are emulated by buffering writes until commit.
pub struct Connection {
    ctx: ExecContext,
    tx: TxState,
}

/// Closes a [`Connection`] from outside the task that is driving it.
///
/// Any wait in progress on that connection stops with `ConnectionClosed` and the
/// in-flight statement is canceled.
#[derive(Debug, Clone)]
pub struct CloseHandle {
    liveness: CancellationToken,
}

impl CloseHandle {
    /// Close the connection this handle was taken from. Idempotent.
    pub fn close(&self) {
        self.liveness.cancel();
    }

    /// Whether the connection has been closed, by this handle or otherwise
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.liveness.is_cancelled()
    }
}

/// One statement of a batch, in submission order.
#[derive(Debug)]
pub struct BatchStatementResult {
    pub result: StatementResult,
    /// Result rows, when the statement declared a result set.
    pub rows: Option<Rows>,
}

impl Connection {
    pub(crate) fn new(client: Arc<dyn DataApiClient>, config: Arc<Config>, dispatch: Dispatch) -> Self {
        let settings = PollSettings::from_config(&config);
        Self {
            ctx: ExecContext {
                client,
                config,
                settings,
                liveness: CancellationToken::new(),
                dispatch,
            },
            tx: TxState::default(),
        }
    }

    /// The configuration this connection was opened with
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.ctx.config
    }

    /// Timeout and poll interval applied to every statement
    ///
    /// # Returns
    ///
    /// The settings resolved from the configuration when the connection was opened;
    /// zero durations are replaced by the defaults.
    #[must_use]
    pub fn poll_settings(&self) -> PollSettings {
        self.ctx.settings
    }

    /// Whether a transaction is open
    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.tx.is_open()
    }

    /// Whether the connection has been closed
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.ctx.liveness.is_cancelled()
    }

    /// Get a handle that can close this connection from another task
    ///
    /// # Returns
    ///
    /// A cloneable `CloseHandle` sharing this connection's liveness signal
    #[must_use]
    pub fn close_handle(&self) -> CloseHandle {
        CloseHandle {
            liveness: self.ctx.liveness.clone(),
        }
    }

    /// Mark the connection closed. Idempotent.
    ///
    /// # Errors
    /// Never fails; the `Result` mirrors the other lifecycle calls.
    pub fn close(&mut self) -> Result<(), RedshiftDataError> {
        if !self.ctx.liveness.is_cancelled() {
            tracing::dispatcher::with_default(&self.ctx.dispatch, || debug!("close connection"));
            self.ctx.liveness.cancel();
        }
        Ok(())
    }

    /// Prepared statements are not available over the Data API.
    ///
    /// # Errors
    /// Always returns `NotSupported`.
    pub fn prepare(&mut self, _sql: &str) -> Result<Infallible, RedshiftDataError> {
        Err(RedshiftDataError::NotSupported("prepared statement".to_string()))
    }

    /// Run a statement and return its rows.
    ///
    /// `?` placeholders are numbered to `:1..:n` when `args` is non-empty. A statement
    /// without a result set yields an empty cursor.
    ///
    /// # Arguments
    ///
    /// * `sql` - The statement text, with `?`, `$N` or `:name` markers
    /// * `args` - Values for the markers; positional ones bind as `:1..:n`
    ///
    /// # Errors
    /// `NotSupported` inside a transaction, `ConnectionClosed` after close, otherwise the
    /// executor's error.
    pub async fn query(&mut self, sql: &str, args: &[Arg]) -> Result<Rows, RedshiftDataError> {
        let dispatch = self.ctx.dispatch.clone();
        self.query_inner(sql, args).with_subscriber(dispatch).await
    }

    async fn query_inner(&mut self, sql: &str, args: &[Arg]) -> Result<Rows, RedshiftDataError> {
        if self.tx.is_open() {
            return Err(RedshiftDataError::NotSupported(
                "query in transaction".to_string(),
            ));
        }
        self.ensure_open()?;
        let sql = rewrite_placeholders(sql, args.len()).into_owned();
        let StatementOutcome { desc, rows } =
            execute_statement(&self.ctx, sql, convert_args(args)).await?;
        Ok(rows.unwrap_or_else(|| Rows::empty(desc.id, self.ctx.dispatch.clone())))
    }

    /// Run a statement for its side effects.
    ///
    /// Inside a transaction the statement is buffered and a [`ExecResult::Deferred`]
    /// placeholder is returned; it resolves once the transaction commits.
    ///
    /// # Arguments
    ///
    /// * `sql` - The statement text
    /// * `args` - Values for the markers; must be empty inside a transaction
    ///
    /// # Errors
    /// `ConnectionClosed` after close; inside a transaction, `NotSupported` for args or a
    /// read-only transaction; otherwise the executor's error.
    pub async fn exec(&mut self, sql: &str, args: &[Arg]) -> Result<ExecResult, RedshiftDataError> {
        let dispatch = self.ctx.dispatch.clone();
        self.exec_inner(sql, args).with_subscriber(dispatch).await
    }

    async fn exec_inner(&mut self, sql: &str, args: &[Arg]) -> Result<ExecResult, RedshiftDataError> {
        self.ensure_open()?;
        if self.tx.is_open() {
            return self.tx.buffer(sql, args).map(ExecResult::Deferred);
        }
        let sql = rewrite_placeholders(sql, args.len()).into_owned();
        let outcome = execute_statement(&self.ctx, sql, convert_args(args)).await?;
        debug!(statement_id = %outcome.desc.id, "create result");
        Ok(ExecResult::Completed(StatementResult::from(&outcome.desc)))
    }

    /// Submit several statements as one request. The backend runs them atomically.
    ///
    /// # Arguments
    ///
    /// * `sqls` - Statement texts, run in order; no argument binding
    ///
    /// # Returns
    ///
    /// One entry per statement, in submission order. An empty input returns an empty
    /// list without contacting the backend.
    ///
    /// # Errors
    /// `NotSupported` inside a transaction, `ConnectionClosed` after close, `Protocol` when
    /// the backend reports a different number of sub-statements, otherwise the executor's
    /// error.
    pub async fn batch(
        &mut self,
        sqls: &[&str],
    ) -> Result<Vec<BatchStatementResult>, RedshiftDataError> {
        let dispatch = self.ctx.dispatch.clone();
        self.batch_inner(sqls).with_subscriber(dispatch).await
    }

    async fn batch_inner(
        &mut self,
        sqls: &[&str],
    ) -> Result<Vec<BatchStatementResult>, RedshiftDataError> {
        if self.tx.is_open() {
            return Err(RedshiftDataError::NotSupported(
                "batch in transaction".to_string(),
            ));
        }
        self.ensure_open()?;
        if sqls.is_empty() {
            return Ok(Vec::new());
        }
        let sqls = sqls.iter().map(|s| (*s).to_string()).collect();
        let BatchOutcome { desc, rows } = batch_execute_statement(&self.ctx, sqls).await?;
        Ok(desc
            .sub_statements
            .iter()
            .zip(rows)
            .map(|(sub, rows)| BatchStatementResult {
                result: StatementResult::from(sub),
                rows,
            })
            .collect())
    }

    /// Open a client-side transaction.
    ///
    /// # Errors
    /// `InTransaction` when one is already open, `NotSupported` for a non-default
    /// isolation level, `ConnectionClosed` after close.
    pub fn begin(&mut self, options: TxOptions) -> Result<(), RedshiftDataError> {
        self.ensure_open()?;
        tracing::dispatcher::with_default(&self.ctx.dispatch, || self.tx.begin(options))
    }

    /// [`begin`](Self::begin), returning a guard that rolls back on drop.
    ///
    /// # Errors
    /// Same as [`begin`](Self::begin).
    pub fn begin_transaction(
        &mut self,
        options: TxOptions,
    ) -> Result<Transaction<'_>, RedshiftDataError> {
        self.begin(options)?;
        Ok(Transaction::new(self))
    }

    /// Send everything buffered since `begin` and back-fill the placeholders.
    ///
    /// The transaction is closed and its buffer cleared whether or not the submission
    /// succeeds.
    ///
    /// # Errors
    /// `NotInTransaction` without an open transaction, `ConnectionClosed` after close,
    /// otherwise the executor's error.
    pub async fn commit(&mut self) -> Result<(), RedshiftDataError> {
        let dispatch = self.ctx.dispatch.clone();
        async {
            let pending = self.tx.finish()?;
            self.ensure_open()?;
            flush(&self.ctx, pending).await
        }
        .with_subscriber(dispatch)
        .await
    }

    /// Discard the buffered statements. Nothing is sent to the backend.
    ///
    /// # Errors
    /// `NotInTransaction` without an open transaction.
    pub fn rollback(&mut self) -> Result<(), RedshiftDataError> {
        let pending = self.tx.finish()?;
        tracing::dispatcher::with_default(&self.ctx.dispatch, || {
            debug!(discarded = pending.len(), "transaction rollback");
        });
        Ok(())
    }

    pub(crate) fn buffer_exec(&mut self, sql: &str) -> Result<DelayedResult, RedshiftDataError> {
        self.ensure_open()?;
        tracing::dispatcher::with_default(&self.ctx.dispatch, || self.tx.buffer(sql, &[]))
    }

    pub(crate) fn pending_statements(&self) -> usize {
        self.tx.pending_len()
    }

    fn ensure_open(&self) -> Result<(), RedshiftDataError> {
        if self.is_closed() {
            return Err(RedshiftDataError::ConnectionClosed);
        }
        Ok(())
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("config", &self.ctx.config)
            .field("settings", &self.ctx.settings)
            .field("in_transaction", &self.tx.is_open())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}
