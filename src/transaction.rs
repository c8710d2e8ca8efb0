//! Client-side transactions.
//!
//! The Data API has no interactive transactions, so writes issued while a transaction is
//! open are buffered and sent at commit: one statement through the regular executor,
//! several through a single batch request, which the backend runs atomically. Rollback
//! drops the buffer without contacting the backend.

use tracing::debug;

use crate::connection::Connection;
use crate::error::RedshiftDataError;
use crate::executor::{ExecContext, batch_execute_statement, execute_statement};
use crate::results::{DelayedResult, StatementResult};
use crate::types::{Arg, IsolationLevel, TxOptions};

/// Open-transaction flag plus the statements buffered so far.
#[derive(Debug, Default)]
pub(crate) struct TxState {
    open: Option<TxOptions>,
    pending: Vec<(String, DelayedResult)>,
}

impl TxState {
    pub(crate) fn is_open(&self) -> bool {
        self.open.is_some()
    }

    pub(crate) fn begin(&mut self, options: TxOptions) -> Result<(), RedshiftDataError> {
        if self.is_open() {
            return Err(RedshiftDataError::InTransaction);
        }
        if options.isolation != IsolationLevel::Default {
            return Err(RedshiftDataError::NotSupported(
                "transaction isolation level change".to_string(),
            ));
        }
        self.open = Some(options);
        debug!(read_only = options.read_only, "transaction begin");
        Ok(())
    }

    /// Buffer a write; the returned placeholder is filled at commit.
    pub(crate) fn buffer(
        &mut self,
        sql: &str,
        args: &[Arg],
    ) -> Result<DelayedResult, RedshiftDataError> {
        let Some(options) = self.open else {
            return Err(RedshiftDataError::NotInTransaction);
        };
        if !args.is_empty() {
            return Err(RedshiftDataError::NotSupported(
                "exec with args in transaction".to_string(),
            ));
        }
        if options.read_only {
            return Err(RedshiftDataError::NotSupported(
                "exec in read only transaction".to_string(),
            ));
        }
        let delayed = DelayedResult::new();
        self.pending.push((sql.to_string(), delayed.clone()));
        debug!(index = self.pending.len() - 1, query = sql, "delayed result created");
        Ok(delayed)
    }

    /// Close the transaction and hand back whatever was buffered.
    pub(crate) fn finish(&mut self) -> Result<Vec<(String, DelayedResult)>, RedshiftDataError> {
        if self.open.take().is_none() {
            return Err(RedshiftDataError::NotInTransaction);
        }
        Ok(std::mem::take(&mut self.pending))
    }

    pub(crate) fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

/// Send the buffered statements and back-fill their placeholders, in order.
pub(crate) async fn flush(
    ctx: &ExecContext,
    pending: Vec<(String, DelayedResult)>,
) -> Result<(), RedshiftDataError> {
    debug!(statements = pending.len(), "transaction commit");
    match pending.len() {
        0 => Ok(()),
        1 => {
            let Some((sql, delayed)) = pending.into_iter().next() else {
                return Ok(());
            };
            let outcome = execute_statement(ctx, sql, None).await?;
            delayed.fill(StatementResult::from(&outcome.desc));
            debug!(statement_id = %outcome.desc.id, "create result");
            Ok(())
        }
        _ => {
            let (sqls, placeholders): (Vec<String>, Vec<DelayedResult>) =
                pending.into_iter().unzip();
            // sub-statement count is checked against the submission by the batch executor
            let outcome = batch_execute_statement(ctx, sqls).await?;
            for (delayed, sub) in placeholders.iter().zip(&outcome.desc.sub_statements) {
                delayed.fill(StatementResult::from(sub));
                debug!(statement_id = %sub.id, "create result");
            }
            Ok(())
        }
    }
}

/// Borrowing guard over a connection with an open transaction.
///
/// Dropping the guard without committing rolls back, which never contacts the backend.
///
/// ```rust,no_run
/// use redshift_data_middleware::prelude::*;
///
/// # async fn demo(conn: &mut Connection) -> Result<(), RedshiftDataError> {
/// let mut tx = conn.begin_transaction(TxOptions::default())?;
/// let inserted = tx.exec("INSERT INTO t VALUES (1)")?;
/// tx.exec("DELETE FROM t WHERE id = 0")?;
/// tx.commit().await?;
/// println!("{} rows inserted", inserted.rows_affected()?);
/// # Ok(()) }
/// ```
pub struct Transaction<'c> {
    conn: &'c mut Connection,
    done: bool,
}

impl<'c> Transaction<'c> {
    pub(crate) fn new(conn: &'c mut Connection) -> Self {
        Self { conn, done: false }
    }

    /// Buffer a statement until commit.
    ///
    /// # Errors
    /// Returns `NotSupported` for read-only transactions and `ConnectionClosed` once the
    /// connection is closed.
    pub fn exec(&mut self, sql: &str) -> Result<DelayedResult, RedshiftDataError> {
        self.conn.buffer_exec(sql)
    }

    /// Number of statements waiting for commit.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.conn.pending_statements()
    }

    /// # Errors
    /// Propagates the executor error; the buffer is cleared regardless.
    pub async fn commit(mut self) -> Result<(), RedshiftDataError> {
        self.done = true;
        self.conn.commit().await
    }

    /// # Errors
    /// Only fails if the transaction was already closed on the connection.
    pub fn rollback(mut self) -> Result<(), RedshiftDataError> {
        self.done = true;
        self.conn.rollback()
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if !self.done && self.conn.in_transaction() {
            let _ = self.conn.rollback();
        }
    }
}
