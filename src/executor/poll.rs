use std::time::Duration;

use tokio::time::{Instant, sleep, sleep_until, timeout_at};
use tracing::{debug, error, warn};

use crate::error::RedshiftDataError;
use crate::model::{DescribeStatementOutput, StatementStatus};

use super::ExecContext;

/// Budget for the status check and cancel request issued after abandoning a statement.
/// Independent of the statement deadline, which has usually expired by then.
pub(crate) const CANCEL_TIMEOUT: Duration = Duration::from_secs(10);

/// Poll `id` until it reaches a terminal status, canceling it if the wait is abandoned.
///
/// The deadline is `submitted_at + timeout`. On timeout, connection close, or a failed
/// status request, the statement is checked once more and canceled unless it already
/// finished; the original error is returned either way.
pub(crate) async fn wait_with_cancel(
    ctx: &ExecContext,
    id: &str,
    submitted_at: Instant,
) -> Result<DescribeStatementOutput, RedshiftDataError> {
    let deadline = submitted_at + ctx.settings.timeout;
    let err = match wait(ctx, id, deadline, submitted_at).await {
        Ok(desc) => return Ok(desc),
        Err(err) => err,
    };

    let cancel_deadline = Instant::now() + CANCEL_TIMEOUT;
    match timeout_at(cancel_deadline, ctx.client.describe_statement(id)).await {
        Ok(Ok(desc)) if desc.status.is_terminal() => {
            debug!(statement_id = id, status = %desc.status, "statement already terminal, skip cancel");
            return Err(err);
        }
        Ok(Ok(_)) => {}
        Ok(Err(e)) => {
            warn!(statement_id = id, error = %e, "describe before cancel failed");
        }
        Err(_) => {
            warn!(statement_id = id, "describe before cancel timed out");
        }
    }

    debug!(statement_id = id, "try cancel statement");
    match timeout_at(cancel_deadline, ctx.client.cancel_statement(id)).await {
        Ok(Ok(true)) => debug!(statement_id = id, "statement canceled"),
        Ok(Ok(false)) => debug!(statement_id = id, "cancel statement status is false"),
        Ok(Err(e)) => error!(statement_id = id, error = %e, "failed cancel statement"),
        Err(_) => error!(statement_id = id, "cancel statement timed out"),
    }
    Err(err)
}

async fn wait(
    ctx: &ExecContext,
    id: &str,
    deadline: Instant,
    submitted_at: Instant,
) -> Result<DescribeStatementOutput, RedshiftDataError> {
    let mut desc = describe(ctx, id, submitted_at).await?;
    while !desc.status.is_terminal() {
        tokio::select! {
            biased;
            () = ctx.liveness.cancelled() => return Err(RedshiftDataError::ConnectionClosed),
            () = sleep_until(deadline) => return Err(RedshiftDataError::DeadlineExceeded),
            () = sleep(ctx.settings.polling) => {}
        }
        desc = describe(ctx, id, submitted_at).await?;
    }
    Ok(desc)
}

async fn describe(
    ctx: &ExecContext,
    id: &str,
    submitted_at: Instant,
) -> Result<DescribeStatementOutput, RedshiftDataError> {
    let desc = ctx
        .client
        .describe_statement(id)
        .await
        .map_err(|e| RedshiftDataError::client("describe statement", e))?;
    debug!(
        statement_id = id,
        status = %desc.status,
        pid = desc.redshift_pid,
        query_id = desc.redshift_query_id,
        elapsed = ?submitted_at.elapsed(),
        "describe statement"
    );
    Ok(desc)
}

/// Map a terminal status to the caller-facing outcome.
pub(crate) fn check_finished(desc: &DescribeStatementOutput) -> Result<(), RedshiftDataError> {
    let message = || desc.error.clone().unwrap_or_default();
    match &desc.status {
        StatementStatus::Finished => Ok(()),
        StatementStatus::Aborted => Err(RedshiftDataError::QueryAborted(message())),
        StatementStatus::Failed => Err(RedshiftDataError::QueryFailed(message())),
        other => Err(RedshiftDataError::UnexpectedStatus(other.to_string())),
    }
}
