use tokio::time::Instant;
use tracing::debug;

use crate::error::RedshiftDataError;
use crate::model::{DescribeStatementOutput, ExecuteStatementInput, SqlParameter};
use crate::results::Rows;

use super::ExecContext;
use super::poll::{check_finished, wait_with_cancel};

/// A statement that reached `FINISHED`.
pub(crate) struct StatementOutcome {
    pub desc: DescribeStatementOutput,
    /// First-page cursor when the backend declared a result set.
    pub rows: Option<Rows>,
}

/// Submit one statement and wait for it.
///
/// # Errors
/// Returns the submit or poll error, the backend's failure message for `FAILED`/`ABORTED`,
/// or `DeadlineExceeded`/`ConnectionClosed` when the wait was abandoned.
pub(crate) async fn execute_statement(
    ctx: &ExecContext,
    sql: String,
    parameters: Option<Vec<SqlParameter>>,
) -> Result<StatementOutcome, RedshiftDataError> {
    debug!(query = %sql, "execute statement");
    let input = ExecuteStatementInput {
        sql,
        parameters,
        target: ctx.config.identity(),
    };
    let output = ctx
        .client
        .execute_statement(input)
        .await
        .map_err(|e| RedshiftDataError::client("execute statement", e))?;
    let submitted_at = Instant::now();
    debug!(statement_id = %output.id, "success execute statement");

    let desc = wait_with_cancel(ctx, &output.id, submitted_at).await?;
    check_finished(&desc)?;
    debug!(
        statement_id = %output.id,
        elapsed = ?submitted_at.elapsed(),
        "success query"
    );

    if !desc.has_result_set {
        return Ok(StatementOutcome { desc, rows: None });
    }
    debug!(
        statement_id = %output.id,
        result_rows = desc.result_rows,
        "query has result set"
    );
    let rows = Rows::new(output.id, ctx.client.clone(), ctx.dispatch.clone());
    Ok(StatementOutcome {
        desc,
        rows: Some(rows),
    })
}
