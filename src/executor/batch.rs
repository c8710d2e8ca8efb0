use tokio::time::Instant;
use tracing::debug;

use crate::error::RedshiftDataError;
use crate::model::{BatchExecuteStatementInput, DescribeStatementOutput};
use crate::results::Rows;

use super::ExecContext;
use super::poll::{check_finished, wait_with_cancel};

/// A batch that reached `FINISHED`.
pub(crate) struct BatchOutcome {
    pub desc: DescribeStatementOutput,
    /// One entry per submitted statement, in input order; `None` where the
    /// sub-statement produced no result set.
    pub rows: Vec<Option<Rows>>,
}

/// Submit several statements in one request and wait for the whole batch.
///
/// # Errors
/// Same as [`execute_statement`](super::execute_statement), plus
/// `RedshiftDataError::Protocol` when the backend reports a different number of
/// sub-statements than were submitted.
pub(crate) async fn batch_execute_statement(
    ctx: &ExecContext,
    sqls: Vec<String>,
) -> Result<BatchOutcome, RedshiftDataError> {
    let submitted = sqls.len();
    let input = BatchExecuteStatementInput {
        sqls,
        target: ctx.config.identity(),
    };
    let output = ctx
        .client
        .batch_execute_statement(input)
        .await
        .map_err(|e| RedshiftDataError::client("batch execute statement", e))?;
    let submitted_at = Instant::now();
    debug!(statement_id = %output.id, sqls = submitted, "success batch execute statement");

    let desc = wait_with_cancel(ctx, &output.id, submitted_at).await?;
    check_finished(&desc)?;
    debug!(
        statement_id = %output.id,
        elapsed = ?submitted_at.elapsed(),
        "success batch"
    );

    if desc.sub_statements.len() != submitted {
        return Err(RedshiftDataError::Protocol(format!(
            "batch {} submitted {submitted} statements but reported {} sub statements",
            output.id,
            desc.sub_statements.len()
        )));
    }

    let rows = desc
        .sub_statements
        .iter()
        .map(|sub| {
            sub.has_result_set
                .then(|| Rows::new(sub.id.clone(), ctx.client.clone(), ctx.dispatch.clone()))
        })
        .collect();
    Ok(BatchOutcome { desc, rows })
}
