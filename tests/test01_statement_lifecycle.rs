use redshift_data_middleware::prelude::*;
use tokio::runtime::Runtime;

mod common;

use common::{MockClient, connect, failed, finished_affecting, finished_with_result_set, page, status, test_config};

#[test]
fn test01_polls_until_finished() -> Result<(), Box<dyn std::error::Error>> {
    let mock = MockClient::with_statuses(vec![
        status(StatementStatus::Submitted),
        status(StatementStatus::Picked),
        status(StatementStatus::Started),
        finished_with_result_set(1),
    ]);
    mock.add_page(
        None,
        page(&[("one", "int4")], vec![vec![Field::LongValue(1)]], None),
    );

    let rt = Runtime::new()?;
    rt.block_on(async {
        let mut conn = connect(&mock, test_config()).await?;
        let mut rows = conn.query("SELECT 1 AS one", &[]).await?;

        assert_eq!(mock.describe_calls(), 4);
        // results are only requested once rows are read
        assert!(mock.page_requests().is_empty());
        assert_eq!(rows.statement_id(), common::STATEMENT_ID);

        let row = rows.next_row().await?.expect("one row");
        assert_eq!(row.get("one").and_then(RowValues::as_int), Some(&1));
        assert!(rows.next_row().await?.is_none());
        assert_eq!(mock.page_requests(), vec![None]);
        assert_eq!(mock.cancel_calls(), 0);
        Ok::<(), Box<dyn std::error::Error>>(())
    })?;
    Ok(())
}

#[tokio::test]
async fn test01_args_become_named_parameters() -> Result<(), Box<dyn std::error::Error>> {
    let mock = MockClient::with_statuses(vec![finished_affecting(0)]);
    let mut conn = connect(&mock, test_config()).await?;

    conn.exec(
        "UPDATE t SET note = '?' WHERE id = ? AND name = ?",
        &[
            Arg::from(RowValues::Int(7)),
            Arg::from(RowValues::Text("bob".into())),
        ],
    )
    .await?;
    conn.exec(
        "DELETE FROM t WHERE id = :id",
        &[Arg::named("id", RowValues::Int(3))],
    )
    .await?;
    conn.exec("DELETE FROM t", &[]).await?;

    let executed = mock.executed();
    assert_eq!(executed.len(), 3);
    assert_eq!(
        executed[0].sql,
        "UPDATE t SET note = '?' WHERE id = :1 AND name = :2"
    );
    assert_eq!(
        executed[0].parameters,
        Some(vec![
            SqlParameter {
                name: "1".into(),
                value: "7".into()
            },
            SqlParameter {
                name: "2".into(),
                value: "bob".into()
            },
        ])
    );
    assert_eq!(executed[1].sql, "DELETE FROM t WHERE id = :id");
    assert_eq!(
        executed[1].parameters.as_deref().map(|p| p[0].name.as_str()),
        Some("id")
    );
    assert_eq!(executed[2].parameters, None);

    let target = &executed[0].target;
    assert_eq!(target.cluster_identifier.as_deref(), Some("default"));
    assert_eq!(target.db_user.as_deref(), Some("admin"));
    assert_eq!(target.database.as_deref(), Some("dev"));
    assert_eq!(target.workgroup_name, None);
    Ok(())
}

#[tokio::test]
async fn test01_exec_reports_rows_affected() -> Result<(), Box<dyn std::error::Error>> {
    let mock = MockClient::with_statuses(vec![status(StatementStatus::Started), finished_affecting(42)]);
    let mut conn = connect(&mock, test_config()).await?;

    let result = conn.exec("DELETE FROM t WHERE expired", &[]).await?;
    assert!(matches!(result, ExecResult::Completed(_)));
    assert_eq!(result.rows_affected()?, 42);
    assert!(matches!(
        result.last_insert_id(),
        Err(RedshiftDataError::NotSupported(msg)) if msg == "LastInsertId"
    ));
    Ok(())
}

#[tokio::test]
async fn test01_failed_statement_surfaces_message() -> Result<(), Box<dyn std::error::Error>> {
    let mock = MockClient::with_statuses(vec![
        status(StatementStatus::Started),
        failed(StatementStatus::Failed, "ERROR: relation \"nope\" does not exist"),
    ]);
    let mut conn = connect(&mock, test_config()).await?;

    let err = conn.query("SELECT * FROM nope", &[]).await.unwrap_err();
    assert!(matches!(&err, RedshiftDataError::QueryFailed(msg) if msg.contains("nope")));
    assert!(err.to_string().starts_with("query failed: "));
    // terminal statuses are never canceled
    assert_eq!(mock.cancel_calls(), 0);
    Ok(())
}

#[tokio::test]
async fn test01_aborted_statement() -> Result<(), Box<dyn std::error::Error>> {
    let mock = MockClient::with_statuses(vec![failed(StatementStatus::Aborted, "canceled by user")]);
    let mut conn = connect(&mock, test_config()).await?;

    let err = conn.exec("VACUUM", &[]).await.unwrap_err();
    assert!(matches!(err, RedshiftDataError::QueryAborted(msg) if msg == "canceled by user"));
    assert_eq!(mock.describe_calls(), 1);
    Ok(())
}

#[tokio::test]
async fn test01_submit_failure_is_not_retried() -> Result<(), Box<dyn std::error::Error>> {
    let mock = MockClient::with_statuses(vec![finished_affecting(0)]);
    mock.state().fail_submit = Some("throttled".into());
    let mut conn = connect(&mock, test_config()).await?;

    let err = conn.exec("SELECT 1", &[]).await.unwrap_err();
    match &err {
        RedshiftDataError::Client { context, source } => {
            assert_eq!(*context, "execute statement");
            assert_eq!(source.to_string(), "throttled");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(mock.executed().len(), 1);
    assert_eq!(mock.describe_calls(), 0);
    assert_eq!(mock.cancel_calls(), 0);
    Ok(())
}

#[tokio::test]
async fn test01_describe_failure_cancels_statement() -> Result<(), Box<dyn std::error::Error>> {
    // an empty script makes every describe call fail
    let mock = MockClient::new();
    let mut conn = connect(&mock, test_config()).await?;

    let err = conn.exec("SELECT 1", &[]).await.unwrap_err();
    assert!(matches!(
        err,
        RedshiftDataError::Client { context: "describe statement", .. }
    ));
    assert_eq!(mock.describe_calls(), 2);
    assert_eq!(mock.cancel_calls(), 1);
    Ok(())
}

#[tokio::test]
async fn test01_marker_after_nested_quote_is_left_alone() -> Result<(), Box<dyn std::error::Error>> {
    let mock = MockClient::with_statuses(vec![finished_affecting(0)]);
    let mut conn = connect(&mock, test_config()).await?;

    let sql = r#"DELETE FROM t WHERE name = 'O"Brien' AND id = ?"#;
    conn.exec(sql, &[Arg::from(RowValues::Int(1))]).await?;

    let executed = mock.executed();
    assert_eq!(executed[0].sql, sql);
    assert_eq!(executed[0].parameters.as_ref().map(Vec::len), Some(1));
    Ok(())
}
