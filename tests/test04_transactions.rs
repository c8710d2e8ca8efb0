use redshift_data_middleware::prelude::*;
use tokio::runtime::Runtime;

mod common;

use common::{MockClient, connect, failed, finished_affecting, finished_batch, test_config};

#[test]
fn test04_commit_back_fills_each_statement() -> Result<(), Box<dyn std::error::Error>> {
    let mock = MockClient::with_statuses(vec![finished_batch(&[(1, false), (3, false)])]);
    let rt = Runtime::new()?;
    rt.block_on(async {
        let mut conn = connect(&mock, test_config()).await?;
        conn.begin(TxOptions::default())?;
        assert!(conn.in_transaction());

        let insert = conn.exec("INSERT INTO t VALUES (1)", &[]).await?;
        let update = conn.exec("UPDATE t SET flag = true", &[]).await?;
        assert!(matches!(insert, ExecResult::Deferred(_)));
        assert!(matches!(insert.rows_affected(), Err(RedshiftDataError::BeforeCommit)));
        assert!(matches!(update.last_insert_id(), Err(RedshiftDataError::BeforeCommit)));
        // nothing is sent before commit
        assert!(mock.executed().is_empty());
        assert!(mock.batches().is_empty());

        conn.commit().await?;
        assert!(!conn.in_transaction());
        assert_eq!(insert.rows_affected()?, 1);
        assert_eq!(update.rows_affected()?, 3);
        assert!(matches!(
            update.last_insert_id(),
            Err(RedshiftDataError::NotSupported(_))
        ));

        let batches = mock.batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(
            batches[0].sqls,
            vec!["INSERT INTO t VALUES (1)", "UPDATE t SET flag = true"]
        );
        assert_eq!(batches[0].target.cluster_identifier.as_deref(), Some("default"));
        assert!(mock.executed().is_empty());
        Ok::<(), Box<dyn std::error::Error>>(())
    })?;
    Ok(())
}

#[tokio::test]
async fn test04_single_statement_commit_uses_plain_execute() -> Result<(), Box<dyn std::error::Error>> {
    let mock = MockClient::with_statuses(vec![finished_affecting(5)]);
    let mut conn = connect(&mock, test_config()).await?;

    let mut tx = conn.begin_transaction(TxOptions::default())?;
    let delayed = tx.exec("DELETE FROM t")?;
    assert_eq!(tx.pending(), 1);
    tx.commit().await?;

    assert!(delayed.is_ready());
    assert_eq!(delayed.rows_affected()?, 5);
    let executed = mock.executed();
    assert_eq!(executed.len(), 1);
    assert_eq!(executed[0].sql, "DELETE FROM t");
    assert_eq!(executed[0].parameters, None);
    assert!(mock.batches().is_empty());
    assert!(!conn.in_transaction());
    Ok(())
}

#[tokio::test]
async fn test04_empty_commit_sends_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let mock = MockClient::new();
    let mut conn = connect(&mock, test_config()).await?;

    conn.begin(TxOptions::default())?;
    conn.commit().await?;
    assert!(!conn.in_transaction());
    assert!(mock.executed().is_empty());
    assert!(mock.batches().is_empty());
    assert_eq!(mock.describe_calls(), 0);
    Ok(())
}

#[tokio::test]
async fn test04_rollback_discards_buffer() -> Result<(), Box<dyn std::error::Error>> {
    let mock = MockClient::new();
    let mut conn = connect(&mock, test_config()).await?;

    conn.begin(TxOptions::default())?;
    let pending = conn.exec("INSERT INTO t VALUES (1)", &[]).await?;
    conn.rollback()?;

    assert!(!conn.in_transaction());
    assert!(matches!(pending.rows_affected(), Err(RedshiftDataError::BeforeCommit)));
    assert!(mock.executed().is_empty());
    assert!(mock.batches().is_empty());

    // a fresh transaction starts with an empty buffer
    conn.begin(TxOptions::default())?;
    conn.commit().await?;
    assert!(mock.batches().is_empty());
    Ok(())
}

#[tokio::test]
async fn test04_dropped_guard_rolls_back() -> Result<(), Box<dyn std::error::Error>> {
    let mock = MockClient::new();
    let mut conn = connect(&mock, test_config()).await?;

    {
        let mut tx = conn.begin_transaction(TxOptions::default())?;
        tx.exec("INSERT INTO t VALUES (1)")?;
    }
    assert!(!conn.in_transaction());
    assert!(matches!(conn.commit().await, Err(RedshiftDataError::NotInTransaction)));
    assert!(mock.executed().is_empty());
    Ok(())
}

#[tokio::test]
async fn test04_lifecycle_errors() -> Result<(), Box<dyn std::error::Error>> {
    let mock = MockClient::new();
    let mut conn = connect(&mock, test_config()).await?;

    assert!(matches!(conn.commit().await, Err(RedshiftDataError::NotInTransaction)));
    assert!(matches!(conn.rollback(), Err(RedshiftDataError::NotInTransaction)));

    let err = conn
        .begin(TxOptions::default().with_isolation(IsolationLevel::Serializable))
        .unwrap_err();
    assert_eq!(err.to_string(), "transaction isolation level change: not supported");
    assert!(!conn.in_transaction());

    conn.begin(TxOptions::default())?;
    assert!(matches!(
        conn.begin(TxOptions::default()),
        Err(RedshiftDataError::InTransaction)
    ));
    assert!(matches!(
        conn.query("SELECT 1", &[]).await,
        Err(RedshiftDataError::NotSupported(msg)) if msg == "query in transaction"
    ));
    assert!(matches!(
        conn.exec("INSERT INTO t VALUES (?)", &[Arg::from(RowValues::Int(1))]).await,
        Err(RedshiftDataError::NotSupported(msg)) if msg == "exec with args in transaction"
    ));
    assert!(matches!(
        conn.batch(&["SELECT 1", "SELECT 2"]).await,
        Err(RedshiftDataError::NotSupported(_))
    ));
    conn.rollback()?;

    conn.begin(TxOptions::default().with_read_only(true))?;
    assert!(matches!(
        conn.exec("DELETE FROM t", &[]).await,
        Err(RedshiftDataError::NotSupported(msg)) if msg == "exec in read only transaction"
    ));
    conn.commit().await?;
    assert!(mock.executed().is_empty());
    Ok(())
}

#[tokio::test]
async fn test04_failed_commit_still_closes_transaction() -> Result<(), Box<dyn std::error::Error>> {
    let mock = MockClient::with_statuses(vec![failed(
        StatementStatus::Failed,
        "duplicate key value violates unique constraint",
    )]);
    let mut conn = connect(&mock, test_config()).await?;

    conn.begin(TxOptions::default())?;
    let first = conn.exec("INSERT INTO t VALUES (1)", &[]).await?;
    conn.exec("INSERT INTO t VALUES (1)", &[]).await?;
    let err = conn.commit().await.unwrap_err();

    assert!(matches!(err, RedshiftDataError::QueryFailed(_)));
    assert!(!conn.in_transaction());
    assert!(matches!(first.rows_affected(), Err(RedshiftDataError::BeforeCommit)));
    assert!(matches!(conn.rollback(), Err(RedshiftDataError::NotInTransaction)));
    Ok(())
}

#[tokio::test]
async fn test04_sub_statement_count_mismatch() -> Result<(), Box<dyn std::error::Error>> {
    let mock = MockClient::with_statuses(vec![finished_batch(&[(1, false)])]);
    let mut conn = connect(&mock, test_config()).await?;

    conn.begin(TxOptions::default())?;
    let first = conn.exec("INSERT INTO t VALUES (1)", &[]).await?;
    conn.exec("INSERT INTO t VALUES (2)", &[]).await?;
    let err = conn.commit().await.unwrap_err();

    assert!(matches!(err, RedshiftDataError::Protocol(_)));
    assert!(matches!(first.rows_affected(), Err(RedshiftDataError::BeforeCommit)));
    Ok(())
}
