#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use redshift_data_middleware::prelude::*;
use tracing_subscriber::fmt::MakeWriter;

pub const STATEMENT_ID: &str = "stmt-1";

/// Scripted stand-in for the Data API.
///
/// Describe answers are popped from a script; the last entry repeats forever. Result
/// pages are keyed by the `next_token` that requests them (`None` for the first page).
#[derive(Default)]
pub struct MockClient {
    state: Mutex<MockState>,
}

#[derive(Default)]
pub struct MockState {
    pub statuses: VecDeque<DescribeStatementOutput>,
    pub pages: HashMap<Option<String>, GetStatementResultOutput>,
    pub executed: Vec<ExecuteStatementInput>,
    pub batches: Vec<BatchExecuteStatementInput>,
    pub describe_calls: usize,
    pub cancel_calls: usize,
    pub page_requests: Vec<Option<String>>,
    pub fail_submit: Option<String>,
    pub fail_cancel: bool,
}

#[derive(Debug)]
struct MockError(String);

impl std::fmt::Display for MockError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for MockError {}

impl MockClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_statuses(statuses: Vec<DescribeStatementOutput>) -> Arc<Self> {
        let mock = Self::default();
        mock.state().statuses = statuses.into();
        Arc::new(mock)
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn add_page(&self, token: Option<&str>, page: GetStatementResultOutput) {
        self.state().pages.insert(token.map(str::to_string), page);
    }

    pub fn describe_calls(&self) -> usize {
        self.state().describe_calls
    }

    pub fn cancel_calls(&self) -> usize {
        self.state().cancel_calls
    }

    pub fn executed(&self) -> Vec<ExecuteStatementInput> {
        self.state().executed.clone()
    }

    pub fn batches(&self) -> Vec<BatchExecuteStatementInput> {
        self.state().batches.clone()
    }

    pub fn page_requests(&self) -> Vec<Option<String>> {
        self.state().page_requests.clone()
    }

    fn submit(&self) -> Result<ExecuteStatementOutput, BoxError> {
        if let Some(msg) = &self.state().fail_submit {
            return Err(Box::new(MockError(msg.clone())));
        }
        Ok(ExecuteStatementOutput {
            id: STATEMENT_ID.to_string(),
        })
    }
}

#[async_trait]
impl DataApiClient for MockClient {
    async fn execute_statement(
        &self,
        input: ExecuteStatementInput,
    ) -> Result<ExecuteStatementOutput, BoxError> {
        self.state().executed.push(input);
        self.submit()
    }

    async fn batch_execute_statement(
        &self,
        input: BatchExecuteStatementInput,
    ) -> Result<ExecuteStatementOutput, BoxError> {
        self.state().batches.push(input);
        self.submit()
    }

    async fn describe_statement(&self, id: &str) -> Result<DescribeStatementOutput, BoxError> {
        let mut state = self.state();
        state.describe_calls += 1;
        let next = if state.statuses.len() > 1 {
            state.statuses.pop_front()
        } else {
            state.statuses.front().cloned()
        };
        next.ok_or_else(|| Box::new(MockError(format!("no status scripted for {id}"))) as BoxError)
    }

    async fn cancel_statement(&self, _id: &str) -> Result<bool, BoxError> {
        let mut state = self.state();
        state.cancel_calls += 1;
        if state.fail_cancel {
            return Err(Box::new(MockError("cancel refused".into())));
        }
        Ok(true)
    }

    async fn get_statement_result(
        &self,
        id: &str,
        next_token: Option<&str>,
    ) -> Result<GetStatementResultOutput, BoxError> {
        let mut state = self.state();
        let key = next_token.map(str::to_string);
        state.page_requests.push(key.clone());
        state
            .pages
            .get(&key)
            .cloned()
            .ok_or_else(|| Box::new(MockError(format!("no page {key:?} for {id}"))) as BoxError)
    }
}

pub fn status(status: StatementStatus) -> DescribeStatementOutput {
    DescribeStatementOutput::new(STATEMENT_ID, status)
}

pub fn finished_with_result_set(rows: i64) -> DescribeStatementOutput {
    let mut desc = status(StatementStatus::Finished);
    desc.has_result_set = true;
    desc.result_rows = rows;
    desc
}

pub fn finished_affecting(rows: i64) -> DescribeStatementOutput {
    let mut desc = status(StatementStatus::Finished);
    desc.result_rows = rows;
    desc
}

pub fn failed(status_kind: StatementStatus, message: &str) -> DescribeStatementOutput {
    let mut desc = status(status_kind);
    desc.error = Some(message.to_string());
    desc
}

pub fn finished_batch(subs: &[(i64, bool)]) -> DescribeStatementOutput {
    let mut desc = status(StatementStatus::Finished);
    desc.sub_statements = subs
        .iter()
        .enumerate()
        .map(|(i, (rows, has_result_set))| SubStatementData {
            id: format!("{STATEMENT_ID}:{}", i + 1),
            status: StatementStatus::Finished,
            has_result_set: *has_result_set,
            result_rows: *rows,
            error: None,
        })
        .collect();
    desc
}

pub fn page(
    columns: &[(&str, &str)],
    records: Vec<Vec<Field>>,
    next_token: Option<&str>,
) -> GetStatementResultOutput {
    GetStatementResultOutput {
        column_metadata: columns
            .iter()
            .map(|(name, type_name)| ColumnMetadata::new(*name, *type_name))
            .collect(),
        total_num_rows: i64::try_from(records.len()).unwrap(),
        records,
        next_token: next_token.map(str::to_string),
    }
}

/// Cluster target with a fast poll interval.
pub fn test_config() -> Config {
    Config::cluster("default", "admin", "dev")
        .with_timeout(Duration::from_secs(5))
        .with_polling(Duration::from_millis(1))
}

pub async fn connect(
    mock: &Arc<MockClient>,
    config: Config,
) -> Result<Connection, RedshiftDataError> {
    let client: Arc<dyn DataApiClient> = mock.clone();
    Connector::new(config, SharedClient(client))?.connect().await
}

/// In-memory sink for formatted log output.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
