//! The backend capability: five remote operations of the Data API.
//!
//! Building and authenticating a real client is left to the caller; the connector only
//! asks a [`ClientFactory`] for one.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::Config;
use crate::error::BoxError;
use crate::model::{
    BatchExecuteStatementInput, DescribeStatementOutput, ExecuteStatementInput,
    ExecuteStatementOutput, GetStatementResultOutput,
};

#[async_trait]
pub trait DataApiClient: Send + Sync {
    async fn execute_statement(
        &self,
        input: ExecuteStatementInput,
    ) -> Result<ExecuteStatementOutput, BoxError>;

    async fn batch_execute_statement(
        &self,
        input: BatchExecuteStatementInput,
    ) -> Result<ExecuteStatementOutput, BoxError>;

    async fn describe_statement(&self, id: &str) -> Result<DescribeStatementOutput, BoxError>;

    /// Returns the service's cancel status flag.
    async fn cancel_statement(&self, id: &str) -> Result<bool, BoxError>;

    /// Fetch one result page; `next_token` is `None` for the first page.
    async fn get_statement_result(
        &self,
        id: &str,
        next_token: Option<&str>,
    ) -> Result<GetStatementResultOutput, BoxError>;
}

/// Produces a client for a configuration (credentials, region, endpoint...).
#[async_trait]
pub trait ClientFactory: Send + Sync {
    async fn create_client(&self, config: &Config) -> Result<Arc<dyn DataApiClient>, BoxError>;
}

/// Factory handing out one shared client, whatever the configuration.
#[derive(Clone)]
pub struct SharedClient(pub Arc<dyn DataApiClient>);

#[async_trait]
impl ClientFactory for SharedClient {
    async fn create_client(&self, _config: &Config) -> Result<Arc<dyn DataApiClient>, BoxError> {
        Ok(Arc::clone(&self.0))
    }
}
