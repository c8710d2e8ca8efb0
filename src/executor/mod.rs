//! Statement lifecycle: submit, poll to a terminal status, finalize.
//!
//! - poll: the shared wait loop and cancel-on-abandonment
//! - statement: one SQL text per request
//! - batch: several SQL texts submitted together

mod batch;
mod poll;
mod statement;

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::Dispatch;

use crate::client::DataApiClient;
use crate::config::Config;

pub(crate) use batch::{BatchOutcome, batch_execute_statement};
pub(crate) use statement::{StatementOutcome, execute_statement};

/// Effective wait parameters, resolved once from the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub timeout: Duration,
    pub polling: Duration,
}

impl PollSettings {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            timeout: config.effective_timeout(),
            polling: config.effective_polling(),
        }
    }
}

/// Everything a statement run needs from its connection.
#[derive(Clone)]
pub(crate) struct ExecContext {
    pub client: Arc<dyn DataApiClient>,
    pub config: Arc<Config>,
    pub settings: PollSettings,
    pub liveness: CancellationToken,
    pub dispatch: Dispatch,
}
