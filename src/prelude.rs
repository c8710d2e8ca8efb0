//! Convenient imports for common functionality.
//!
//! ```rust
//! use redshift_data_middleware::prelude::*;
//! ```

pub use crate::client::{ClientFactory, DataApiClient, SharedClient};
pub use crate::config::{Config, parse_dsn};
pub use crate::connection::{BatchStatementResult, CloseHandle, Connection};
pub use crate::connector::Connector;
pub use crate::error::{BoxError, RedshiftDataError};
pub use crate::executor::PollSettings;
pub use crate::model::{
    BatchExecuteStatementInput, ColumnMetadata, DescribeStatementOutput, ExecuteStatementInput,
    ExecuteStatementOutput, Field, GetStatementResultOutput, SqlParameter, StatementStatus,
    SubStatementData, TargetIdentity,
};
pub use crate::results::{DelayedResult, ExecResult, ResultSet, Row, Rows, StatementResult};
pub use crate::transaction::Transaction;
pub use crate::translation::rewrite_placeholders;
pub use crate::types::{Arg, IsolationLevel, RowValues, TxOptions};
