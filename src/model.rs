//! Request and response shapes of the Data API operations this crate consumes.
//!
//! Field names follow the service's JSON casing so a client implementation can hand them
//! straight to `serde`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Target identity sent with every submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetIdentity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workgroup_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_arn: Option<String>,
}

/// A named statement parameter. The service only accepts string values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlParameter {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteStatementInput {
    pub sql: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<SqlParameter>>,
    #[serde(flatten)]
    pub target: TargetIdentity,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchExecuteStatementInput {
    pub sqls: Vec<String>,
    #[serde(flatten)]
    pub target: TargetIdentity,
}

/// Output of both execute and batch-execute: the statement handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteStatementOutput {
    pub id: String,
}

/// Lifecycle status reported by describe-statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StatementStatus {
    Submitted,
    Picked,
    Started,
    Finished,
    Failed,
    Aborted,
    /// Any other non-terminal status the service may report.
    Other(String),
}

impl StatementStatus {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StatementStatus::Finished | StatementStatus::Failed | StatementStatus::Aborted
        )
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            StatementStatus::Submitted => "SUBMITTED",
            StatementStatus::Picked => "PICKED",
            StatementStatus::Started => "STARTED",
            StatementStatus::Finished => "FINISHED",
            StatementStatus::Failed => "FAILED",
            StatementStatus::Aborted => "ABORTED",
            StatementStatus::Other(s) => s,
        }
    }
}

impl From<&str> for StatementStatus {
    fn from(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "SUBMITTED" => StatementStatus::Submitted,
            "PICKED" => StatementStatus::Picked,
            "STARTED" => StatementStatus::Started,
            "FINISHED" => StatementStatus::Finished,
            "FAILED" => StatementStatus::Failed,
            "ABORTED" => StatementStatus::Aborted,
            _ => StatementStatus::Other(s.to_string()),
        }
    }
}

impl fmt::Display for StatementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for StatementStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for StatementStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(StatementStatus::from(s.as_str()))
    }
}

/// Per-statement block of a batch describe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubStatementData {
    pub id: String,
    pub status: StatementStatus,
    #[serde(default)]
    pub has_result_set: bool,
    #[serde(default)]
    pub result_rows: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeStatementOutput {
    pub id: String,
    pub status: StatementStatus,
    #[serde(default)]
    pub has_result_set: bool,
    #[serde(default)]
    pub result_rows: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub redshift_pid: i64,
    #[serde(default)]
    pub redshift_query_id: i64,
    #[serde(default)]
    pub sub_statements: Vec<SubStatementData>,
}

impl DescribeStatementOutput {
    /// Minimal describe output, used by clients and tests that only track status.
    pub fn new(id: impl Into<String>, status: StatementStatus) -> Self {
        Self {
            id: id.into(),
            status,
            has_result_set: false,
            result_rows: 0,
            error: None,
            redshift_pid: 0,
            redshift_query_id: 0,
            sub_statements: Vec::new(),
        }
    }
}

/// Column metadata of a result page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMetadata {
    pub name: String,
    pub type_name: String,
}

impl ColumnMetadata {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// One field of a result row, as the service encodes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    IsNull(bool),
    StringValue(String),
    LongValue(i64),
    BooleanValue(bool),
    DoubleValue(f64),
    /// Raw bytes; base64 text on the wire.
    BlobValue(#[serde(with = "base64_bytes")] Vec<u8>),
}

mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetStatementResultOutput {
    pub column_metadata: Vec<ColumnMetadata>,
    pub records: Vec<Vec<Field>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
    #[serde(default)]
    pub total_num_rows: i64,
}
