use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDateTime};

/// Values decoded from a result row or bound as statement arguments.
///
/// ```rust
/// use redshift_data_middleware::prelude::*;
///
/// let args = vec![
///     Arg::from(RowValues::Int(1)),
///     Arg::named("name", RowValues::Text("alice".into())),
/// ];
/// # let _ = args;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum RowValues {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// `timestamp` (without time zone)
    Timestamp(NaiveDateTime),
    /// `timestamptz`
    TimestampTz(DateTime<FixedOffset>),
    /// NULL value
    Null,
    /// Binary data
    Blob(Vec<u8>),
}

impl RowValues {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let RowValues::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let RowValues::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<&bool> {
        if let RowValues::Bool(value) = self {
            Some(value)
        } else {
            None
        }
    }

    /// Timestamp view of the value; `timestamptz` values are converted to UTC.
    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            RowValues::Timestamp(value) => Some(*value),
            RowValues::TimestampTz(value) => Some(value.naive_utc()),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_timestamptz(&self) -> Option<DateTime<FixedOffset>> {
        if let RowValues::TimestampTz(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        if let RowValues::Float(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let RowValues::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }
}

/// Textual form sent to the backend, whose parameters are string-typed.
impl fmt::Display for RowValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowValues::Int(i) => write!(f, "{i}"),
            RowValues::Float(v) => write!(f, "{v}"),
            RowValues::Text(s) => f.write_str(s),
            RowValues::Bool(b) => write!(f, "{b}"),
            RowValues::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S%.f")),
            RowValues::TimestampTz(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S%.f%:z")),
            RowValues::Null => f.write_str("NULL"),
            RowValues::Blob(bytes) => {
                f.write_str("\\x")?;
                for b in bytes {
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            }
        }
    }
}

/// A statement argument, optionally carrying an explicit parameter name.
#[derive(Debug, Clone, PartialEq)]
pub struct Arg {
    pub name: Option<String>,
    pub value: RowValues,
}

impl Arg {
    /// Argument bound by its position (`:1`, `:2`, ...).
    #[must_use]
    pub fn positional(value: RowValues) -> Self {
        Self { name: None, value }
    }

    /// Argument bound by name (`:name`).
    pub fn named(name: impl Into<String>, value: RowValues) -> Self {
        Self {
            name: Some(name.into()),
            value,
        }
    }
}

impl From<RowValues> for Arg {
    fn from(value: RowValues) -> Self {
        Arg::positional(value)
    }
}

/// Isolation levels a caller may ask for when beginning a transaction.
///
/// Only [`IsolationLevel::Default`] is accepted; the backend applies its own isolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IsolationLevel {
    #[default]
    Default,
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

/// Options for [`Connection::begin`](crate::connection::Connection::begin).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TxOptions {
    pub isolation: IsolationLevel,
    pub read_only: bool,
}

impl TxOptions {
    #[must_use]
    pub fn with_isolation(mut self, isolation: IsolationLevel) -> Self {
        self.isolation = isolation;
        self
    }

    #[must_use]
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }
}
