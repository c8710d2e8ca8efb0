//! Database-driver layer over the Amazon Redshift Data API.
//!
//! The Data API is asynchronous: a statement is submitted, polled until it reaches a
//! terminal status, and its rows are then fetched page by page. This crate turns that into
//! a conventional connection interface:
//!
//! - [`Connector`] validates a [`Config`] (built directly or parsed from a DSN) and opens
//!   [`Connection`]s through a [`ClientFactory`].
//! - [`Connection::query`] and [`Connection::exec`] submit a statement, poll it to
//!   completion and cancel it if the caller gives up (deadline or close).
//! - [`Rows`] pulls result pages lazily and decodes cells into [`RowValues`].
//! - Transactions are emulated client-side: writes are buffered and sent as one batch at
//!   commit, with [`DelayedResult`] placeholders back-filled afterwards.
//!
//! The transport itself is behind the [`DataApiClient`] trait, so any SDK (or a test
//! double) can be plugged in.

pub mod client;
pub mod config;
pub mod connection;
pub mod connector;
pub mod error;
pub mod executor;
pub mod model;
pub mod params;
pub mod prelude;
pub mod results;
pub mod transaction;
pub mod translation;
pub mod types;

pub use client::{ClientFactory, DataApiClient, SharedClient};
pub use config::{Config, parse_dsn};
pub use connection::{BatchStatementResult, CloseHandle, Connection};
pub use connector::Connector;
pub use error::{BoxError, RedshiftDataError};
pub use executor::PollSettings;
pub use results::{DelayedResult, ExecResult, ResultSet, Row, Rows, StatementResult};
pub use transaction::Transaction;
pub use translation::rewrite_placeholders;
pub use types::{Arg, IsolationLevel, RowValues, TxOptions};
