use std::sync::Arc;

use tracing::instrument::WithSubscriber;
use tracing::{Dispatch, debug};

use crate::client::ClientFactory;
use crate::config::{Config, parse_dsn};
use crate::connection::Connection;
use crate::error::RedshiftDataError;

/// Opens [`Connection`]s for one validated configuration.
///
/// ```rust,no_run
/// use redshift_data_middleware::prelude::*;
///
/// # async fn demo(factory: SharedClient) -> Result<(), RedshiftDataError> {
/// let connector = Connector::from_dsn("admin@cluster(default)/dev?timeout=30s", factory)?;
/// let mut conn = connector.connect().await?;
/// let mut rows = conn.query("SELECT 1", &[]).await?;
/// while let Some(row) = rows.next_row().await? {
///     println!("{:?}", row.get_by_index(0));
/// }
/// # Ok(()) }
/// ```
pub struct Connector {
    config: Arc<Config>,
    factory: Arc<dyn ClientFactory>,
    dispatch: Dispatch,
}

impl Connector {
    /// # Errors
    /// Returns `InvalidDsn` when the configuration does not name exactly one target.
    pub fn new(
        config: Config,
        factory: impl ClientFactory + 'static,
    ) -> Result<Self, RedshiftDataError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            factory: Arc::new(factory),
            dispatch: Dispatch::none(),
        })
    }

    /// # Errors
    /// Returns the DSN parse error, or `InvalidDsn` when the target is incomplete.
    pub fn from_dsn(
        dsn: &str,
        factory: impl ClientFactory + 'static,
    ) -> Result<Self, RedshiftDataError> {
        Self::new(parse_dsn(dsn)?, factory)
    }

    /// Route this connector's log events, and those of its connections, to `dispatch`.
    /// Silent by default.
    #[must_use]
    pub fn with_log_dispatch(mut self, dispatch: impl Into<Dispatch>) -> Self {
        self.dispatch = dispatch.into();
        self
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Build a client and wrap it in a new connection.
    ///
    /// # Errors
    /// Returns `RedshiftDataError::Client` when the factory fails.
    pub async fn connect(&self) -> Result<Connection, RedshiftDataError> {
        async {
            let client = self
                .factory
                .create_client(&self.config)
                .await
                .map_err(|e| RedshiftDataError::client("create client", e))?;
            debug!(dsn = %self.config, "connected");
            Ok(Connection::new(
                client,
                Arc::clone(&self.config),
                self.dispatch.clone(),
            ))
        }
        .with_subscriber(self.dispatch.clone())
        .await
    }
}

impl std::fmt::Debug for Connector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connector")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
