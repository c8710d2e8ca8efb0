use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use url::{Url, form_urlencoded};

use crate::error::RedshiftDataError;
use crate::model::TargetIdentity;

/// Overall statement timeout used when the configuration leaves it at zero.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15 * 60);
/// Poll interval used when the configuration leaves it at zero.
pub const DEFAULT_POLLING: Duration = Duration::from_millis(10);

/// Characters escaped in the database (path) part of a DSN.
const PATH_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Characters escaped in the user (userinfo) part of a DSN.
const USERINFO_ENCODE_SET: &AsciiSet = &PATH_ENCODE_SET
    .add(b':')
    .add(b'@')
    .add(b'[')
    .add(b']')
    .add(b'\\')
    .add(b'^')
    .add(b'|');

const TARGET_HINT: &str =
    "workgroup(name)/database or username@cluster(name)/database or secrets_arn";

/// Options handed to the client factory along with the configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientOptions {
    pub region: Option<String>,
}

/// Parsed connection string.
///
/// A target is identified by exactly one of: a cluster plus database user, a serverless
/// workgroup, or a secrets-manager ARN.
///
/// ```rust
/// use redshift_data_middleware::prelude::*;
/// use std::time::Duration;
///
/// let cfg: Config = "admin@cluster(default)/dev?timeout=30s".parse()?;
/// assert_eq!(cfg.cluster_identifier.as_deref(), Some("default"));
/// assert_eq!(cfg.timeout, Duration::from_secs(30));
/// assert_eq!(cfg.to_string(), "admin@cluster(default)/dev?timeout=30s");
/// # Ok::<(), RedshiftDataError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub cluster_identifier: Option<String>,
    pub database: Option<String>,
    pub db_user: Option<String>,
    pub workgroup_name: Option<String>,
    pub secret_arn: Option<String>,

    /// Overall timeout per statement; zero means [`DEFAULT_TIMEOUT`].
    pub timeout: Duration,
    /// Status poll interval; zero means [`DEFAULT_POLLING`].
    pub polling: Duration,

    /// Query parameters not consumed by the parser, kept for round-tripping.
    pub params: BTreeMap<String, Vec<String>>,
    pub client_options: ClientOptions,
}

impl Config {
    #[must_use]
    pub fn cluster(
        cluster_identifier: impl Into<String>,
        db_user: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            cluster_identifier: Some(cluster_identifier.into()),
            db_user: Some(db_user.into()),
            database: Some(database.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn workgroup(workgroup_name: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            workgroup_name: Some(workgroup_name.into()),
            database: Some(database.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn secret(secret_arn: impl Into<String>) -> Self {
        Self {
            secret_arn: Some(secret_arn.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_polling(mut self, polling: Duration) -> Self {
        self.polling = polling;
        self
    }

    /// Add an opaque query parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.entry(key.into()).or_default().push(value.into());
        self
    }

    /// Set the client region; also recorded as the `region` parameter.
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        let region = region.into();
        self.params.insert("region".to_string(), vec![region.clone()]);
        self.client_options.region = Some(region);
        self
    }

    /// First value of an opaque query parameter.
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    #[must_use]
    pub fn effective_timeout(&self) -> Duration {
        if self.timeout.is_zero() {
            DEFAULT_TIMEOUT
        } else {
            self.timeout
        }
    }

    #[must_use]
    pub fn effective_polling(&self) -> Duration {
        if self.polling.is_zero() {
            DEFAULT_POLLING
        } else {
            self.polling
        }
    }

    /// Identity fields sent with every submission.
    #[must_use]
    pub fn identity(&self) -> TargetIdentity {
        TargetIdentity {
            cluster_identifier: self.cluster_identifier.clone(),
            database: self.database.clone(),
            db_user: self.db_user.clone(),
            workgroup_name: self.workgroup_name.clone(),
            secret_arn: self.secret_arn.clone(),
        }
    }

    /// Check that exactly one target is identified.
    ///
    /// # Errors
    /// Returns `RedshiftDataError::InvalidDsn` when the target is missing or ambiguous, or
    /// when a cluster or workgroup target has no database.
    pub fn validate(&self) -> Result<(), RedshiftDataError> {
        let cluster = self.cluster_identifier.is_some() && self.db_user.is_some();
        let workgroup = self.workgroup_name.is_some();
        let secret = self.secret_arn.is_some();
        let targets = [cluster, workgroup, secret].into_iter().filter(|t| *t).count();
        if targets != 1 {
            return Err(RedshiftDataError::InvalidDsn(TARGET_HINT.to_string()));
        }
        if (cluster || workgroup) && self.database.is_none() {
            return Err(RedshiftDataError::InvalidDsn("missing database".to_string()));
        }
        Ok(())
    }

    fn set_params<I, K, V>(&mut self, pairs: I) -> Result<(), RedshiftDataError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (key, value) in pairs {
            params.entry(key.into()).or_default().push(value.into());
        }

        if let Some(values) = params.remove("timeout") {
            self.timeout = parse_duration_param("timeout", &values)?;
        }
        if let Some(values) = params.remove("polling") {
            self.polling = parse_duration_param("polling", &values)?;
        }
        self.params = params;
        if let Some(region) = self.param("region").map(str::to_string) {
            self.client_options.region = Some(region);
        }
        Ok(())
    }

    fn base_string(&self) -> String {
        if let Some(arn) = &self.secret_arn {
            return arn.clone();
        }
        let mut host = String::new();
        if let (Some(cluster), Some(user)) = (&self.cluster_identifier, &self.db_user) {
            let user = utf8_percent_encode(user, USERINFO_ENCODE_SET);
            host = format!("{user}@cluster({cluster})");
        }
        if let Some(workgroup) = &self.workgroup_name {
            host = format!("workgroup({workgroup})");
        }
        match &self.database {
            Some(database) if !host.is_empty() => {
                format!("{host}/{}", utf8_percent_encode(database, PATH_ENCODE_SET))
            }
            _ => String::new(),
        }
    }
}

fn parse_duration_param(key: &str, values: &[String]) -> Result<Duration, RedshiftDataError> {
    let raw = values.first().map(String::as_str).unwrap_or_default();
    humantime::parse_duration(raw).map_err(|e| {
        RedshiftDataError::InvalidDsn(format!(
            "set query params: parse {key} as duration: {e}"
        ))
    })
}

/// Parse a connection string.
///
/// # Errors
/// Returns `RedshiftDataError::EmptyDsn` for an empty string and
/// `RedshiftDataError::InvalidDsn` for anything that is not one of the accepted forms.
pub fn parse_dsn(dsn: &str) -> Result<Config, RedshiftDataError> {
    if dsn.is_empty() {
        return Err(RedshiftDataError::EmptyDsn);
    }

    if dsn.starts_with("arn:") {
        let (arn, query) = match dsn.split_once('?') {
            Some((arn, query)) => (arn, Some(query)),
            None => (dsn, None),
        };
        let mut cfg = Config::secret(arn);
        if let Some(query) = query {
            cfg.set_params(form_urlencoded::parse(query.as_bytes()).into_owned())?;
        }
        return Ok(cfg);
    }

    let url = Url::parse(&format!("redshift-data://{dsn}"))
        .map_err(|e| RedshiftDataError::InvalidDsn(e.to_string()))?;

    let database = decode_component(url.path().trim_start_matches('/'))?;
    if database.is_empty() {
        return Err(RedshiftDataError::InvalidDsn("missing database".to_string()));
    }
    let mut cfg = Config {
        database: Some(database),
        ..Config::default()
    };
    cfg.set_params(url.query_pairs().into_owned())?;

    let host = url.host_str().unwrap_or_default();
    if let Some(rest) = host.strip_prefix("cluster(") {
        cfg.cluster_identifier = non_empty(rest.trim_end_matches(')'));
        cfg.db_user = non_empty(&decode_component(url.username())?);
        return Ok(cfg);
    }
    if let Some(rest) = host.strip_prefix("workgroup(") {
        cfg.workgroup_name = non_empty(rest.trim_end_matches(')'));
        return Ok(cfg);
    }
    Err(RedshiftDataError::InvalidDsn(TARGET_HINT.to_string()))
}

fn decode_component(raw: &str) -> Result<String, RedshiftDataError> {
    percent_decode_str(raw)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|e| RedshiftDataError::InvalidDsn(format!("decode {raw:?}: {e}")))
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

impl FromStr for Config {
    type Err = RedshiftDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_dsn(s)
    }
}

/// Connection-string form; an unidentified configuration renders as `""`.
impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base = self.base_string();
        if base.is_empty() {
            return Ok(());
        }
        f.write_str(&base)?;

        let mut params = self.params.clone();
        params.remove("timeout");
        params.remove("polling");
        if !self.timeout.is_zero() {
            params.insert(
                "timeout".to_string(),
                vec![humantime::format_duration(self.timeout).to_string()],
            );
        }
        if !self.polling.is_zero() {
            params.insert(
                "polling".to_string(),
                vec![humantime::format_duration(self.polling).to_string()],
            );
        }

        let mut encoder = form_urlencoded::Serializer::new(String::new());
        for (key, values) in &params {
            for value in values {
                encoder.append_pair(key, value);
            }
        }
        let encoded = encoder.finish();
        if !encoded.is_empty() {
            write!(f, "?{encoded}")?;
        }
        Ok(())
    }
}
