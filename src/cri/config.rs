use std::ffi::OsString;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::time::Duration;

use crate::retry::RetryConfig;

use super::ConfigError;

/// containerd's CRI endpoint.
pub const DEFAULT_SOCKET_PATH: &str = "/var/run/containerd/containerd.sock";
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_RETRY_NAME: &str = "criutil";
pub const DEFAULT_RETRY_ATTEMPTS: NonZeroU32 = NonZeroU32::new(10).unwrap();
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(30);

pub const SOCKET_PATH_VAR: &str = "CRI_SOCKET_PATH";
pub const QUERY_TIMEOUT_VAR: &str = "CRI_QUERY_TIMEOUT_SECS";
pub const RETRY_ATTEMPTS_VAR: &str = "CRI_RETRY_ATTEMPTS";
pub const RETRY_DELAY_VAR: &str = "CRI_RETRY_DELAY_SECS";

/// Settings for a [`CriClient`](super::CriClient).
///
/// A single timeout bounds the connect, the version check and every stats query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CriConfig {
    pub socket_path: PathBuf,
    pub query_timeout: Duration,
    pub retry: RetryConfig,
}

impl Default for CriConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            retry: RetryConfig::new(DEFAULT_RETRY_NAME, DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_DELAY),
        }
    }
}

impl CriConfig {
    /// Builds a configuration from the defaults, overridden by environment variables.
    ///
    /// | Variable | Meaning |
    /// |---|---|
    /// | `CRI_SOCKET_PATH` | path of the runtime's Unix socket |
    /// | `CRI_QUERY_TIMEOUT_SECS` | connect and per-call timeout, in seconds |
    /// | `CRI_RETRY_ATTEMPTS` | bootstrap attempt budget, at least 1 |
    /// | `CRI_RETRY_DELAY_SECS` | advised delay between bootstrap attempts, in seconds |
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var_os(key))
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<OsString>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(path) = lookup(SOCKET_PATH_VAR) {
            config.socket_path = PathBuf::from(path);
        }
        if let Some(timeout) = parse_var(&lookup, QUERY_TIMEOUT_VAR, parse_secs)? {
            config.query_timeout = timeout;
        }
        if let Some(attempts) = parse_var(&lookup, RETRY_ATTEMPTS_VAR, |s| {
            s.parse::<NonZeroU32>().map_err(|err| err.to_string())
        })? {
            config.retry.max_attempts = attempts;
        }
        if let Some(delay) = parse_var(&lookup, RETRY_DELAY_VAR, parse_secs)? {
            config.retry.delay = delay;
        }

        Ok(config)
    }

    pub fn with_socket_path(mut self, socket_path: impl Into<PathBuf>) -> Self {
        self.socket_path = socket_path.into();
        self
    }

    pub fn with_query_timeout(mut self, query_timeout: Duration) -> Self {
        self.query_timeout = query_timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

/// Reads a duration in (possibly fractional) seconds from the environment.
pub(crate) fn duration_from_env(key: &str) -> Result<Option<Duration>, ConfigError> {
    parse_var(&|key: &str| std::env::var_os(key), key, parse_secs)
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<OsString>,
    key: &str,
    parse: impl FnOnce(&str) -> Result<T, String>,
) -> Result<Option<T>, ConfigError> {
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let value = raw.into_string().map_err(|raw| ConfigError::NotUnicode {
        key: key.to_owned(),
        value: raw,
    })?;
    parse(value.trim())
        .map(Some)
        .map_err(|reason| ConfigError::InvalidValue {
            key: key.to_owned(),
            value,
            reason,
        })
}

fn parse_secs(s: &str) -> Result<Duration, String> {
    let secs = s.parse::<f64>().map_err(|err| err.to_string())?;
    Duration::try_from_secs_f64(secs).map_err(|err| err.to_string())
}
