use std::ffi::OsString;
use std::time::Duration;

use crate::grpc::DialError;
use crate::retry::RetryError;

/// Why a single bootstrap attempt failed.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Dial(#[from] DialError),
    #[error("runtime did not answer the version check: {0}")]
    Validation(#[source] Box<tonic::Status>),
    #[error("runtime did not answer the version check within {timeout:?}")]
    ValidationTimeout { timeout: Duration },
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("CRI client initialization failed: {0}")]
    Init(#[from] RetryError<BootstrapError>),
    #[error("CRI client is not initialized")]
    NotReady,
    #[error("failed to list container stats: {0}")]
    Query(#[source] Box<tonic::Status>),
    #[error("listing container stats timed out after {timeout:?}")]
    QueryTimeout { timeout: Duration },
}

impl Error {
    /// Returns true if the client can never become ready.
    ///
    /// Callers polling [`get_client`](super::get_client) should stop once this is set.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Init(err) if err.is_exhausted())
    }
}

/// Errors that may occur while reading the client configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value `{value}` for `{key}`: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
    #[error("value of `{key}` is not valid unicode: {value:?}")]
    NotUnicode { key: String, value: OsString },
}

pub type Result<T> = std::result::Result<T, Error>;
