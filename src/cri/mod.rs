//! Client for a container runtime's CRI endpoint.
//!
//! [`get_client`] hands out a process-wide [`CriClient`] that connects on first use
//! and retries failed connects within a fixed budget. Once connected, the client is
//! shared by all callers and [`CriClient::list_container_stats`] returns a fresh
//! [`ContainerStatsSnapshot`] per call.
//!
//! ```no_run
//! # async fn example() -> Result<(), cri_stats::cri::Error> {
//! let client = cri_stats::cri::get_client().await?;
//! for (id, stats) in client.list_container_stats().await? {
//!     println!("{id}: {:?}", stats.memory);
//! }
//! # Ok(())
//! # }
//! ```
mod client;
mod config;
mod error;
#[cfg(test)]
mod mock;
mod stats;

pub use client::{CriClient, get_client};
pub(crate) use config::duration_from_env;
pub use config::{
    CriConfig, DEFAULT_QUERY_TIMEOUT, DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_DELAY,
    DEFAULT_RETRY_NAME, DEFAULT_SOCKET_PATH, QUERY_TIMEOUT_VAR, RETRY_ATTEMPTS_VAR,
    RETRY_DELAY_VAR, SOCKET_PATH_VAR,
};
pub use error::{BootstrapError, ConfigError, Error, Result};
pub use stats::{ContainerStatsSnapshot, index_by_container_id};
