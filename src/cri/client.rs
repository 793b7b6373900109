use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use tonic::transport::Channel;

use crate::grpc;
use crate::retry::{Retrier, RetryStatus};
use crate::runtime::v1::runtime_service_client::RuntimeServiceClient;
use crate::runtime::v1::{ContainerStatsFilter, ListContainerStatsRequest, VersionRequest};

use super::stats::{ContainerStatsSnapshot, index_by_container_id};
use super::{BootstrapError, CriConfig, Error, Result};

static GLOBAL: OnceLock<CriClient> = OnceLock::new();

/// Returns the process-wide client, bootstrapping it if needed.
///
/// The first call constructs an empty client from [`CriConfig::from_env`]; every call
/// then triggers its bootstrap, which is a no-op once it has succeeded.
///
/// # Errors
///
/// Returns [`Error::Init`] while the runtime cannot be reached.
/// [`Error::is_exhausted`] tells whether it is worth asking again.
pub async fn get_client() -> Result<&'static CriClient> {
    let client = CriClient::global();
    client.ensure_ready().await?;
    Ok(client)
}

/// An established connection to the runtime. Only exists after a successful bootstrap.
#[derive(Debug)]
struct Connection {
    client: RuntimeServiceClient<Channel>,
    runtime_name: String,
    runtime_version: String,
    runtime_api_version: String,
}

/// Client for a container runtime's CRI endpoint.
///
/// The connection is established lazily by [`CriClient::ensure_ready`] and then
/// shared by all queries. A connection that breaks after that is not replaced; the
/// failure surfaces on each query instead.
#[derive(Debug)]
pub struct CriClient {
    socket_path: PathBuf,
    query_timeout: Duration,
    init: Retrier<Connection, BootstrapError>,
}

impl CriClient {
    /// Creates a client that has not connected yet.
    pub fn new(config: CriConfig) -> Self {
        let CriConfig {
            socket_path,
            query_timeout,
            retry,
        } = config;
        let init = {
            let socket_path = socket_path.clone();
            Retrier::new(retry, move || bootstrap(socket_path.clone(), query_timeout))
        };

        Self {
            socket_path,
            query_timeout,
            init,
        }
    }

    /// The process-wide client.
    ///
    /// Falls back to the default configuration if the environment holds invalid
    /// overrides.
    pub fn global() -> &'static CriClient {
        GLOBAL.get_or_init(|| {
            let config = CriConfig::from_env().unwrap_or_else(|err| {
                log::warn!("ignoring CRI configuration from environment: {}", err);
                CriConfig::default()
            });
            CriClient::new(config)
        })
    }

    /// Connects to the runtime unless already connected.
    ///
    /// Concurrent callers wait for an in-flight attempt instead of dialing again.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Init`] with either this attempt's failure or, once the
    /// attempt budget is spent, the exhausted state.
    pub async fn ensure_ready(&self) -> Result<()> {
        self.init.trigger().await?;
        Ok(())
    }

    /// Lists the stats of every container the runtime knows about.
    ///
    /// The client must be ready; this never bootstraps. The call is bounded by the
    /// configured query timeout and is not retried.
    ///
    /// # Errors
    ///
    /// * [`Error::NotReady`] if the client has not connected yet.
    /// * [`Error::Query`] if the runtime rejected the call.
    /// * [`Error::QueryTimeout`] if no answer arrived in time.
    pub async fn list_container_stats(&self) -> Result<ContainerStatsSnapshot> {
        self.list_container_stats_filtered(ContainerStatsFilter::default())
            .await
    }

    /// Like [`list_container_stats`](Self::list_container_stats) but narrowed down by
    /// container id, pod sandbox id or labels.
    pub async fn list_container_stats_filtered(
        &self,
        filter: ContainerStatsFilter,
    ) -> Result<ContainerStatsSnapshot> {
        let connection = self.init.get().ok_or(Error::NotReady)?;
        let mut client = connection.client.clone();
        let request = ListContainerStatsRequest {
            filter: Some(filter),
        };

        // Dropping the call on timeout cancels the underlying HTTP/2 stream.
        let response = tokio::time::timeout(self.query_timeout, client.list_container_stats(request))
            .await
            .map_err(|_| Error::QueryTimeout {
                timeout: self.query_timeout,
            })?
            .map_err(|status| Error::Query(Box::new(status)))?;

        let stats = response.into_inner().stats;
        log::trace!("Received stats for {} containers", stats.len());
        Ok(index_by_container_id(stats))
    }

    pub fn status(&self) -> RetryStatus {
        self.init.status()
    }

    /// How long to wait before the next bootstrap attempt, honoring the retry delay.
    pub async fn next_attempt_in(&self) -> Option<Duration> {
        self.init.next_attempt_in().await
    }

    pub fn retry_delay(&self) -> Duration {
        self.init.retry_delay()
    }

    pub fn runtime_name(&self) -> Option<&str> {
        self.init.get().map(|c| c.runtime_name.as_str())
    }

    pub fn runtime_version(&self) -> Option<&str> {
        self.init.get().map(|c| c.runtime_version.as_str())
    }

    pub fn runtime_api_version(&self) -> Option<&str> {
        self.init.get().map(|c| c.runtime_api_version.as_str())
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    pub fn query_timeout(&self) -> Duration {
        self.query_timeout
    }
}

/// Dials the runtime and checks that it answers a version request.
///
/// A socket that accepts connections but does not answer is not ready; its channel
/// is dropped with the failed attempt.
async fn bootstrap(
    socket_path: PathBuf,
    timeout: Duration,
) -> std::result::Result<Connection, BootstrapError> {
    let channel = grpc::dial_unix_socket(&socket_path, timeout).await?;
    let mut client = RuntimeServiceClient::new(channel);

    let version = tokio::time::timeout(timeout, client.version(VersionRequest::default()))
        .await
        .map_err(|_| BootstrapError::ValidationTimeout { timeout })?
        .map_err(|status| BootstrapError::Validation(Box::new(status)))?
        .into_inner();
    log::info!(
        "Connected to {} {} (CRI {}) at {}",
        version.runtime_name,
        version.runtime_version,
        version.runtime_api_version,
        socket_path.display()
    );

    Ok(Connection {
        client,
        runtime_name: version.runtime_name,
        runtime_version: version.runtime_version,
        runtime_api_version: version.runtime_api_version,
    })
}
