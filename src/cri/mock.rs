//! In-process CRI runtime served on a temporary Unix socket.
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use tokio_stream::wrappers::UnixListenerStream;
use tonic::{Request, Response, Status};

use crate::runtime::v1::runtime_service_server::{RuntimeService, RuntimeServiceServer};
use crate::runtime::v1::{
    ContainerStats, ContainerStatsFilter, ListContainerStatsRequest, ListContainerStatsResponse,
    VersionRequest, VersionResponse,
};

pub(crate) const RUNTIME_NAME: &str = "containerd";
pub(crate) const RUNTIME_VERSION: &str = "v2.0.4";
pub(crate) const RUNTIME_API_VERSION: &str = "v1";

#[derive(Debug, Default)]
pub(crate) struct MockState {
    pub version_calls: AtomicU32,
    pub list_calls: AtomicU32,
    /// Number of upcoming version calls to reject.
    pub failing_versions: AtomicU32,
    pub fail_next_list: AtomicBool,
    pub list_delay: Mutex<Option<Duration>>,
    pub stats: Mutex<Vec<ContainerStats>>,
    pub last_filter: Mutex<Option<ContainerStatsFilter>>,
}

impl MockState {
    pub fn set_stats(&self, stats: Vec<ContainerStats>) {
        *self.stats.lock().unwrap() = stats;
    }

    pub fn set_list_delay(&self, delay: Duration) {
        *self.list_delay.lock().unwrap() = Some(delay);
    }
}

struct MockRuntime(Arc<MockState>);

#[tonic::async_trait]
impl RuntimeService for MockRuntime {
    async fn version(
        &self,
        _request: Request<VersionRequest>,
    ) -> Result<Response<VersionResponse>, Status> {
        self.0.version_calls.fetch_add(1, Ordering::SeqCst);
        let rejected = self
            .0
            .failing_versions
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if rejected {
            return Err(Status::unavailable("runtime is starting"));
        }

        Ok(Response::new(VersionResponse {
            version: "0.1.0".to_owned(),
            runtime_name: RUNTIME_NAME.to_owned(),
            runtime_version: RUNTIME_VERSION.to_owned(),
            runtime_api_version: RUNTIME_API_VERSION.to_owned(),
        }))
    }

    async fn list_container_stats(
        &self,
        request: Request<ListContainerStatsRequest>,
    ) -> Result<Response<ListContainerStatsResponse>, Status> {
        self.0.list_calls.fetch_add(1, Ordering::SeqCst);
        *self.0.last_filter.lock().unwrap() = request.into_inner().filter;

        let delay = *self.0.list_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.0.fail_next_list.swap(false, Ordering::SeqCst) {
            return Err(Status::internal("stats collection failed"));
        }

        let stats = self.0.stats.lock().unwrap().clone();
        Ok(Response::new(ListContainerStatsResponse { stats }))
    }
}

/// A running mock runtime. The socket is removed when this is dropped.
pub(crate) struct MockServer {
    pub state: Arc<MockState>,
    pub socket_path: PathBuf,
    handle: tokio::task::JoinHandle<()>,
    _dir: tempfile::TempDir,
}

impl MockServer {
    pub async fn start() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let socket_path = dir.path().join("cri.sock");
        let listener = tokio::net::UnixListener::bind(&socket_path).expect("bind unix listener");
        let state = Arc::new(MockState::default());

        let service = RuntimeServiceServer::new(MockRuntime(Arc::clone(&state)));
        let handle = tokio::spawn(async move {
            tonic::transport::Server::builder()
                .add_service(service)
                .serve_with_incoming(UnixListenerStream::new(listener))
                .await
                .expect("mock runtime server failed");
        });

        Self {
            state,
            socket_path,
            handle,
            _dir: dir,
        }
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
