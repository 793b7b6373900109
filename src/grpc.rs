//! gRPC channels over Unix domain sockets.
//!
//! Container runtimes expose their CRI endpoint on a local socket rather than a
//! TCP address, so tonic's default HTTP connector cannot be used. [`dial_unix_socket`]
//! plugs a tower connector into the endpoint that ignores the URI and opens the
//! socket path instead.
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{pin, task};

use hyper_util::rt::TokioIo;
use tonic::transport::{Channel, Endpoint};

/// Errors that may occur while establishing a channel to a Unix socket.
#[derive(Debug, thiserror::Error)]
pub enum DialError {
    #[error("failed to connect to socket `{path}`: {source}")]
    Connect {
        path: PathBuf,
        #[source]
        source: tonic::transport::Error,
    },
    #[error("timed out after {timeout:?} connecting to socket `{path}`")]
    Timeout { path: PathBuf, timeout: Duration },
}

#[derive(Debug, Clone)]
struct UnixConnector {
    path: PathBuf,
}

impl tower::Service<hyper::Uri> for UnixConnector {
    type Response = TokioIo<tokio::net::UnixStream>;

    type Error = std::io::Error;

    type Future = pin::Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut task::Context<'_>) -> task::Poll<Result<(), Self::Error>> {
        task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, _req: hyper::Uri) -> Self::Future {
        let path = self.path.clone();
        Box::pin(async move {
            let stream = tokio::net::UnixStream::connect(path).await?;

            Ok(TokioIo::new(stream))
        })
    }
}

/// Opens a gRPC channel to the Unix socket at `path`.
///
/// The channel is connected eagerly, so a missing socket or a refused connection is
/// reported here rather than on the first request. The whole dial is bounded by
/// `timeout`.
///
/// # Errors
///
/// * [`DialError::Connect`] if the socket cannot be reached.
/// * [`DialError::Timeout`] if the connection is not established within `timeout`.
pub async fn dial_unix_socket(
    path: impl AsRef<Path>,
    timeout: Duration,
) -> Result<Channel, DialError> {
    let path = path.as_ref();
    log::debug!("Connecting to {}...", path.display());
    let connector = UnixConnector {
        path: path.to_path_buf(),
    };
    // The authority is never resolved; the connector ignores the URI.
    let endpoint = Endpoint::from_static("http://[::]:50051").connect_timeout(timeout);

    let channel = tokio::time::timeout(timeout, endpoint.connect_with_connector(connector))
        .await
        .map_err(|_| DialError::Timeout {
            path: path.to_path_buf(),
            timeout,
        })?
        .map_err(|source| DialError::Connect {
            path: path.to_path_buf(),
            source,
        })?;
    log::debug!("Created channel for {}.", path.display());

    Ok(channel)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dial_missing_socket_fails() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("missing.sock");

        let err = dial_unix_socket(&path, Duration::from_secs(1))
            .await
            .expect_err("dialing a missing socket must fail");
        match err {
            DialError::Connect { path: p, .. } => assert_eq!(p, path),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_dial_silent_listener_times_out() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("silent.sock");
        // Accepts the connection at the socket level but never speaks HTTP/2.
        let listener = tokio::net::UnixListener::bind(&path).expect("bind unix listener");
        let _accepting = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });

        let timeout = Duration::from_millis(200);
        let started = std::time::Instant::now();
        let result = dial_unix_socket(&path, timeout).await;
        let elapsed = started.elapsed();

        // A silent peer may still yield a channel; the dial must not hang either way.
        if let Err(err) = result {
            assert!(matches!(
                err,
                DialError::Timeout { .. } | DialError::Connect { .. }
            ));
        }
        assert!(elapsed < timeout + Duration::from_secs(1));
    }
}
