//! cri-stats: point-in-time container resource usage from a CRI runtime.
//!
//! The library talks to a container runtime (containerd, CRI-O) through the
//! Container Runtime Interface on its local Unix socket. The interesting part is the
//! lifecycle: one shared client per process, connected lazily, with a bounded number
//! of connect attempts against a runtime that may still be starting.
use std::time::Duration;

pub mod container;
pub mod cri;
pub mod error;
pub mod grpc;
pub mod models;
pub mod retry;

pub mod runtime {
    pub mod v1 {
        tonic::include_proto!("runtime.v1");
    }
}

/// How often the binary prints a snapshot, unless `CRI_STATS_INTERVAL_SECS` is set.
const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(10);

/// Runs the `cri-stats` report loop.
///
/// Waits for the runtime to come up, honoring the retry delay between connect
/// attempts, then prints one JSON [`models::SnapshotReport`] per interval to stdout.
/// A failed stats query is logged and the loop carries on.
///
/// # Errors
///
/// * The `CRI_STATS_INTERVAL_SECS` variable holds an invalid value.
/// * The runtime stayed unreachable for the whole retry budget.
/// * A report could not be serialized.
pub async fn run() -> error::Result<()> {
    let period = cri::duration_from_env("CRI_STATS_INTERVAL_SECS")?
        .filter(|d| !d.is_zero())
        .unwrap_or(DEFAULT_REPORT_INTERVAL);
    log::debug!("Reporting every {:?}", period);

    let client = loop {
        match cri::get_client().await {
            Ok(client) => break client,
            Err(err) if err.is_exhausted() => {
                log::error!("giving up on the container runtime: {}", err);
                return Err(err.into());
            }
            Err(err) => {
                let wait = cri::CriClient::global()
                    .next_attempt_in()
                    .await
                    .unwrap_or(Duration::ZERO);
                log::warn!("container runtime not ready, retrying in {:?}: {}", wait, err);
                tokio::time::sleep(wait).await;
            }
        }
    };

    let mut interval = tokio::time::interval(period);
    loop {
        interval.tick().await;
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)?
            .as_secs();
        log::trace!("Listing container stats@{timestamp}");

        match client.list_container_stats().await {
            Ok(snapshot) => {
                let report = models::SnapshotReport::new(
                    timestamp,
                    client.runtime_name(),
                    client.runtime_version(),
                    &snapshot,
                );
                let line = serde_json::to_string(&report).map_err(error::Error::Serialize)?;
                println!("{line}");
            }
            Err(err) => log::error!("{}", err),
        }
    }
}
