/// Entry point for the `cri-stats` tool.
///
/// Connects to the container runtime's CRI socket and prints a JSON stats report for
/// all containers once per interval.
///
/// # Errors
///
/// Returns an error if the runtime stays unreachable for the whole retry budget or
/// if the configuration in the environment is invalid.
///
/// # Examples
///
/// ```bash
/// RUST_LOG=debug CRI_SOCKET_PATH=/run/containerd/containerd.sock cargo run
/// ```
#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    cri_stats::run().await?;
    Ok(())
}
