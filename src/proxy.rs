//! DNS proxy orchestration.
//!
//! Binds the UDP listener and runs the proxy until the listening socket
//! fails or the process is interrupted.

use std::io;
use std::net::SocketAddr;
use std::rc::Rc;
use std::time::Duration;

use tracing::info;

use crate::transport::udp::UdpListener;

/// Configuration for the DNS proxy.
///
/// Built once at startup and shared read-only with every handling task.
pub struct ProxyConfig {
    /// Local address to bind (e.g., 0.0.0.0:5354)
    pub bind_addr: SocketAddr,
    /// Upstream resolver queries are forwarded to
    pub upstream_addr: SocketAddr,
    /// How long one upstream send/receive may take before the query is dropped
    pub upstream_timeout: Duration,
    /// Largest datagram accepted on either side (DNS-over-UDP payload limit)
    pub max_datagram_size: usize,
}

/// Run the DNS proxy with the given configuration.
///
/// Resolves only on a fatal listener error or ctrl-c.
pub async fn run(config: ProxyConfig) -> io::Result<()> {
    let listener = UdpListener::bind(config.bind_addr).await?;

    info!(
        listen = %config.bind_addr,
        upstream = %config.upstream_addr,
        "DNS proxy listening"
    );

    tokio::select! {
        result = listener.serve(Rc::new(config)) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down");
            Ok(())
        }
    }
}
