//! UDP listener for client DNS queries.
//!
//! A single receive loop accepts datagrams and hands each one to its own
//! task, so one slow upstream exchange never delays the next query. Replies
//! are sent by those tasks through the shared listening socket.

use std::io;
use std::net::SocketAddr;
use std::rc::Rc;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tracing::{debug, error, warn};

use crate::proxy::ProxyConfig;
use crate::relay;

/// Consecutive receive failures after which the socket is considered dead.
const MAX_CONSECUTIVE_RECV_ERRORS: u32 = 8;

/// UDP listener for the DNS proxy.
///
/// Owns the listening socket for the process lifetime.
pub struct UdpListener {
    socket: Arc<UdpSocket>,
}

impl UdpListener {
    /// Bind the listening socket.
    pub async fn bind(addr: SocketAddr) -> io::Result<Self> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);

        Ok(Self { socket })
    }

    /// Receive loop: dispatch each datagram to its own handling task.
    ///
    /// Individual receive errors are logged and skipped so that one bad
    /// datagram never stops service. A run of back-to-back failures means
    /// the socket itself is gone; then the loop returns the error instead
    /// of spinning on it.
    pub async fn serve(self, config: Rc<ProxyConfig>) -> io::Result<()> {
        let mut buf = vec![0u8; config.max_datagram_size];
        let mut consecutive_errors = 0u32;

        loop {
            let (len, client) = match self.socket.recv_from(&mut buf).await {
                Ok(r) => r,
                Err(e) => {
                    consecutive_errors += 1;
                    if consecutive_errors >= MAX_CONSECUTIVE_RECV_ERRORS {
                        error!(error = %e, "listening socket unusable, giving up");
                        return Err(e);
                    }
                    warn!(error = %e, "UDP recv error");
                    continue;
                }
            };
            consecutive_errors = 0;

            debug!(client = %client, len, "datagram received");

            tokio::task::spawn_local(relay::handle_query(
                self.socket.clone(),
                buf[..len].to_vec(),
                client,
                config.clone(),
            ));
        }
    }
}
