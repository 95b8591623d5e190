//! Error taxonomy for the relay pipeline.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Everything that can go wrong while handling one client datagram.
///
/// Every variant is terminal for that datagram: the query is dropped and the
/// client gets no reply, not even a SERVFAIL. Clients fall back on their own
/// resolver retry logic. Errors never cross task boundaries.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Client bytes were not a well-formed DNS query, or carried no question.
    #[error("malformed query: {0}")]
    MalformedQuery(String),

    /// The upstream reply did not decode, or the rewritten reply did not
    /// re-encode.
    #[error("malformed upstream response: {0}")]
    MalformedUpstreamResponse(String),

    /// The upstream resolver could not be reached in time.
    #[error("upstream {server} unavailable: {reason}")]
    UpstreamUnavailable { server: SocketAddr, reason: String },

    /// Reply-path socket failure.
    #[error("socket error: {0}")]
    Socket(#[from] io::Error),
}
