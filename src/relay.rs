//! Per-query relay pipeline.
//!
//! Every client datagram gets its own task running this pipeline: decode the
//! query, forward the original bytes upstream over a fresh socket, decode the
//! reply, rewrite it when the question type calls for it, and send the result
//! back through the listening socket. Any failure drops the query silently;
//! the client never sees a DNS error response and falls back on its own
//! retry logic.

use std::net::SocketAddr;
use std::rc::Rc;
use std::sync::Arc;

use hickory_proto::op::Message;
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::RelayError;
use crate::proxy::ProxyConfig;
use crate::rewrite;

/// Task entry point: run the pipeline and confine every error to this task.
pub async fn handle_query(
    socket: Arc<UdpSocket>,
    packet: Vec<u8>,
    client: SocketAddr,
    config: Rc<ProxyConfig>,
) {
    match process(&packet, &config).await {
        Ok(reply) => {
            if let Err(e) = socket.send_to(&reply, client).await {
                warn!(client = %client, error = %e, "failed to send reply");
            } else {
                debug!(client = %client, len = reply.len(), "reply sent");
            }
        }
        // A proxy must never amplify or reflect malformed traffic, and
        // hostile garbage should not spam the normal log levels either.
        Err(e @ RelayError::MalformedQuery(_)) => {
            debug!(client = %client, error = %e, "dropping query");
        }
        Err(e) => {
            warn!(client = %client, error = %e, "dropping query");
        }
    }
}

/// The fallible part of the pipeline; returns the reply bytes for the client.
async fn process(packet: &[u8], config: &ProxyConfig) -> Result<Vec<u8>, RelayError> {
    let query =
        Message::from_vec(packet).map_err(|e| RelayError::MalformedQuery(e.to_string()))?;
    let question = query
        .queries()
        .first()
        .ok_or_else(|| RelayError::MalformedQuery("no question section".into()))?;

    let qname = question.name().to_utf8();
    let qtype = question.query_type();

    debug!(id = query.id(), name = %qname, qtype = ?qtype, "forwarding query upstream");

    let raw_reply = exchange(packet, config).await?;

    let response = Message::from_vec(&raw_reply)
        .map_err(|e| RelayError::MalformedUpstreamResponse(e.to_string()))?;

    // The rewrite filter keys on the QUESTION type. Responses to other
    // question types are forwarded as the exact bytes the upstream sent,
    // so unmodified replies round-trip byte-identically.
    if !rewrite::applies_to(qtype) {
        return Ok(raw_reply);
    }

    let rewritten = rewrite::rewrite_response(response)
        .map_err(|e| RelayError::MalformedUpstreamResponse(e.to_string()))?;

    rewritten
        .to_vec()
        .map_err(|e| RelayError::MalformedUpstreamResponse(e.to_string()))
}

/// One-shot upstream exchange over a fresh ephemeral socket.
///
/// No retries and no pooling: the socket lives for exactly one send/receive
/// pair and is closed when this function returns.
async fn exchange(packet: &[u8], config: &ProxyConfig) -> Result<Vec<u8>, RelayError> {
    let server = config.upstream_addr;
    let unavailable = |reason: String| RelayError::UpstreamUnavailable { server, reason };

    let bind_addr = if server.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
    let socket = UdpSocket::bind(bind_addr)
        .await
        .map_err(|e| unavailable(format!("bind: {e}")))?;

    timeout(config.upstream_timeout, socket.send_to(packet, server))
        .await
        .map_err(|_| unavailable("send timed out".into()))?
        .map_err(|e| unavailable(format!("send: {e}")))?;

    let mut buf = vec![0u8; config.max_datagram_size];
    let (len, _) = timeout(config.upstream_timeout, socket.recv_from(&mut buf))
        .await
        .map_err(|_| unavailable(format!("no reply within {:?}", config.upstream_timeout)))?
        .map_err(|e| unavailable(format!("recv: {e}")))?;

    buf.truncate(len);
    Ok(buf)
}
