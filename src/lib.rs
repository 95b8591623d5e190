//! Garble - a case-garbling DNS forwarding proxy.
//!
//! Relays DNS queries over UDP to an upstream resolver and randomizes the
//! letter case of CNAME, NS, and SOA name targets in qualifying responses.
//! This library exposes the relay pipeline for benchmarking and testing.

pub mod error;
pub mod proxy;
pub mod relay;
pub mod rewrite;
pub mod transport;
