//! Transport layer for the DNS proxy.
//!
//! The proxy speaks plain DNS over UDP on both sides: client queries arrive
//! on the listening socket and are forwarded over short-lived upstream
//! sockets owned by the per-query tasks.

pub mod udp;
