use clap::Parser;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use garble::proxy::{self, ProxyConfig};

#[derive(Parser)]
#[command(name = "garble")]
#[command(about = "Case-garbling DNS forwarding proxy", long_about = None)]
struct Args {
    /// Local port to listen on
    #[arg(short, long, default_value = "5354")]
    port: u16,

    /// Bind address
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,

    /// Upstream DNS server (host:port)
    #[arg(short, long, default_value = "8.8.8.8:53")]
    upstream: String,

    /// Upstream timeout in seconds
    #[arg(short, long, default_value = "3")]
    timeout: u64,

    /// Largest accepted UDP datagram in bytes
    #[arg(long, default_value = "512")]
    max_datagram_size: usize,
}

fn main() -> io::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let bind_addr: SocketAddr = format!("{}:{}", args.bind, args.port)
        .parse()
        .expect("invalid bind address");

    let upstream_addr: SocketAddr = args.upstream.parse().expect("invalid upstream address");

    let config = ProxyConfig {
        bind_addr,
        upstream_addr,
        upstream_timeout: Duration::from_secs(args.timeout),
        max_datagram_size: args.max_datagram_size,
    };

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let local = tokio::task::LocalSet::new();
    local.block_on(&rt, proxy::run(config))
}
