pub mod config;
pub mod net;
pub mod relay;

pub use config::{configure_server, init_tracing};
pub use net::{ClientToServer, ServerToClient, accept_connections_task};
pub use relay::Relay;

use anyhow::{Context, Result};
use clap::Parser;
use quinn::Endpoint;
use std::{net::SocketAddr, path::PathBuf, time::Instant};
use tokio::{
    sync::mpsc::unbounded_channel,
    time::{self, Duration, MissedTickBehavior},
};
use tracing::info;

use common::{
    config::{DEFAULT_CERT_FILE, DEFAULT_KEY_FILE, TlsFiles},
    constants::{INACTIVITY_TIMEOUT_SECS, PURGE_CHECK_INTERVAL_SECS},
};

// ============================================================================
// CLI Argument Parsing
// ============================================================================

#[derive(Parser, Debug)]
#[command(author, version, about = "Racing relay server", long_about = None)]
pub struct Args {
    /// Address to bind server to
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    pub bind: String,

    /// Seconds without a message before a peer is purged
    #[arg(long, default_value_t = INACTIVITY_TIMEOUT_SECS)]
    pub inactivity_timeout_secs: u64,

    /// Use this track seed for every round instead of a random one
    #[arg(long)]
    pub seed: Option<u64>,

    /// PEM certificate chain presented to clients
    #[arg(long, default_value = DEFAULT_CERT_FILE)]
    pub cert: PathBuf,

    /// PEM private key for the certificate
    #[arg(long, default_value = DEFAULT_KEY_FILE)]
    pub key: PathBuf,
}

// ============================================================================
// Main Relay Loop
// ============================================================================

pub async fn run_server() -> Result<()> {
    init_tracing();

    let args = Args::parse();

    let addr: SocketAddr = args.bind.parse().context("invalid bind address")?;
    let server_config = configure_server(&TlsFiles {
        cert: args.cert,
        key: args.key,
    })?;
    let endpoint = Endpoint::server(server_config, addr).context("failed to open QUIC endpoint")?;
    info!(%addr, "relay listening");

    // Channel for the accept task and all per-peer network I/O tasks to reach the relay
    let (to_relay, mut from_clients) = unbounded_channel();

    tokio::spawn(accept_connections_task(endpoint, to_relay));

    let mut relay = Relay::new(args.seed);
    let timeout = Duration::from_secs(args.inactivity_timeout_secs);
    let mut purge = time::interval(Duration::from_secs(PURGE_CHECK_INTERVAL_SECS));
    purge.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            Some((id, event)) = from_clients.recv() => {
                relay.handle_event(id, event, Instant::now());
            }

            _ = purge.tick() => {
                relay.purge_inactive(Instant::now(), timeout);
            }
        }
    }
}
