pub mod autopilot;
pub mod config;
pub mod constants;
pub mod game;
pub mod net;

pub use autopilot::Autopilot;
pub use config::{configure_client, init_tracing};
pub use game::{GameClient, run_frame_loop};
pub use net::network_io_task;

use anyhow::{Context, Result};
use clap::Parser;
use quinn::Endpoint;
use std::path::PathBuf;
use tokio::sync::mpsc::unbounded_channel;
use tracing::info;

use crate::constants::DEFAULT_FRAME_RATE;
use common::config::DEFAULT_CERT_FILE;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless racing client", long_about = None)]
pub struct Args {
    /// Relay address to connect to
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    pub server: String,

    /// Coast with no input instead of driving with the autopilot
    #[arg(long, default_value_t = false)]
    pub no_autopilot: bool,

    /// As host, start a round once this many players (including this one) are present
    #[arg(long)]
    pub auto_start: Option<usize>,

    /// Simulation frames per second
    #[arg(long, default_value_t = DEFAULT_FRAME_RATE)]
    pub frame_rate: u32,

    /// PEM certificate of the relay, trusted as the only root
    #[arg(long, default_value = DEFAULT_CERT_FILE)]
    pub cert: PathBuf,
}

// ============================================================================
// Main Client Loop
// ============================================================================

pub async fn run_client() -> Result<()> {
    init_tracing();

    let args = Args::parse();

    let mut endpoint = Endpoint::client("0.0.0.0:0".parse()?).context("failed to open QUIC endpoint")?;
    endpoint.set_default_client_config(configure_client(&args.cert)?);
    let connection = endpoint
        .connect(args.server.parse().context("invalid server address")?, "localhost")?
        .await
        .context("failed to connect to relay")?;
    info!(server = %args.server, "connected");

    // Channel for sending from the network I/O task to the frame loop
    let (to_game, from_server) = unbounded_channel();
    // Channel for sending from the frame loop to the network I/O task
    let (to_server, from_game) = unbounded_channel();

    tokio::spawn(network_io_task(connection, to_game, from_game));

    let autopilot = (!args.no_autopilot).then(Autopilot::default);
    let client = GameClient::new(to_server, autopilot, args.auto_start);
    run_frame_loop(client, from_server, args.frame_rate).await
}
