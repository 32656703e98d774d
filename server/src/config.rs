use anyhow::{Context, Result};
use quinn::ServerConfig;
use tracing_subscriber::EnvFilter;

use common::config::{TlsFiles, quic_server_config};

// ============================================================================
// Connection Configuration
// ============================================================================

pub fn configure_server(tls: &TlsFiles) -> Result<ServerConfig> {
    let crypto = rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(tls.certificate_chain()?, tls.private_key()?)
        .context("failed to configure TLS")?;

    quic_server_config(crypto)
}

// ============================================================================
// Logging
// ============================================================================

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}
