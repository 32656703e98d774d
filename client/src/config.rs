use anyhow::{Context, Result};
use quinn::ClientConfig;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use common::config::{TlsFiles, quic_client_config};

// ============================================================================
// Connection Configuration
// ============================================================================

// The relay's own certificate is the only trusted root
pub fn configure_client(cert: &Path) -> Result<ClientConfig> {
    let tls = TlsFiles {
        cert: cert.to_path_buf(),
        ..TlsFiles::default()
    };
    let mut roots = rustls::RootCertStore::empty();
    for cert in tls.certificate_chain()? {
        roots.add(cert).context("failed to add certificate to root store")?;
    }

    let crypto = rustls::ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();

    quic_client_config(crypto)
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
