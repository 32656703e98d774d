use anyhow::{Context, Result, bail};
use quinn::TransportConfig;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};
use tracing::debug;

// ============================================================================
// Constants
// ============================================================================

// Peers silent this long are dropped by QUIC itself, ahead of the relay's own purge
const QUIC_IDLE_TIMEOUT: Duration = Duration::from_secs(10);
const QUIC_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(2);

pub const ALPN_PROTOCOL: &[u8] = b"racer";
pub const DEFAULT_CERT_FILE: &str = "cert.pem";
pub const DEFAULT_KEY_FILE: &str = "key.pem";

// ============================================================================
// TLS Material
// ============================================================================

/// PEM files for the relay's certificate chain and private key. Clients only read the chain,
/// which they trust as their root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsFiles {
    pub cert: PathBuf,
    pub key: PathBuf,
}

impl Default for TlsFiles {
    fn default() -> Self {
        Self {
            cert: PathBuf::from(DEFAULT_CERT_FILE),
            key: PathBuf::from(DEFAULT_KEY_FILE),
        }
    }
}

impl TlsFiles {
    pub fn certificate_chain(&self) -> Result<Vec<CertificateDer<'static>>> {
        let pem = read_pem(&self.cert)?;
        let chain = rustls_pemfile::certs(&mut pem.as_slice())
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("failed to parse certificates in {}", self.cert.display()))?;
        if chain.is_empty() {
            bail!("no certificates found in {}", self.cert.display());
        }
        debug!(path = %self.cert.display(), certs = chain.len(), "loaded certificate chain");
        Ok(chain)
    }

    pub fn private_key(&self) -> Result<PrivateKeyDer<'static>> {
        let pem = read_pem(&self.key)?;
        rustls_pemfile::private_key(&mut pem.as_slice())
            .with_context(|| format!("failed to parse private key in {}", self.key.display()))?
            .with_context(|| format!("no private key found in {}", self.key.display()))
    }
}

fn read_pem(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

// ============================================================================
// QUIC Configuration
// ============================================================================

fn transport() -> Result<Arc<TransportConfig>> {
    let mut transport = TransportConfig::default();
    transport.max_idle_timeout(Some(QUIC_IDLE_TIMEOUT.try_into().context("invalid idle timeout")?));
    transport.keep_alive_interval(Some(QUIC_KEEPALIVE_INTERVAL));
    Ok(Arc::new(transport))
}

/// Wrap a rustls client config for QUIC, with the game's ALPN and shared transport settings.
pub fn quic_client_config(mut crypto: rustls::ClientConfig) -> Result<quinn::ClientConfig> {
    crypto.alpn_protocols = vec![ALPN_PROTOCOL.to_vec()];
    let crypto =
        quinn::crypto::rustls::QuicClientConfig::try_from(crypto).context("failed to create QUIC client config")?;
    let mut config = quinn::ClientConfig::new(Arc::new(crypto));
    config.transport_config(transport()?);
    Ok(config)
}

/// Wrap a rustls server config for QUIC, with the game's ALPN and shared transport settings.
pub fn quic_server_config(mut crypto: rustls::ServerConfig) -> Result<quinn::ServerConfig> {
    crypto.alpn_protocols = vec![ALPN_PROTOCOL.to_vec()];
    let crypto =
        quinn::crypto::rustls::QuicServerConfig::try_from(crypto).context("failed to create QUIC server config")?;
    let mut config = quinn::ServerConfig::with_crypto(Arc::new(crypto));
    config.transport_config(transport()?);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("racer-{}-{name}", std::process::id()));
        std::fs::write(&path, contents).expect("write scratch file");
        path
    }

    #[test]
    fn default_files_sit_in_the_working_directory() {
        let files = TlsFiles::default();
        assert_eq!(files.cert, PathBuf::from("cert.pem"));
        assert_eq!(files.key, PathBuf::from("key.pem"));
    }

    #[test]
    fn missing_file_names_the_path() {
        let files = TlsFiles {
            cert: std::env::temp_dir().join("racer-absent-cert.pem"),
            key: std::env::temp_dir().join("racer-absent-key.pem"),
        };
        let err = files.certificate_chain().expect_err("cert should be missing");
        assert!(format!("{err:#}").contains("racer-absent-cert.pem"));
        let err = files.private_key().expect_err("key should be missing");
        assert!(format!("{err:#}").contains("racer-absent-key.pem"));
    }

    #[test]
    fn files_without_pem_sections_are_rejected() {
        let path = scratch_file("empty.pem", "no pem sections here\n");
        let files = TlsFiles {
            cert: path.clone(),
            key: path.clone(),
        };
        let cert_err = files.certificate_chain().expect_err("no certificates");
        let key_err = files.private_key().expect_err("no key");
        let _ = std::fs::remove_file(&path);
        assert!(format!("{cert_err:#}").contains("no certificates found"));
        assert!(format!("{key_err:#}").contains("no private key found"));
    }

    #[test]
    fn transport_keeps_peers_alive_within_the_idle_timeout() {
        assert!(QUIC_KEEPALIVE_INTERVAL < QUIC_IDLE_TIMEOUT);
        assert!(transport().is_ok());
    }
}
