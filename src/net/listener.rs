//! Listener settings derived from the command line and configuration.
//!
//! # Responsibilities
//! - Resolve the listen port (explicit, else 443 for TLS, else 80)
//! - Collect TLS material paths when TLS is requested
//! - Bind the plaintext socket
//!
//! # Design Decisions
//! - Always binds every interface (`0.0.0.0`)
//! - Missing TLS material is detected here, before any socket exists

use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use tokio::net::TcpListener;

use crate::config::WebserverConfig;
use crate::net::tls::TlsError;

pub const DEFAULT_HTTP_PORT: u16 = 80;
pub const DEFAULT_HTTPS_PORT: u16 = 443;
pub const BIND_HOST: Ipv4Addr = Ipv4Addr::UNSPECIFIED;

/// Paths of the certificate material served over TLS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsMaterial {
    pub cert: PathBuf,
    pub key: PathBuf,
    pub chain: Option<PathBuf>,
}

/// Where and how to listen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerSettings {
    pub addr: SocketAddr,
    pub tls: Option<TlsMaterial>,
}

/// Explicit port wins; otherwise the scheme default.
pub fn resolve_port(configured: Option<u16>, tls: bool) -> u16 {
    match (configured, tls) {
        (Some(port), _) => port,
        (None, true) => DEFAULT_HTTPS_PORT,
        (None, false) => DEFAULT_HTTP_PORT,
    }
}

impl ListenerSettings {
    /// Derive settings; relative TLS paths resolve against `base_dir`.
    pub fn resolve(web: &WebserverConfig, tls: bool, base_dir: &Path) -> Result<Self, TlsError> {
        let port = resolve_port(web.port, tls);

        let tls = if tls {
            let cert = web.cert.as_ref().ok_or(TlsError::MissingCertificate)?;
            let key = web.key.as_ref().ok_or(TlsError::MissingKey)?;
            let chain = web
                .cert_chain
                .as_ref()
                .filter(|p| !p.as_os_str().is_empty())
                .map(|p| base_dir.join(p));
            Some(TlsMaterial {
                cert: base_dir.join(cert),
                key: base_dir.join(key),
                chain,
            })
        } else {
            None
        };

        Ok(Self {
            addr: SocketAddr::new(BIND_HOST.into(), port),
            tls,
        })
    }

    pub fn scheme(&self) -> &'static str {
        if self.tls.is_some() {
            "https"
        } else {
            "http"
        }
    }

    /// Bind the plaintext listener.
    pub async fn bind(&self) -> std::io::Result<TcpListener> {
        let listener = TcpListener::bind(self.addr).await?;
        tracing::info!(address = %listener.local_addr()?, "Listener bound");
        Ok(listener)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn web(port: Option<u16>, cert: Option<&str>, key: Option<&str>) -> WebserverConfig {
        WebserverConfig {
            port,
            cert: cert.map(PathBuf::from),
            key: key.map(PathBuf::from),
            ..WebserverConfig::default()
        }
    }

    #[test]
    fn explicit_port_ignores_tls_flag() {
        for tls in [false, true] {
            let settings =
                ListenerSettings::resolve(&web(Some(8443), Some("c"), Some("k")), tls, Path::new("."))
                    .unwrap();
            assert_eq!(settings.addr.port(), 8443);
        }
    }

    #[test]
    fn default_ports() {
        assert_eq!(resolve_port(None, true), 443);
        assert_eq!(resolve_port(None, false), 80);
        assert_eq!(resolve_port(Some(9000), true), 9000);
    }

    #[test]
    fn binds_all_interfaces() {
        let settings = ListenerSettings::resolve(&web(None, None, None), false, Path::new("."))
            .unwrap();
        assert_eq!(settings.addr.ip(), std::net::IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(settings.scheme(), "http");
        assert!(settings.tls.is_none());
    }

    #[test]
    fn tls_requires_cert_and_key() {
        let base = Path::new("/srv/op");
        assert!(matches!(
            ListenerSettings::resolve(&web(None, None, Some("k")), true, base),
            Err(TlsError::MissingCertificate)
        ));
        assert!(matches!(
            ListenerSettings::resolve(&web(None, Some("c"), None), true, base),
            Err(TlsError::MissingKey)
        ));
        // Without -t the material is irrelevant.
        assert!(ListenerSettings::resolve(&web(None, None, None), false, base).is_ok());
    }

    #[test]
    fn empty_chain_is_ignored() {
        let mut config = web(None, Some("cert.pem"), Some("key.pem"));
        config.cert_chain = Some(PathBuf::new());
        let settings = ListenerSettings::resolve(&config, true, Path::new("/srv/op")).unwrap();
        let tls = settings.tls.unwrap();
        assert_eq!(tls.cert, PathBuf::from("/srv/op/cert.pem"));
        assert!(tls.chain.is_none());
        assert_eq!(settings.addr.port(), 443);
    }
}
