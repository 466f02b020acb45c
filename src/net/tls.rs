//! TLS configuration and certificate loading.

use std::io::BufReader;
use std::path::{Path, PathBuf};

use axum_server::tls_rustls::RustlsConfig;
use thiserror::Error;

use crate::net::listener::TlsMaterial;

#[derive(Debug, Error)]
pub enum TlsError {
    #[error("TLS requested but webserver.cert is not configured")]
    MissingCertificate,

    #[error("TLS requested but webserver.key is not configured")]
    MissingKey,

    #[error("cannot read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no PEM certificates found in {0:?}")]
    NoCertificates(PathBuf),

    #[error("no PEM private key found in {0:?}")]
    NoPrivateKey(PathBuf),

    #[error("invalid TLS configuration: {0}")]
    Config(#[source] std::io::Error),
}

async fn read(path: &Path) -> Result<Vec<u8>, TlsError> {
    tokio::fs::read(path).await.map_err(|source| TlsError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn count_certificates(pem: &[u8], path: &Path) -> Result<usize, TlsError> {
    let mut reader = BufReader::new(pem);
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| TlsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    if certs.is_empty() {
        return Err(TlsError::NoCertificates(path.to_path_buf()));
    }
    Ok(certs.len())
}

fn check_private_key(pem: &[u8], path: &Path) -> Result<(), TlsError> {
    let mut reader = BufReader::new(pem);
    match rustls_pemfile::private_key(&mut reader) {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err(TlsError::NoPrivateKey(path.to_path_buf())),
        Err(source) => Err(TlsError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// PEM material as handed to rustls: leaf first, then any chain certificates.
#[derive(Debug, Clone)]
pub struct ServedPem {
    pub cert_chain: Vec<u8>,
    pub key: Vec<u8>,
    pub certificates: usize,
}

/// Read and check certificate, optional chain and key.
///
/// The chain file's certificates are served after the leaf certificate.
pub async fn read_tls_material(material: &TlsMaterial) -> Result<ServedPem, TlsError> {
    let mut cert_chain = read(&material.cert).await?;
    let mut certificates = count_certificates(&cert_chain, &material.cert)?;

    if let Some(chain_path) = &material.chain {
        let chain_pem = read(chain_path).await?;
        certificates += count_certificates(&chain_pem, chain_path)?;
        if !cert_chain.ends_with(b"\n") {
            cert_chain.push(b'\n');
        }
        cert_chain.extend_from_slice(&chain_pem);
    }

    let key = read(&material.key).await?;
    check_private_key(&key, &material.key)?;

    Ok(ServedPem {
        cert_chain,
        key,
        certificates,
    })
}

/// Load certificate, optional chain and key into a rustls server config.
pub async fn load_tls_config(material: &TlsMaterial) -> Result<RustlsConfig, TlsError> {
    let pem = read_tls_material(material).await?;

    tracing::info!(
        cert = %material.cert.display(),
        certificates = pem.certificates,
        "TLS material loaded"
    );

    RustlsConfig::from_pem(pem.cert_chain, pem.key)
        .await
        .map_err(TlsError::Config)
}
