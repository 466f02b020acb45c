//! The provider context shared with every endpoint.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::config::ServerInfoConfig;
use crate::cookies::CookieDealer;
use crate::endpoint::{Endpoint, EndpointRegistry, RegistryError};
use crate::keys::KeyStore;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("endpoint registry: {0}")]
    Registry(#[from] RegistryError),

    #[error("outbound HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Issuer identity, key material, cookie dealer, outbound client and the
/// endpoint registry, built once before the listener starts.
#[derive(Debug)]
pub struct ProviderContext {
    issuer: String,
    keys: KeyStore,
    cookies: CookieDealer,
    registry: EndpointRegistry,
    http_client: reqwest::Client,
    verify_ssl: bool,
    cwd: PathBuf,
}

impl ProviderContext {
    /// Assemble the context. `verify_ssl` only governs the outbound client.
    pub fn new(
        server_info: &ServerInfoConfig,
        keys: KeyStore,
        cookies: CookieDealer,
        verify_ssl: bool,
        cwd: &Path,
    ) -> Result<Self, ProviderError> {
        let registry = EndpointRegistry::from_config(&server_info.issuer, &server_info.endpoint)?;

        let http_client = reqwest::Client::builder()
            .danger_accept_invalid_certs(!verify_ssl)
            .build()?;
        if !verify_ssl {
            tracing::warn!("Outbound TLS certificate verification disabled");
        }

        tracing::info!(
            issuer = %server_info.issuer,
            endpoints = registry.len(),
            "Provider context initialized"
        );

        Ok(Self {
            issuer: server_info.issuer.clone(),
            keys,
            cookies,
            registry,
            http_client,
            verify_ssl,
            cwd: cwd.to_path_buf(),
        })
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn keys(&self) -> &KeyStore {
        &self.keys
    }

    pub fn cookies(&self) -> &CookieDealer {
        &self.cookies
    }

    pub fn registry(&self) -> &EndpointRegistry {
        &self.registry
    }

    /// Client for calls the provider makes to other parties.
    pub fn http_client(&self) -> &reqwest::Client {
        &self.http_client
    }

    pub fn verify_ssl(&self) -> bool {
        self.verify_ssl
    }

    /// Working directory the provider was started from.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Install a collaborator's handler in place of endpoint `name`.
    pub fn install_endpoint(
        &mut self,
        name: &str,
        handler: Arc<dyn Endpoint>,
    ) -> Result<(), ProviderError> {
        self.registry.install(name, handler)?;
        Ok(())
    }
}
