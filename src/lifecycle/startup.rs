//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems from a loaded configuration in dependency order
//! - Prepare listener settings and TLS material
//! - Bind the listener last and serve
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Nothing binds a socket until every subsystem is ready

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::cli::Cli;
use crate::config::{ConfigError, OpConfig};
use crate::cookies::{CookieDealer, CookieError, SessionStore};
use crate::http::{HttpServer, StaticAssets, DEFAULT_REQUEST_TIMEOUT};
use crate::keys::{init_key_store, KeyError};
use crate::net::{load_tls_config, ListenerSettings, TlsError};
use crate::provider::{ProviderContext, ProviderError};

/// Static assets directory under the working directory.
pub const PUBLIC_DIR: &str = "public";

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("key store: {0}")]
    Keys(#[from] KeyError),

    #[error("cookie dealer: {0}")]
    Cookies(#[from] CookieError),

    #[error("provider: {0}")]
    Provider(#[from] ProviderError),

    #[error("tls: {0}")]
    Tls(#[from] TlsError),

    #[error("listener: {0}")]
    Listener(#[from] std::io::Error),
}

/// Everything needed to serve, built but not yet listening.
pub struct Bootstrap {
    provider: Arc<ProviderContext>,
    listener: ListenerSettings,
    assets: StaticAssets,
    sessions: SessionStore,
    request_timeout: Duration,
}

impl Bootstrap {
    /// Build every subsystem from `config`.
    ///
    /// Relative paths in the configuration resolve against `cwd`.
    pub fn prepare(config: &OpConfig, cli: &Cli, cwd: &Path) -> Result<Self, StartupError> {
        let server_info = &config.server_info;

        let keys = init_key_store(&server_info.issuer, &server_info.jwks, cwd)?;
        let cookies = CookieDealer::new(&server_info.cookie_dealer)?;
        let provider = ProviderContext::new(server_info, keys, cookies, cli.verify_ssl(), cwd)?;

        let listener = ListenerSettings::resolve(&config.webserver, cli.tls, cwd)?;
        let tls = listener.tls.is_some();

        let public_dir = config
            .webserver
            .public_dir
            .as_ref()
            .map(|dir| cwd.join(dir))
            .unwrap_or_else(|| cwd.join(PUBLIC_DIR));

        let request_timeout = config
            .webserver
            .request_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT);

        tracing::info!(
            scheme = listener.scheme(),
            port = listener.addr.port(),
            public_dir = %public_dir.display(),
            "Startup prepared"
        );

        Ok(Self {
            provider: Arc::new(provider),
            listener,
            assets: StaticAssets::new(public_dir),
            sessions: SessionStore::default().with_secure_cookie(tls),
            request_timeout,
        })
    }

    pub fn provider(&self) -> &Arc<ProviderContext> {
        &self.provider
    }

    /// Mutable access for installing endpoint handlers. `None` once a
    /// server built from this bootstrap still holds the context.
    pub fn provider_mut(&mut self) -> Option<&mut ProviderContext> {
        Arc::get_mut(&mut self.provider)
    }

    pub fn listener(&self) -> &ListenerSettings {
        &self.listener
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn public_dir(&self) -> PathBuf {
        self.assets.dir().to_path_buf()
    }

    /// The HTTP server over the prepared subsystems.
    pub fn server(&self) -> HttpServer {
        HttpServer::new(
            Arc::clone(&self.provider),
            &self.assets,
            self.sessions.clone(),
            self.request_timeout,
        )
    }

    /// Load TLS material if requested, bind, and serve until shutdown.
    ///
    /// Expired sessions are swept in the background while serving.
    pub async fn serve(self) -> Result<(), StartupError> {
        let tls = match &self.listener.tls {
            Some(material) => Some(load_tls_config(material).await?),
            None => None,
        };
        let server = self.server();

        let sweeper = self.sessions.spawn_sweeper();
        let result = server.run(&self.listener, tls).await;
        sweeper.abort();

        result?;
        Ok(())
    }
}

/// Prepare and serve; returns once the server has shut down.
pub async fn run(config: &OpConfig, cli: &Cli, cwd: &Path) -> Result<(), StartupError> {
    Bootstrap::prepare(config, cli, cwd)?.serve().await
}
