//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router: provider dispatch at `/`, static files at `/public`
//! - Wire up middleware (sessions, access log, timeout, request ID, tracing)
//! - Serve over plain TCP or TLS until a shutdown signal arrives

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderValue},
    middleware,
    routing::any,
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use tower_http::{
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::cookies::{session_layer, SessionStore};
use crate::http::request::{access_log, propagate_request_id_layer, set_request_id_layer};
use crate::http::static_files::{StaticAssets, PUBLIC_PREFIX};
use crate::lifecycle::signals::shutdown_signal;
use crate::net::ListenerSettings;
use crate::provider::{provider_handler, ProviderContext};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Time connections get to finish after a shutdown signal on the TLS path.
const TLS_DRAIN_PERIOD: Duration = Duration::from_secs(10);

/// HTTP server for the provider.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(
        provider: Arc<ProviderContext>,
        assets: &StaticAssets,
        sessions: SessionStore,
        request_timeout: Duration,
    ) -> Self {
        let router = Self::build_router(provider, assets, sessions, request_timeout);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(
        provider: Arc<ProviderContext>,
        assets: &StaticAssets,
        sessions: SessionStore,
        request_timeout: Duration,
    ) -> Router {
        // Sessions only wrap the dynamic routes; static files stay cookie free.
        Router::new()
            .route("/", any(provider_handler))
            .route("/{*path}", any(provider_handler))
            .with_state(provider)
            .layer(middleware::from_fn_with_state(sessions, session_layer))
            .nest_service(PUBLIC_PREFIX, assets.router())
            .layer(SetResponseHeaderLayer::if_not_present(
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ))
            .layer(middleware::from_fn(access_log))
            .layer(TimeoutLayer::new(request_timeout))
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer())
            .layer(TraceLayer::new_for_http())
    }

    /// The fully layered router, for serving or for driving in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Bind according to `settings` and serve until shutdown.
    ///
    /// `tls` must be present exactly when `settings` asks for TLS.
    pub async fn run(
        self,
        settings: &ListenerSettings,
        tls: Option<RustlsConfig>,
    ) -> Result<(), std::io::Error> {
        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        match tls {
            Some(tls) => {
                let handle = axum_server::Handle::new();
                let shutdown = handle.clone();
                tokio::spawn(async move {
                    shutdown_signal().await;
                    shutdown.graceful_shutdown(Some(TLS_DRAIN_PERIOD));
                });

                tracing::info!(address = %settings.addr, scheme = "https", "HTTP server starting");
                axum_server::bind_rustls(settings.addr, tls)
                    .handle(handle)
                    .serve(app)
                    .await?;
            }
            None => {
                let listener = settings.bind().await?;
                tracing::info!(address = %settings.addr, scheme = "http", "HTTP server starting");
                axum::serve(listener, app)
                    .with_graceful_shutdown(shutdown_signal())
                    .await?;
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
