//! OpenID Connect provider server.
//!
//! # Architecture Overview
//!
//! ```text
//!     cli ──▶ config ──▶ keys ──▶ cookies ──▶ provider (endpoint registry)
//!                                                   │
//!     Client Request                                ▼
//!     ──────────▶ net (listener, TLS) ──▶ http (router, middleware)
//!                                            ├── /public/* ──▶ static files
//!                                            └── /*        ──▶ endpoint by virtual path
//!
//!     Cross-cutting: observability (logging), lifecycle (startup, signals)
//! ```

// Core subsystems
pub mod cli;
pub mod config;
pub mod cookies;
pub mod endpoint;
pub mod keys;
pub mod provider;

// Serving
pub mod http;
pub mod net;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use cli::Cli;
pub use config::OpConfig;
pub use http::HttpServer;
pub use lifecycle::{Bootstrap, StartupError};
pub use provider::ProviderContext;
