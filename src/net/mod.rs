//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! webserver config + -t flag
//!     → listener.rs (port resolution, TLS material paths, bind)
//!     → tls.rs (PEM checks, rustls server config)
//!     → handed to the HTTP layer
//! ```
//!
//! # Design Decisions
//! - All TLS problems surface before the socket is bound
//! - TLS is optional and handled transparently

pub mod listener;
pub mod tls;

pub use listener::{resolve_port, ListenerSettings, TlsMaterial};
pub use tls::{load_tls_config, read_tls_material, ServedPem, TlsError};
