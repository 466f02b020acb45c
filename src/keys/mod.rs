//! Issuer key material.
//!
//! # Data Flow
//! ```text
//! server_info.jwks (key_defs, private_path, public_path, read_only)
//!     → store.rs (load existing private JWKS or generate)
//!     → jwk.rs (JWK encoding, thumbprint kids)
//!     → KeyStore bound to the issuer, shared read-only
//! ```
//!
//! # Design Decisions
//! - Any key material problem is fatal at startup
//! - Key ids are RFC 7638 thumbprints
//! - Symmetric keys never leave the process in public exports

pub mod jwk;
pub mod store;

use std::path::PathBuf;

use thiserror::Error;

pub use jwk::{Jwk, JwkSet, Key, KeyKind};
pub use store::{init_key_store, KeyBundle, KeyStore};

/// Errors raised while building the key store.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("no key definitions given")]
    NoKeyDefs,

    #[error("unsupported key type {0:?}")]
    UnsupportedKeyType(String),

    #[error("unsupported curve {0:?}")]
    UnsupportedCurve(String),

    #[error("invalid key use {0:?}")]
    InvalidUse(String),

    #[error("invalid symmetric key size: {0} bytes")]
    InvalidSize(usize),

    #[error("malformed key: {0}")]
    Malformed(String),

    #[error("key file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("key file {path:?} is not a valid JWKS: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
