//! Cookie security and session support.
//!
//! - dealer.rs: the provider's signed/encrypted cookies
//! - session.rs: per-client server-side sessions

pub mod dealer;
pub mod session;

use thiserror::Error;

pub use dealer::CookieDealer;
pub use session::{session_layer, Session, SessionStore, SESSION_COOKIE};

/// Minimum length of the secret cookie keys are derived from.
pub const MIN_SECRET_LEN: usize = 32;

/// Errors raised while building the cookie dealer.
#[derive(Debug, Error)]
pub enum CookieError {
    #[error("cookie secret is {0} bytes, at least {MIN_SECRET_LEN} required")]
    WeakSecret(usize),

    #[error("unsupported cookie signing algorithm {0:?}")]
    UnsupportedAlgorithm(String),

    #[error("default cookie name is empty")]
    EmptyName,
}
