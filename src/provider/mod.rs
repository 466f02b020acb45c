//! The OpenID provider mounted at `/`.

pub mod context;
pub mod dispatch;

pub use context::{ProviderContext, ProviderError};
pub use dispatch::provider_handler;
