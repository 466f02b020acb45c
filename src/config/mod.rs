//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config source named on the command line
//!     → loader.rs (resolve name, parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → OpConfig (validated, immutable)
//!     → consumed once by the startup sequence
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload
//! - Required sections have no defaults so a missing one fails at parse time
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, resolve_config_path, ConfigError};
pub use schema::{
    CookieDealerConfig, CookieDefaults, EndpointConfig, EndpointKind, KeyJarConfig, KeySpec,
    OpConfig, ServerInfoConfig, WebserverConfig,
};
pub use validation::{validate_config, ValidationError};
