//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields
//!
//! Consumers (logging.rs):
//!     → stdout (RUST_LOG filter)
//!     → op.log, error.log, access.log
//! ```
//!
//! # Design Decisions
//! - One subscriber, installed once by the binary
//! - Request ID flows through access lines and request spans

pub mod logging;

pub use logging::{init_logging, LogFiles, LoggingError, ACCESS_TARGET};
