//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → Key store → Cookie dealer → Provider context
//!         → Listener settings → Static assets → Bind → Serve
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```

pub mod signals;
pub mod startup;

pub use signals::shutdown_signal;
pub use startup::{run, Bootstrap, StartupError};
