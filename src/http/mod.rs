//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, access log)
//!     → /public/* → static_files.rs (files, MIME table, CORS)
//!     → anything else → provider dispatch by virtual path
//!     → response.rs (JSON bodies, error shapes)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;
pub mod static_files;

pub use request::X_REQUEST_ID;
pub use server::{HttpServer, DEFAULT_REQUEST_TIMEOUT};
pub use static_files::{ContentTypes, StaticAssets, PUBLIC_PREFIX};
