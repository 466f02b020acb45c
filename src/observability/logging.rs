//! Structured logging.
//!
//! # Responsibilities
//! - Open the provider's log files
//! - Build one subscriber with a console layer and one layer per file
//! - Install it once, at process entry
//!
//! # Files
//! - `op.log`: everything the provider logs at debug and above
//! - `error.log`: warnings and errors from any component
//! - `access.log`: one line per HTTP request

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const OP_LOG: &str = "op.log";
pub const ERROR_LOG: &str = "error.log";
pub const ACCESS_LOG: &str = "access.log";

/// Target used by the access log middleware.
pub const ACCESS_TARGET: &str = "access";

const DEFAULT_CONSOLE_FILTER: &str = "op_server=info,tower_http=info,access=info";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("cannot open log file {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("logging already initialized: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// The log files of one provider process, opened for appending.
#[derive(Debug)]
pub struct LogFiles {
    dir: PathBuf,
    op: File,
    error: File,
    access: File,
}

impl LogFiles {
    /// Open (creating if needed) the three log files in `dir`.
    pub fn open(dir: &Path) -> Result<Self, LoggingError> {
        fs::create_dir_all(dir).map_err(|source| LoggingError::Open {
            path: dir.to_path_buf(),
            source,
        })?;
        Ok(Self {
            dir: dir.to_path_buf(),
            op: open_append(&dir.join(OP_LOG))?,
            error: open_append(&dir.join(ERROR_LOG))?,
            access: open_append(&dir.join(ACCESS_LOG))?,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn open_append(path: &Path) -> Result<File, LoggingError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LoggingError::Open {
            path: path.to_path_buf(),
            source,
        })
}

/// Install the global subscriber. `RUST_LOG` overrides the console filter.
pub fn init_logging(files: LogFiles) -> Result<(), LoggingError> {
    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_CONSOLE_FILTER));
    let console = fmt::layer().with_filter(console_filter);

    let op = fmt::layer()
        .with_ansi(false)
        .with_writer(Arc::new(files.op))
        .with_filter(
            Targets::new()
                .with_target("op_server", Level::DEBUG)
                .with_target(ACCESS_TARGET, LevelFilter::OFF)
                .with_default(Level::INFO),
        );

    let error = fmt::layer()
        .with_ansi(false)
        .with_writer(Arc::new(files.error))
        .with_filter(LevelFilter::WARN);

    let access = fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_level(false)
        .with_writer(Arc::new(files.access))
        .with_filter(Targets::new().with_target(ACCESS_TARGET, Level::INFO));

    tracing_subscriber::registry()
        .with(console)
        .with(op)
        .with(error)
        .with(access)
        .try_init()?;

    tracing::debug!(dir = %files.dir.display(), "Logging initialized");
    Ok(())
}
