//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::OpConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration source {0:?} not found")]
    NotFound(String),

    #[error("IO error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Resolve the configuration source named on the command line.
///
/// An existing file is used as given; otherwise `<name>.toml` is tried.
pub fn resolve_config_path(name: &str) -> Result<PathBuf, ConfigError> {
    let direct = PathBuf::from(name);
    if direct.is_file() {
        return Ok(direct);
    }

    let with_ext = PathBuf::from(format!("{name}.toml"));
    if with_ext.is_file() {
        return Ok(with_ext);
    }

    Err(ConfigError::NotFound(name.to_string()))
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<OpConfig, ConfigError> {
    let config: OpConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<OpConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let config = parse_config(&content)?;

    tracing::debug!(path = %path.display(), "Configuration parsed");
    Ok(config)
}
