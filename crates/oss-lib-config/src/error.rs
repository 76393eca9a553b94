//! Error types for config loading and validation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors returned while resolving, loading or validating config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The service prefix does not match `^[A-Z][A-Z0-9_]*$`.
    #[error(
        "incorrect service prefix \"{0}\": must start with an uppercase letter and contain only uppercase letters, digits and underscores"
    )]
    InvalidPrefix(String),
    /// Reading a config or logging config file failed.
    #[error("could not read {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Parsing YAML content failed.
    #[error("could not parse YAML content from {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    /// A YAML document parsed but does not have the expected shape.
    #[error("unexpected content in {}: {message}", path.display())]
    Malformed { path: PathBuf, message: String },
    /// The merged config violates the validation schema.
    #[error("invalid config at {path}: {message}")]
    Validation { path: String, message: String },
    /// A schema descriptor could not be interpreted.
    #[error("invalid schema at {path}: {message}")]
    InvalidSchema { path: String, message: String },
    /// A key was looked up in the published config but is absent.
    #[error("missing config key: {0}")]
    MissingKey(String),
    /// Logging could not be configured.
    #[error("failed to configure logging: {0}")]
    Logging(String),
    /// Command-line parsing failed.
    #[error(transparent)]
    Cli(#[from] clap::Error),
    /// Converting JSON values into a typed config failed.
    #[error("failed to decode config: {0}")]
    Decode(#[from] serde_json::Error),
}
