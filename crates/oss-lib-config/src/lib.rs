//! Configuration bootstrap for services.
//!
//! Resolves config sources from `{PREFIX}_*` environment variables and
//! command-line flags, sets up logging, deep-merges in-code defaults with a
//! YAML config file, validates the result against a schema fragment and
//! publishes it as read-only process-wide state.

mod error;
mod loader;
pub mod logging;
mod model;
mod published;
pub mod sources;

/// Public error type returned by config loading and validation APIs.
pub use error::ConfigError;
/// Loader, pipeline stages and helpers.
pub use loader::{
    ConfigLoader, load_config_file, merge, merge_values, required_properties, setup_config,
    validate_config, yaml_load,
};
/// Logging bootstrap.
pub use logging::{LoggingConfig, setup_logging};
/// Mapping and schema models.
pub use model::*;
/// Published configuration access.
pub use published::{Config, published};
/// Source resolution.
pub use sources::{ResolvedSources, check_service_prefix, parse_args, register_arguments};
