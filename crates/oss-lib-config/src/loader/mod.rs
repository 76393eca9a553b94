//! Layered configuration loader.
//!
//! Merges in-code defaults with an optional YAML file, validates the result
//! against a schema fragment, and publishes it as the process-wide config.

mod layer_io;
mod merge;
mod schema;


use crate::logging::setup_logging;
use crate::sources::{ResolvedSources, parse_args, parse_args_from};
use crate::{Config, ConfigError, ConfigMapping, SchemaFragment};
use clap::{ArgMatches, Command};
use log::{debug, info};
use serde_json::Value;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub(crate) use layer_io::read_yaml;
pub use layer_io::{load_config_file, yaml_load};
pub use merge::{merge, merge_values};
pub use schema::{required_properties, validate_config};

/// Builder describing how a service assembles its configuration.
///
/// Layer precedence (low -> high): `defaults`, then the config file (the
/// explicit path, or `default_config_path` when it exists).
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    /// In-code defaults; never modified by loading.
    pub defaults: ConfigMapping,
    /// File read when no explicit config path is given and it exists.
    pub default_config_path: Option<PathBuf>,
    /// Declarations for the allowed top-level keys.
    pub schema: Option<SchemaFragment>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults(mut self, defaults: ConfigMapping) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_default_config_path(mut self, path: impl AsRef<Path>) -> Self {
        self.default_config_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_schema(mut self, schema: SchemaFragment) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Keys declared by the schema that have no default value.
    pub fn required_properties(&self) -> Vec<String> {
        match &self.schema {
            Some(schema) => required_properties(Some(&self.defaults), schema),
            None => Vec::new(),
        }
    }

    /// Merge and validate without touching logging or the published slot.
    pub fn load(&self, sources: &ResolvedSources) -> Result<Config, ConfigError> {
        let loaded = load_config_file(
            sources.config_path.as_deref(),
            self.default_config_path.as_deref(),
        )?;
        let config = match &loaded {
            Some(loaded) => merge(&self.defaults, loaded),
            None => self.defaults.clone(),
        };
        debug!(
            "merged configuration (defaults={}, file_layer={}, keys={})",
            self.defaults.len(),
            loaded.is_some(),
            config.len()
        );

        if sources.debug {
            log_config(
                &config,
                sources.config_path.as_deref(),
                self.default_config_path.as_deref(),
            );
        }

        validate_config(&config, self.schema.as_ref())?;
        Ok(Config::new(config))
    }

    /// Configure logging, load, validate and publish.
    pub fn setup(&self, sources: &ResolvedSources) -> Result<Config, ConfigError> {
        setup_logging(sources.log_config_path.as_deref(), sources.debug)?;
        let config = self.load(sources)?;
        config.publish();
        info!("configuration published (keys={})", config.len());
        Ok(config)
    }

    /// Resolve sources from `{PREFIX}_*` environment variables, then setup.
    pub fn process_env(&self, service_prefix: &str) -> Result<Config, ConfigError> {
        let sources = ResolvedSources::from_env(service_prefix)?;
        self.setup(&sources)
    }

    /// Parse process arguments over the environment, then setup.
    ///
    /// `command` may carry the caller's own arguments; the returned matches
    /// include them.
    pub fn process_args(
        &self,
        service_prefix: &str,
        command: Option<Command>,
    ) -> Result<(Config, ArgMatches), ConfigError> {
        let (matches, sources) = parse_args(service_prefix, command)?;
        Ok((self.setup(&sources)?, matches))
    }

    /// Like [`ConfigLoader::process_args`] with explicit arguments.
    pub fn process_args_from<I, T>(
        &self,
        service_prefix: &str,
        command: Option<Command>,
        args: I,
    ) -> Result<(Config, ArgMatches), ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let (matches, sources) = parse_args_from(service_prefix, command, args, |name| {
            std::env::var_os(name)
        })?;
        Ok((self.setup(&sources)?, matches))
    }
}

/// Run the full start-up pipeline for already resolved sources.
pub fn setup_config(
    loader: &ConfigLoader,
    sources: &ResolvedSources,
) -> Result<Config, ConfigError> {
    loader.setup(sources)
}

/// Dump the merged configuration at DEBUG level, one line per YAML line.
fn log_config(config: &ConfigMapping, config_path: Option<&Path>, default_config_path: Option<&Path>) {
    debug!(
        "configuration files: config_path={:?}, default_config_path={:?}",
        config_path, default_config_path
    );
    debug!("content of the configuration:");
    match serde_yaml::to_string(&Value::Object(config.clone())) {
        Ok(content) => {
            for line in content.lines() {
                debug!("{line}");
            }
        }
        Err(err) => debug!("could not render configuration as YAML: {err}"),
    }
}
