//! Print the merged configuration of a service as JSON.
//!
//! Sources are resolved like any service using oss-lib: `--config-file`,
//! `--log-config-file` and `--debug`, falling back to `{PREFIX}_CONF`,
//! `{PREFIX}_LOG_CONF` and `{PREFIX}_DEBUG`.

use anyhow::{Context, bail};
use clap::{Arg, Command};
use log::info;
use oss_lib::config::{SchemaFragment, parse_args, yaml_load};
use oss_lib::{ConfigError, ConfigLoader};
use serde_json::Value;
use std::path::{Path, PathBuf};

const DEFAULT_PREFIX: &str = "OSS_CONFIG";

fn cli() -> Command {
    Command::new("oss-config")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Load, validate and print a layered service configuration")
        .arg(
            Arg::new("defaults")
                .long("defaults")
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf))
                .help("YAML file holding the in-code defaults"),
        )
        .arg(
            Arg::new("schema")
                .long("schema")
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf))
                .help("JSON file holding the schema fragment"),
        )
        .arg(
            Arg::new("default_config_path")
                .long("default-config-path")
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Config file read when no explicit path is given"),
        )
}

fn load_schema(path: &Path) -> anyhow::Result<SchemaFragment> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading schema {}", path.display()))?;
    let value: Value = serde_json::from_str(&raw)
        .with_context(|| format!("parsing schema {}", path.display()))?;
    Ok(SchemaFragment::from_value(&value)?)
}

fn main() -> anyhow::Result<()> {
    let prefix = std::env::var("OSS_CONFIG_PREFIX").unwrap_or_else(|_| DEFAULT_PREFIX.to_string());
    let (matches, sources) = match parse_args(&prefix, Some(cli())) {
        Ok(parsed) => parsed,
        // Help, version and usage errors are rendered by clap itself.
        Err(ConfigError::Cli(err)) => err.exit(),
        Err(err) => return Err(err.into()),
    };

    let mut loader = ConfigLoader::new();
    if let Some(path) = matches.get_one::<PathBuf>("defaults") {
        let Some(defaults) = yaml_load(path)? else {
            bail!("defaults file {} is empty", path.display());
        };
        loader = loader.with_defaults(defaults);
    }
    if let Some(path) = matches.get_one::<PathBuf>("schema") {
        loader = loader.with_schema(load_schema(path)?);
    }
    if let Some(path) = matches.get_one::<PathBuf>("default_config_path") {
        loader = loader.with_default_config_path(path);
    }

    let config = loader
        .setup(&sources)
        .with_context(|| format!("loading configuration for {prefix}"))?;
    info!("loaded {} top-level keys", config.len());
    println!("{}", serde_json::to_string_pretty(config.as_map())?);
    Ok(())
}
