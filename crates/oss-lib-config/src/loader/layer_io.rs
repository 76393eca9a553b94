//! IO helpers for reading YAML config layers from disk.

use crate::{ConfigError, ConfigMapping};
use log::{debug, error, info};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Resolve and load the file layer.
///
/// An explicit `config_path` must exist. The default path is only read when
/// it exists; otherwise there is no file layer.
pub fn load_config_file(
    config_path: Option<&Path>,
    default_config_path: Option<&Path>,
) -> Result<Option<ConfigMapping>, ConfigError> {
    if let Some(path) = config_path {
        info!("configuration file was specified: {}", path.display());
        return yaml_load(path);
    }
    match default_config_path {
        Some(path) if path.exists() => {
            info!(
                "trying to read default configuration file: {}",
                path.display()
            );
            yaml_load(path)
        }
        Some(path) => {
            debug!(
                "default configuration file missing (path={})",
                path.display()
            );
            Ok(None)
        }
        None => Ok(None),
    }
}

/// Load a YAML document whose top level is a mapping.
///
/// An empty document yields `None`.
pub fn yaml_load(path: &Path) -> Result<Option<ConfigMapping>, ConfigError> {
    match read_yaml(path)? {
        Value::Null => {
            debug!("configuration file is empty (path={})", path.display());
            Ok(None)
        }
        Value::Object(map) => Ok(Some(map)),
        _ => {
            error!(
                "configuration file does not contain a mapping: {}",
                path.display()
            );
            Err(ConfigError::Malformed {
                path: path.to_path_buf(),
                message: "expected a mapping at the top level".to_string(),
            })
        }
    }
}

/// Read and parse any YAML document, logging failures before returning them.
pub(crate) fn read_yaml(path: &Path) -> Result<Value, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| {
        error!("could not read content from {}: {}", path.display(), source);
        ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        }
    })?;
    serde_yaml::from_str(&contents).map_err(|source| {
        error!(
            "could not parse YAML content from {}: {}",
            path.display(),
            source
        );
        ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        }
    })
}
