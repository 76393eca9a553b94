//! Schema validation for the merged configuration.

use crate::{ConfigError, ConfigMapping, ObjectSchema, Schema, SchemaFragment};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Validate a merged config against the implicit root schema.
///
/// The root is an object whose properties are the fragment's declarations
/// and which rejects every undeclared top-level key. No `required` list is
/// derived for the root; see [`required_properties`].
pub fn validate_config(
    config: &ConfigMapping,
    fragment: Option<&SchemaFragment>,
) -> Result<(), ConfigError> {
    let empty = BTreeMap::new();
    let properties = fragment.map_or(&empty, SchemaFragment::properties);
    validate_properties(config, properties, &[], false, "")
}

/// Keys declared by the fragment that have no entry in `defaults`.
///
/// These must come from a config file for the service to be complete. The
/// result is informational and is not enforced by [`validate_config`].
pub fn required_properties(
    defaults: Option<&ConfigMapping>,
    fragment: &SchemaFragment,
) -> Vec<String> {
    fragment
        .properties()
        .keys()
        .filter(|key| defaults.is_none_or(|defaults| !defaults.contains_key(key.as_str())))
        .cloned()
        .collect()
}

fn validate_value(value: &Value, schema: &Schema, path: &str) -> Result<(), ConfigError> {
    match schema {
        Schema::Any => Ok(()),
        Schema::Null => expect(value.is_null(), schema, path),
        Schema::Boolean => expect(value.is_boolean(), schema, path),
        Schema::Integer => expect(value.is_i64() || value.is_u64(), schema, path),
        Schema::Number => expect(value.is_number(), schema, path),
        Schema::String => expect(value.is_string(), schema, path),
        Schema::Array(items) => {
            let arr = expect_array(value, path)?;
            if let Some(items) = items {
                for (idx, entry) in arr.iter().enumerate() {
                    validate_value(entry, items, &format!("{}[{idx}]", display_path(path)))?;
                }
            }
            Ok(())
        }
        Schema::Object(object) => validate_object(value, object, path),
        Schema::OneOf(options) => {
            if options
                .iter()
                .any(|option| validate_value(value, option, path).is_ok())
            {
                Ok(())
            } else {
                Err(invalid_field(
                    path,
                    &format!("expected {}", schema.describe()),
                ))
            }
        }
    }
}

fn validate_object(value: &Value, object: &ObjectSchema, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, path)?;
    validate_properties(
        map,
        &object.properties,
        &object.required,
        object.additional_properties,
        path,
    )
}

fn validate_properties(
    map: &Map<String, Value>,
    properties: &BTreeMap<String, Schema>,
    required: &[String],
    additional_properties: bool,
    path: &str,
) -> Result<(), ConfigError> {
    if !additional_properties {
        ensure_allowed_keys(map, properties, path)?;
    }
    for key in required {
        if !map.contains_key(key) {
            return Err(invalid_field(
                &join_path(path, key),
                "missing required property",
            ));
        }
    }
    for (key, schema) in properties {
        if let Some(value) = map.get(key) {
            validate_value(value, schema, &join_path(path, key))?;
        }
    }
    Ok(())
}

fn expect(matches: bool, schema: &Schema, path: &str) -> Result<(), ConfigError> {
    if matches {
        Ok(())
    } else {
        Err(invalid_field(
            path,
            &format!("expected {}", schema.describe()),
        ))
    }
}

/// Expect a JSON object or return a typed error.
fn expect_object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>, ConfigError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(invalid_field(path, "expected object")),
    }
}

/// Expect a JSON array or return a typed error.
fn expect_array<'a>(value: &'a Value, path: &str) -> Result<&'a Vec<Value>, ConfigError> {
    match value {
        Value::Array(arr) => Ok(arr),
        _ => Err(invalid_field(path, "expected array")),
    }
}

/// Ensure an object contains only declared keys.
fn ensure_allowed_keys(
    map: &Map<String, Value>,
    allowed: &BTreeMap<String, Schema>,
    path: &str,
) -> Result<(), ConfigError> {
    for key in map.keys() {
        if !allowed.contains_key(key) {
            return Err(invalid_field(&join_path(path, key), "unknown key"));
        }
    }
    Ok(())
}

/// Join nested paths for better error messages.
fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() { "root" } else { path }
}

/// Build a structured validation error.
fn invalid_field(path: &str, message: &str) -> ConfigError {
    ConfigError::Validation {
        path: display_path(path).to_string(),
        message: message.to_string(),
    }
}
