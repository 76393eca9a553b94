//! Configuration data model: mappings and the validation schema description.

use crate::ConfigError;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// String-keyed mapping used for defaults, file layers and the merged config.
pub type ConfigMapping = Map<String, Value>;

/// Schema for a single config value.
///
/// Covers the JSON-Schema subset used by services: `type`, nested
/// `properties`, `required`, `additionalProperties` and array `items`.
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    /// Accept any value.
    Any,
    Null,
    Boolean,
    /// Whole numbers only; `1.0` is not an integer.
    Integer,
    /// Any number, integer or floating point.
    Number,
    String,
    /// Sequence whose entries match the optional item schema.
    Array(Option<Box<Schema>>),
    /// Mapping with declared properties.
    Object(ObjectSchema),
    /// Value must match at least one of the listed schemas (`type: [..]`).
    OneOf(Vec<Schema>),
}

impl Schema {
    /// Array schema whose entries all match `items`.
    pub fn array_of(items: Schema) -> Self {
        Schema::Array(Some(Box::new(items)))
    }

    /// Build a schema from a JSON-Schema-style property descriptor.
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        parse_descriptor(value, "")
    }

    /// Short name used in validation messages.
    pub(crate) fn describe(&self) -> String {
        match self {
            Schema::Any => "any".to_string(),
            Schema::Null => "null".to_string(),
            Schema::Boolean => "boolean".to_string(),
            Schema::Integer => "integer".to_string(),
            Schema::Number => "number".to_string(),
            Schema::String => "string".to_string(),
            Schema::Array(_) => "array".to_string(),
            Schema::Object(_) => "object".to_string(),
            Schema::OneOf(options) => options
                .iter()
                .map(Schema::describe)
                .collect::<Vec<_>>()
                .join(" or "),
        }
    }
}

/// Object schema with declared properties.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSchema {
    pub properties: BTreeMap<String, Schema>,
    pub required: Vec<String>,
    /// Whether keys not listed in `properties` are accepted.
    pub additional_properties: bool,
}

impl Default for ObjectSchema {
    fn default() -> Self {
        Self {
            properties: BTreeMap::new(),
            required: Vec::new(),
            additional_properties: true,
        }
    }
}

impl ObjectSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a property.
    pub fn property(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.properties.insert(name.into(), schema);
        self
    }

    /// Mark a property as required.
    pub fn require(mut self, name: impl Into<String>) -> Self {
        self.required.push(name.into());
        self
    }

    /// Reject keys that are not declared.
    pub fn deny_additional(mut self) -> Self {
        self.additional_properties = false;
        self
    }
}

impl From<ObjectSchema> for Schema {
    fn from(object: ObjectSchema) -> Self {
        Schema::Object(object)
    }
}

/// Caller-supplied schema for top-level config keys.
///
/// The fragment is placed into an implicit root object that rejects any
/// top-level key it does not declare.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaFragment {
    properties: BTreeMap<String, Schema>,
}

impl SchemaFragment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a top-level key.
    pub fn property(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.properties.insert(name.into(), schema);
        self
    }

    /// Build a fragment from a JSON-Schema `properties` object such as
    /// `{"retries": {"type": "integer"}}`.
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        let Value::Object(map) = value else {
            return Err(invalid_schema("", "expected object of property descriptors"));
        };
        let mut properties = BTreeMap::new();
        for (key, descriptor) in map {
            properties.insert(key.clone(), parse_descriptor(descriptor, key)?);
        }
        Ok(Self { properties })
    }

    /// Declared top-level properties, sorted by key.
    pub fn properties(&self) -> &BTreeMap<String, Schema> {
        &self.properties
    }

    pub fn contains(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl FromIterator<(String, Schema)> for SchemaFragment {
    fn from_iter<I: IntoIterator<Item = (String, Schema)>>(iter: I) -> Self {
        Self {
            properties: iter.into_iter().collect(),
        }
    }
}

fn parse_descriptor(value: &Value, path: &str) -> Result<Schema, ConfigError> {
    let Value::Object(map) = value else {
        return Err(invalid_schema(path, "expected descriptor object"));
    };

    let type_names: Vec<&str> = match map.get("type") {
        None => {
            if map.contains_key("properties") {
                vec!["object"]
            } else if map.contains_key("items") {
                vec!["array"]
            } else {
                return Ok(Schema::Any);
            }
        }
        Some(Value::String(name)) => vec![name.as_str()],
        Some(Value::Array(names)) => {
            let mut collected = Vec::with_capacity(names.len());
            for name in names {
                let Some(name) = name.as_str() else {
                    return Err(invalid_schema(path, "type names must be strings"));
                };
                collected.push(name);
            }
            collected
        }
        Some(_) => return Err(invalid_schema(path, "type must be a string or list")),
    };

    let mut options = Vec::with_capacity(type_names.len());
    for name in type_names {
        options.push(parse_typed(name, map, path)?);
    }
    match options.len() {
        0 => Err(invalid_schema(path, "type list is empty")),
        1 => Ok(options.remove(0)),
        _ => Ok(Schema::OneOf(options)),
    }
}

fn parse_typed(name: &str, map: &Map<String, Value>, path: &str) -> Result<Schema, ConfigError> {
    let schema = match name {
        "null" => Schema::Null,
        "boolean" => Schema::Boolean,
        "integer" => Schema::Integer,
        "number" => Schema::Number,
        "string" => Schema::String,
        "array" => match map.get("items") {
            Some(items) => Schema::array_of(parse_descriptor(items, &format!("{path}[]"))?),
            None => Schema::Array(None),
        },
        "object" => Schema::Object(parse_object(map, path)?),
        other => {
            return Err(invalid_schema(path, &format!("unsupported type \"{other}\"")));
        }
    };
    Ok(schema)
}

fn parse_object(map: &Map<String, Value>, path: &str) -> Result<ObjectSchema, ConfigError> {
    let mut object = ObjectSchema::new();
    if let Some(properties) = map.get("properties") {
        let Value::Object(properties) = properties else {
            return Err(invalid_schema(path, "properties must be an object"));
        };
        for (key, descriptor) in properties {
            let child = if path.is_empty() {
                key.clone()
            } else {
                format!("{path}.{key}")
            };
            object
                .properties
                .insert(key.clone(), parse_descriptor(descriptor, &child)?);
        }
    }
    if let Some(required) = map.get("required") {
        let Value::Array(names) = required else {
            return Err(invalid_schema(path, "required must be a list"));
        };
        for name in names {
            let Some(name) = name.as_str() else {
                return Err(invalid_schema(path, "required entries must be strings"));
            };
            object.required.push(name.to_string());
        }
    }
    match map.get("additionalProperties") {
        None => {}
        Some(Value::Bool(allowed)) => object.additional_properties = *allowed,
        Some(_) => {
            return Err(invalid_schema(
                path,
                "additionalProperties must be a boolean",
            ));
        }
    }
    Ok(object)
}

fn invalid_schema(path: &str, message: &str) -> ConfigError {
    ConfigError::InvalidSchema {
        path: if path.is_empty() {
            "root".to_string()
        } else {
            path.to_string()
        },
        message: message.to_string(),
    }
}
