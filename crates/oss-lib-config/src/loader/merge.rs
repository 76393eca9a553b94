//! Deep merge helpers for layered configuration.

use crate::ConfigMapping;
use serde_json::Value;

/// Merge `loaded` over `defaults`, returning a new mapping.
///
/// Nested mappings are merged key by key; every other value from `loaded`
/// (scalars, sequences, mismatched types) replaces the default outright.
pub fn merge(defaults: &ConfigMapping, loaded: &ConfigMapping) -> ConfigMapping {
    let mut merged = defaults.clone();
    merge_maps(&mut merged, loaded);
    merged
}

/// Merge overlay entries into the base map in place.
pub(super) fn merge_maps(base: &mut ConfigMapping, overlay: &ConfigMapping) {
    for (key, value) in overlay {
        match base.get_mut(key) {
            Some(existing) => merge_values(existing, value),
            None => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Merge overlay values into the base, recursively overriding objects.
pub fn merge_values(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            merge_maps(base_map, overlay_map);
        }
        (base_slot, overlay_value) => {
            *base_slot = overlay_value.clone();
        }
    }
}
