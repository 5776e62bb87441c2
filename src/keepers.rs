//! `keepers` handling.
//!
//! A null keepers map and an empty one are the same thing, and a key whose
//! value is null is treated as absent. Two keepers values only differ, and
//! so only force replacement, when their normalized forms differ.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// Normalized keepers: non-null entries only, sorted by key.
pub type Keepers = BTreeMap<String, String>;

/// Normalize a raw keepers value. Returns `None` when nothing is left.
///
/// Non-string scalars are kept in their JSON text form.
pub fn normalize(value: &Value) -> Option<Keepers> {
    let map = value.as_object()?;
    let keepers: Keepers = map
        .iter()
        .filter_map(|(k, v)| match v {
            Value::Null => None,
            Value::String(s) => Some((k.clone(), s.clone())),
            other => Some((k.clone(), other.to_string())),
        })
        .collect();
    (!keepers.is_empty()).then_some(keepers)
}

/// Whether moving from `prior` to `planned` keepers forces replacement.
pub fn requires_replace(prior: &Value, planned: &Value) -> bool {
    normalize(prior) != normalize(planned)
}

/// The normalized keepers as a JSON value, `null` when empty.
pub fn normalized_value(value: &Value) -> Value {
    match normalize(value) {
        Some(keepers) => Value::Object(
            keepers
                .into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect::<Map<String, Value>>(),
        ),
        None => Value::Null,
    }
}
