//! Versioned state migrations.
//!
//! A resource with schema version `N` declares `N` steps; step `i` turns a
//! state stored at version `i` into one at version `i + 1`. Stored state is
//! walked forward one step at a time until it reaches the current version.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::error::ProviderError;
use crate::keepers;

/// Errors raised while migrating stored state.
#[derive(Debug, Error)]
pub enum UpgradeError {
    /// Stored state has a version this provider does not know.
    #[error(
        "{resource_type} state version {version} is not supported \
         (current schema version is {current})"
    )]
    UnsupportedVersion {
        /// Resource type.
        resource_type: String,
        /// Version found in stored state.
        version: i64,
        /// Current schema version.
        current: u64,
    },

    /// Stored state is not a JSON object.
    #[error("{resource_type} state at version {version} is not an object")]
    NotAnObject {
        /// Resource type.
        resource_type: String,
        /// Version found in stored state.
        version: i64,
    },
}

/// A single migration from version `i` to `i + 1`.
pub type UpgradeStep = fn(Map<String, Value>) -> Result<Map<String, Value>, ProviderError>;

/// The ordered migrations for one resource type.
#[derive(Clone, Copy)]
pub struct UpgradeChain {
    resource_type: &'static str,
    steps: &'static [UpgradeStep],
}

impl UpgradeChain {
    /// A chain whose current version is `steps.len()`.
    pub const fn new(resource_type: &'static str, steps: &'static [UpgradeStep]) -> Self {
        Self {
            resource_type,
            steps,
        }
    }

    /// The schema version states are upgraded to.
    pub fn current_version(&self) -> u64 {
        self.steps.len() as u64
    }

    /// Upgrade `state`, stored at `version`, to the current version.
    pub fn upgrade(&self, version: i64, state: Value) -> Result<Value, ProviderError> {
        let current = self.current_version();
        let start = usize::try_from(version)
            .ok()
            .filter(|v| *v as u64 <= current)
            .ok_or_else(|| UpgradeError::UnsupportedVersion {
                resource_type: self.resource_type.to_string(),
                version,
                current,
            })?;

        let Value::Object(mut state) = state else {
            return Err(UpgradeError::NotAnObject {
                resource_type: self.resource_type.to_string(),
                version,
            }
            .into());
        };

        for (from, step) in self.steps.iter().enumerate().skip(start) {
            debug!(
                resource_type = self.resource_type,
                from_version = from,
                to_version = from + 1,
                "upgrading state"
            );
            state = step(state)?;
        }
        Ok(Value::Object(state))
    }
}

/// Set `name` to `value` when it is absent or null.
pub fn fill_missing(state: &mut Map<String, Value>, name: &str, value: Value) {
    let entry = state.entry(name.to_string()).or_insert(Value::Null);
    if entry.is_null() {
        *entry = value;
    }
}

/// Replace the stored keepers with their normalized form.
pub fn normalize_keepers(state: &mut Map<String, Value>) {
    let normalized = keepers::normalized_value(state.get("keepers").unwrap_or(&Value::Null));
    state.insert("keepers".to_string(), normalized);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn add_a(mut state: Map<String, Value>) -> Result<Map<String, Value>, ProviderError> {
        state.insert("a".to_string(), json!(true));
        Ok(state)
    }

    fn copy_a_to_b(mut state: Map<String, Value>) -> Result<Map<String, Value>, ProviderError> {
        let a = state.get("a").cloned().unwrap_or(Value::Null);
        state.insert("b".to_string(), a);
        Ok(state)
    }

    const CHAIN: UpgradeChain =
        UpgradeChain::new("random_test", &[add_a as UpgradeStep, copy_a_to_b]);

    #[test]
    fn test_runs_all_steps_from_zero() {
        let upgraded = CHAIN.upgrade(0, json!({})).unwrap();
        assert_eq!(upgraded, json!({"a": true, "b": true}));
    }

    #[test]
    fn test_runs_remaining_steps_only() {
        let upgraded = CHAIN.upgrade(1, json!({"a": false})).unwrap();
        assert_eq!(upgraded, json!({"a": false, "b": false}));
    }

    #[test]
    fn test_current_version_is_identity() {
        let state = json!({"a": 1});
        assert_eq!(CHAIN.upgrade(2, state.clone()).unwrap(), state);
        assert_eq!(CHAIN.current_version(), 2);
    }

    #[test]
    fn test_rejects_future_and_negative_versions() {
        assert!(CHAIN.upgrade(3, json!({})).is_err());
        assert!(CHAIN.upgrade(-1, json!({})).is_err());
    }

    #[test]
    fn test_rejects_non_object() {
        let err = CHAIN.upgrade(0, json!("x")).unwrap_err();
        assert!(err.to_string().contains("not an object"));
    }

    #[test]
    fn test_fill_missing_and_keepers() {
        let mut state = Map::new();
        state.insert("upper".to_string(), Value::Null);
        state.insert("keepers".to_string(), json!({}));
        fill_missing(&mut state, "upper", json!(true));
        fill_missing(&mut state, "min_upper", json!(0));
        normalize_keepers(&mut state);
        assert_eq!(Value::Object(state), json!({"upper": true, "min_upper": 0, "keepers": null}));
    }
}
