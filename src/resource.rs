//! The per-resource seam.
//!
//! Every managed random resource implements [`Resource`]. The provider
//! dispatches protocol calls by type name and runs the shared plan engine
//! ([`crate::plan`]) around each resource's own hooks.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ProviderError;
use crate::plan;
use crate::schema::{Diagnostic, Schema};
use crate::upgrade::UpgradeError;

/// A managed resource type.
pub trait Resource: Send + Sync {
    /// The resource type name, e.g. `random_password`.
    fn type_name(&self) -> &'static str;

    /// The current schema, including its version.
    fn schema(&self) -> Schema;

    /// Cross-attribute checks that the schema validators cannot express.
    fn validate_config(&self, config: &Value) -> Vec<Diagnostic> {
        let _ = config;
        Vec::new()
    }

    /// Adjust the planned state after defaults have been applied.
    fn modify_plan(
        &self,
        config: &Value,
        planned: &mut Map<String, Value>,
    ) -> Result<(), ProviderError> {
        let _ = (config, planned);
        Ok(())
    }

    /// Generate the random value for a newly planned resource.
    fn create(&self, planned: Value) -> Result<Value, ProviderError>;

    /// Refresh state. Random values never drift.
    fn read(&self, state: Value) -> Result<Value, ProviderError> {
        Ok(state)
    }

    /// Apply an in-place update, keeping every generated value.
    fn update(&self, prior: Value, planned: Value) -> Result<Value, ProviderError> {
        plan::carry_computed(&self.schema(), &prior, planned)
    }

    /// Build state for an existing value identified by `id`.
    fn import(&self, id: &str) -> Result<Value, ProviderError> {
        let _ = id;
        Err(ProviderError::Unimplemented(format!(
            "import is not supported for {}",
            self.type_name()
        )))
    }

    /// Migrate state stored at `version` to the current schema version.
    fn upgrade_state(&self, version: i64, state: Value) -> Result<Value, ProviderError> {
        let current = self.schema().version;
        if version == current as i64 {
            return Ok(state);
        }
        Err(UpgradeError::UnsupportedVersion {
            resource_type: self.type_name().to_string(),
            version,
            current,
        }
        .into())
    }
}

/// Decode a state or plan value into a typed model.
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ProviderError> {
    Ok(serde_json::from_value(value)?)
}

/// Encode a typed model back into a state value.
pub fn encode<T: Serialize>(model: &T) -> Result<Value, ProviderError> {
    Ok(serde_json::to_value(model)?)
}

/// Read a required integer attribute as a non-negative count.
pub fn count(name: &str, value: Option<i64>) -> Result<usize, ProviderError> {
    let value = value.ok_or_else(|| {
        ProviderError::Validation(format!("attribute '{}' must be set", name))
    })?;
    usize::try_from(value).map_err(|_| {
        ProviderError::Validation(format!(
            "attribute '{}' must not be negative, got {}",
            name, value
        ))
    })
}
