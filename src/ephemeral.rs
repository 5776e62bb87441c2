//! Ephemeral resources.
//!
//! An ephemeral resource produces a value on open and keeps nothing in
//! state. The random provider has one: an ephemeral `random_password`.

use serde_json::{json, Value};
use tracing::debug;

use crate::error::ProviderError;
use crate::plan::apply_defaults;
use crate::random::hash::bcrypt_hash;
use crate::random::string;
use crate::resource::{decode, encode};
use crate::resources::charset::{with_generation_attributes, StringSettings};
use crate::schema::{Attribute, Diagnostic, Schema};
use crate::validation;

/// An ephemeral resource type.
pub trait EphemeralResource: Send + Sync {
    /// The ephemeral resource type name.
    fn type_name(&self) -> &'static str;

    /// The schema of config and result.
    fn schema(&self) -> Schema;

    /// Check `config` against the schema.
    fn validate_config(&self, config: &Value) -> Vec<Diagnostic> {
        validation::validate(&self.schema(), config)
    }

    /// Produce the result for `config`.
    fn open(&self, config: Value) -> Result<Value, ProviderError>;
}

/// The ephemeral `random_password`.
#[derive(Debug, Default, Clone, Copy)]
pub struct EphemeralPassword;

impl EphemeralResource for EphemeralPassword {
    fn type_name(&self) -> &'static str {
        "random_password"
    }

    fn schema(&self) -> Schema {
        let schema = Schema::v0()
            .with_description(
                "Generates an ephemeral password string using a cryptographic random number \
                 generator. The value is never stored in state.",
            )
            .with_attribute(
                "result",
                Attribute::computed_string()
                    .sensitive()
                    .with_description("The generated random string."),
            )
            .with_attribute(
                "bcrypt_hash",
                Attribute::computed_string()
                    .sensitive()
                    .with_description("A bcrypt hash of the generated random string."),
            );
        with_generation_attributes(schema, false)
    }

    fn open(&self, config: Value) -> Result<Value, ProviderError> {
        let schema = self.schema();
        let Value::Object(mut config) = config else {
            return Err(ProviderError::InvalidRequest(
                "ephemeral random_password config must be an object".to_string(),
            ));
        };
        apply_defaults(&schema, &mut config);
        let config = Value::Object(config);

        if let Err(diagnostics) = validation::validate_result(&schema, &config) {
            let message = diagnostics
                .iter()
                .filter(|d| d.is_error())
                .map(|d| match &d.detail {
                    Some(detail) => detail.clone(),
                    None => d.summary.clone(),
                })
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ProviderError::Validation(message));
        }

        let settings: StringSettings = decode(config.clone())?;
        let params = settings.params()?;
        debug!(length = params.length, "opening ephemeral random_password");

        let result = string::generate(&params)?;
        let hash = bcrypt_hash(&result)?;

        let mut opened = encode(&settings)?;
        if let Value::Object(map) = &mut opened {
            map.insert("result".to_string(), json!(result));
            map.insert("bcrypt_hash".to_string(), json!(hash));
        }
        Ok(opened)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::hash::hash_matches;

    #[test]
    fn test_schema_has_no_keepers() {
        let schema = EphemeralPassword.schema();
        assert!(schema.attribute("keepers").is_none());
        assert!(schema.attribute("number").is_none());
        assert!(schema.attribute("result").unwrap().flags.sensitive);
        assert!(!schema.attribute("length").unwrap().force_new());
    }

    #[test]
    fn test_open() {
        let opened = EphemeralPassword
            .open(json!({"length": 20, "special": false}))
            .unwrap();
        let result = opened["result"].as_str().unwrap();
        assert_eq!(result.chars().count(), 20);
        assert!(result.chars().all(|c| c.is_ascii_alphanumeric()));
        assert!(hash_matches(opened["bcrypt_hash"].as_str().unwrap(), result));
        assert_eq!(opened["upper"], true);
        assert_eq!(opened["min_numeric"], 0);
    }

    #[test]
    fn test_open_rejects_invalid_config() {
        let err = EphemeralPassword
            .open(json!({"length": 2, "min_upper": 3}))
            .unwrap_err();
        assert!(matches!(err, ProviderError::Validation(_)));

        let err = EphemeralPassword.open(json!({})).unwrap_err();
        assert!(matches!(err, ProviderError::Validation(_)));
    }

    #[test]
    fn test_open_rejects_non_object() {
        let err = EphemeralPassword.open(json!("x")).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidRequest(_)));
    }

    #[test]
    fn test_validate_config() {
        let diags = EphemeralPassword.validate_config(&json!({"length": 0}));
        assert!(diags.iter().any(|d| d.attribute.as_deref() == Some("length")));
    }
}
