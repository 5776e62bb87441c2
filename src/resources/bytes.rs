//! `random_bytes`: raw random bytes, exposed as base64 and hex.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::ProviderError;
use crate::random;
use crate::resource::{count, decode, encode, Resource};
use crate::schema::{Attribute, Schema, Validator};

/// Resource type name.
pub const TYPE_NAME: &str = "random_bytes";

/// `id` of every bytes resource.
pub const BYTES_ID: &str = "none";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct BytesModel {
    id: Option<String>,
    length: Option<i64>,
    keepers: Option<BTreeMap<String, Option<String>>>,
    base64: Option<String>,
    hex: Option<String>,
}

impl BytesModel {
    fn fill(&mut self, bytes: &[u8]) {
        self.length = Some(bytes.len() as i64);
        self.base64 = Some(STANDARD.encode(bytes));
        self.hex = Some(hex::encode(bytes));
        self.id = Some(BYTES_ID.to_string());
    }
}

/// The `random_bytes` resource.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomBytes;

impl Resource for RandomBytes {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description(
                "The resource `random_bytes` generates random bytes that are intended to be used \
                 as a secret, or key.",
            )
            .with_attribute("keepers", Attribute::keepers())
            .with_attribute(
                "length",
                Attribute::required_int64()
                    .with_force_new()
                    .with_validator(Validator::AtLeast { min: 1 })
                    .with_description(
                        "The number of bytes requested. The minimum value for length is 1.",
                    ),
            )
            .with_attribute(
                "base64",
                Attribute::computed_string()
                    .sensitive()
                    .with_description("The generated bytes presented in base64 string format."),
            )
            .with_attribute(
                "hex",
                Attribute::computed_string()
                    .sensitive()
                    .with_description(
                        "The generated bytes presented in lowercase hexadecimal string format.",
                    ),
            )
            .with_attribute(
                "id",
                Attribute::computed_string().with_description("A static value used internally."),
            )
    }

    fn create(&self, planned: Value) -> Result<Value, ProviderError> {
        let mut model: BytesModel = decode(planned)?;
        let len = count("length", model.length)?;
        debug!(length = len, "generating random_bytes");

        model.fill(&random::secure_bytes(len)?);
        encode(&model)
    }

    fn import(&self, id: &str) -> Result<Value, ProviderError> {
        let bytes = STANDARD.decode(id).map_err(|e| {
            ProviderError::Import(format!("error decoding base64 ID: {}", e))
        })?;
        let mut model = BytesModel::default();
        model.fill(&bytes);
        encode(&model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create() {
        let state = RandomBytes.create(json!({"length": 32})).unwrap();
        let bytes = STANDARD.decode(state["base64"].as_str().unwrap()).unwrap();
        assert_eq!(bytes.len(), 32);
        assert_eq!(state["hex"], hex::encode(&bytes));
        assert_eq!(state["id"], BYTES_ID);
        assert_eq!(state["length"], 32);
    }

    #[test]
    fn test_import() {
        let state = RandomBytes.import("aGVtbWVy").unwrap();
        assert_eq!(state["length"], 6);
        assert_eq!(state["hex"], "68656d6d6572");
        assert_eq!(state["base64"], "aGVtbWVy");
        assert!(state["keepers"].is_null());
    }

    #[test]
    fn test_import_rejects_invalid() {
        // The error must not echo the secret ID.
        let err = RandomBytes.import("%%%secret").unwrap_err();
        assert!(matches!(err, ProviderError::Import(_)));
        assert!(!err.to_string().contains("secret"));
    }

    #[test]
    fn test_sensitive_outputs() {
        let schema = RandomBytes.schema();
        assert!(schema.attribute("base64").unwrap().flags.sensitive);
        assert!(schema.attribute("hex").unwrap().flags.sensitive);
    }
}
