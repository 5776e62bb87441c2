//! `random_uuid`: a random UUID string.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;
use uuid::Uuid;

use crate::error::ProviderError;
use crate::random;
use crate::resource::{decode, encode, Resource};
use crate::schema::{Attribute, Schema};

/// Resource type name.
pub const TYPE_NAME: &str = "random_uuid";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct UuidModel {
    id: Option<String>,
    keepers: Option<BTreeMap<String, Option<String>>>,
    result: Option<String>,
}

/// Format 16 random bytes as a hyphenated UUID. Version bits are left as drawn.
fn random_uuid() -> Result<String, ProviderError> {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&random::secure_bytes(16)?);
    Ok(Uuid::from_bytes(bytes).hyphenated().to_string())
}

/// The `random_uuid` resource.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomUuid;

impl Resource for RandomUuid {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description(
                "The resource `random_uuid` generates a random uuid string that is intended to \
                 be used as a unique identifier for other resources.",
            )
            .with_attribute("keepers", Attribute::keepers())
            .with_attribute(
                "result",
                Attribute::computed_string()
                    .with_description("The generated uuid presented in string format."),
            )
            .with_attribute(
                "id",
                Attribute::computed_string()
                    .with_description("The generated uuid presented in string format."),
            )
    }

    fn create(&self, planned: Value) -> Result<Value, ProviderError> {
        let mut model: UuidModel = decode(planned)?;
        debug!("generating random_uuid");

        let result = random_uuid()?;
        model.id = Some(result.clone());
        model.result = Some(result);
        encode(&model)
    }

    fn import(&self, id: &str) -> Result<Value, ProviderError> {
        Uuid::parse_str(id).map_err(|e| {
            ProviderError::Import(format!("error parsing UUID {:?}: {}", id, e))
        })?;
        let model = UuidModel {
            id: Some(id.to_string()),
            keepers: None,
            result: Some(id.to_string()),
        };
        encode(&model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_format() {
        let state = RandomUuid.create(json!({"keepers": null})).unwrap();
        let result = state["result"].as_str().unwrap();
        assert_eq!(result.len(), 36);
        let groups: Vec<usize> = result.split('-').map(str::len).collect();
        assert_eq!(groups, vec![8, 4, 4, 4, 12]);
        assert!(result
            .chars()
            .all(|c| c == '-' || c.is_ascii_digit() || ('a'..='f').contains(&c)));
        assert_eq!(state["id"], state["result"]);
    }

    #[test]
    fn test_create_unique() {
        let a = RandomUuid.create(json!({})).unwrap();
        let b = RandomUuid.create(json!({})).unwrap();
        assert_ne!(a["result"], b["result"]);
    }

    #[test]
    fn test_import() {
        let state = RandomUuid.import("6b0f8e7c-3f0c-4b8e-9b7a-2f5f1d4e8a11").unwrap();
        assert_eq!(state["result"], "6b0f8e7c-3f0c-4b8e-9b7a-2f5f1d4e8a11");
        assert_eq!(state["id"], state["result"]);
    }

    #[test]
    fn test_import_rejects_invalid() {
        let err = RandomUuid.import("not-a-uuid").unwrap_err();
        assert!(matches!(err, ProviderError::Import(_)));
    }
}
