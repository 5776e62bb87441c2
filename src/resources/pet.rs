//! `random_pet`: a random, human-friendly name.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::ProviderError;
use crate::random;
use crate::resource::{count, decode, encode, Resource};
use crate::schema::{Attribute, Schema, Validator};

/// Resource type name.
pub const TYPE_NAME: &str = "random_pet";

const DEFAULT_LENGTH: i64 = 2;
const DEFAULT_SEPARATOR: &str = "-";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PetModel {
    id: Option<String>,
    length: Option<i64>,
    prefix: Option<String>,
    separator: Option<String>,
    keepers: Option<BTreeMap<String, Option<String>>>,
}

/// The `random_pet` resource.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomPet;

impl Resource for RandomPet {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description(
                "The resource `random_pet` generates random pet names that are intended to be \
                 used as unique identifiers for other resources.",
            )
            .with_attribute("keepers", Attribute::keepers())
            .with_attribute(
                "length",
                Attribute::optional_computed_int64()
                    .with_default(json!(DEFAULT_LENGTH))
                    .with_validator(Validator::AtLeast { min: 1 })
                    .with_force_new()
                    .with_description("The length (in words) of the pet name. Defaults to 2"),
            )
            .with_attribute(
                "prefix",
                Attribute::optional_string()
                    .with_force_new()
                    .with_description("A string to prefix the name with."),
            )
            .with_attribute(
                "separator",
                Attribute::optional_computed_string()
                    .with_default(json!(DEFAULT_SEPARATOR))
                    .with_force_new()
                    .with_description(
                        "The character to separate words in the pet name. Defaults to \"-\"",
                    ),
            )
            .with_attribute(
                "id",
                Attribute::computed_string().with_description("The random pet name."),
            )
    }

    fn create(&self, planned: Value) -> Result<Value, ProviderError> {
        let mut model: PetModel = decode(planned)?;
        let length = count("length", Some(model.length.unwrap_or(DEFAULT_LENGTH)))?;
        let separator = model
            .separator
            .get_or_insert_with(|| DEFAULT_SEPARATOR.to_string())
            .clone();
        debug!(length, "generating random_pet");

        let pet = random::pet::generate(length, &separator, model.prefix.as_deref())?;
        model.length = Some(length as i64);
        model.id = Some(pet);
        encode(&model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planned(config: Value) -> Value {
        crate::plan::plan(&RandomPet, None, config.clone(), &config)
            .unwrap()
            .planned_state
    }

    #[test]
    fn test_create_defaults() {
        let state = RandomPet.create(planned(json!({}))).unwrap();
        let id = state["id"].as_str().unwrap();
        assert_eq!(id.split('-').count(), 2);
        assert_eq!(state["length"], 2);
        assert_eq!(state["separator"], "-");
    }

    #[test]
    fn test_create_with_prefix_and_separator() {
        let config = json!({"length": 3, "prefix": "app", "separator": "_"});
        let state = RandomPet.create(planned(config)).unwrap();
        let id = state["id"].as_str().unwrap();
        let words: Vec<&str> = id.split('_').collect();
        assert_eq!(words.len(), 4);
        assert_eq!(words[0], "app");
    }

    #[test]
    fn test_create_single_word() {
        let state = RandomPet.create(planned(json!({"length": 1}))).unwrap();
        assert!(!state["id"].as_str().unwrap().contains('-'));
    }

    #[test]
    fn test_import_unsupported() {
        assert!(matches!(
            RandomPet.import("happy-cat").unwrap_err(),
            ProviderError::Unimplemented(_)
        ));
    }
}
