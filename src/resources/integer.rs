//! `random_integer`: a uniform integer in an inclusive range.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::ProviderError;
use crate::random::{self, RandomError};
use crate::resource::{decode, encode, Resource};
use crate::schema::{Attribute, Diagnostic, Schema};

/// Resource type name.
pub const TYPE_NAME: &str = "random_integer";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct IntegerModel {
    id: Option<String>,
    min: Option<i64>,
    max: Option<i64>,
    seed: Option<String>,
    keepers: Option<BTreeMap<String, Option<String>>>,
    result: Option<i64>,
}

fn range(model: &IntegerModel) -> Result<(i64, i64), ProviderError> {
    match (model.min, model.max) {
        (Some(min), Some(max)) if max < min => Err(RandomError::InvalidRange { min, max }.into()),
        (Some(min), Some(max)) => Ok((min, max)),
        _ => Err(ProviderError::Validation(
            "attributes 'min' and 'max' must be set".to_string(),
        )),
    }
}

fn parse_part(id: &str, name: &str, part: &str) -> Result<i64, ProviderError> {
    part.parse().map_err(|e| {
        ProviderError::Import(format!(
            "error parsing {} {:?} in ID {:?}: {}",
            name, part, id, e
        ))
    })
}

/// The `random_integer` resource.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomInteger;

impl Resource for RandomInteger {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description(
                "The resource `random_integer` generates random values from a given range, \
                 described by the `min` and `max` attributes of a given resource.",
            )
            .with_attribute("keepers", Attribute::keepers())
            .with_attribute(
                "min",
                Attribute::required_int64()
                    .with_force_new()
                    .with_description("The minimum inclusive value of the range."),
            )
            .with_attribute(
                "max",
                Attribute::required_int64()
                    .with_force_new()
                    .with_description("The maximum inclusive value of the range."),
            )
            .with_attribute(
                "seed",
                Attribute::optional_string()
                    .with_force_new()
                    .with_description("A custom seed to always produce the same value."),
            )
            .with_attribute(
                "result",
                Attribute::computed_int64().with_description("The random integer result."),
            )
            .with_attribute(
                "id",
                Attribute::computed_string()
                    .with_description("The string representation of the integer result."),
            )
    }

    fn validate_config(&self, config: &Value) -> Vec<Diagnostic> {
        let bound = |name: &str| config.get(name).and_then(Value::as_i64);
        match (bound("min"), bound("max")) {
            (Some(min), Some(max)) if max < min => vec![Diagnostic::error("Invalid Attribute Value")
                .with_detail(format!(
                    "minimum value {} needs to be smaller than or equal to maximum value {}",
                    min, max
                ))
                .with_attribute("max")],
            _ => Vec::new(),
        }
    }

    fn create(&self, planned: Value) -> Result<Value, ProviderError> {
        let mut model: IntegerModel = decode(planned)?;
        let (min, max) = range(&model)?;
        debug!(min, max, seeded = model.seed.is_some(), "generating random_integer");

        let mut rng = random::seeded_rng(model.seed.as_deref())?;
        let result = random::random_in_range(&mut rng, min, max)?;
        model.result = Some(result);
        model.id = Some(result.to_string());
        encode(&model)
    }

    fn import(&self, id: &str) -> Result<Value, ProviderError> {
        let parts: Vec<&str> = id.split(',').collect();
        if parts.len() != 3 && parts.len() != 4 {
            return Err(ProviderError::Import(format!(
                "invalid import ID {:?}: expected \"min,max,result\" or \"min,max,result,seed\"",
                id
            )));
        }

        let result = parse_part(id, "result", parts[2])?;
        let model = IntegerModel {
            id: Some(parts[2].to_string()),
            min: Some(parse_part(id, "min", parts[0])?),
            max: Some(parse_part(id, "max", parts[1])?),
            seed: parts.get(3).map(|s| s.to_string()),
            keepers: None,
            result: Some(result),
        };
        encode(&model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_in_range() {
        for _ in 0..50 {
            let state = RandomInteger.create(json!({"min": 1, "max": 3})).unwrap();
            let result = state["result"].as_i64().unwrap();
            assert!((1..=3).contains(&result));
            assert_eq!(state["id"], result.to_string());
        }
    }

    #[test]
    fn test_create_seeded_is_deterministic() {
        let config = json!({"min": 1, "max": 1_000_000, "seed": "hemmer"});
        let a = RandomInteger.create(config.clone()).unwrap();
        let b = RandomInteger.create(config).unwrap();
        assert_eq!(a["result"], b["result"]);
    }

    #[test]
    fn test_create_single_value() {
        let state = RandomInteger.create(json!({"min": 7, "max": 7})).unwrap();
        assert_eq!(state["result"], 7);
    }

    #[test]
    fn test_create_rejects_inverted_range() {
        let err = RandomInteger.create(json!({"min": 10, "max": 1})).unwrap_err();
        assert!(matches!(err, ProviderError::Random(RandomError::InvalidRange { .. })));
    }

    #[test]
    fn test_validate_config() {
        let diags = RandomInteger.validate_config(&json!({"min": 10, "max": 1}));
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].attribute.as_deref(), Some("max"));
        assert!(RandomInteger.validate_config(&json!({"min": 1, "max": 10})).is_empty());
    }

    #[test]
    fn test_import() {
        let state = RandomInteger.import("1,3,2").unwrap();
        assert_eq!(state["min"], 1);
        assert_eq!(state["max"], 3);
        assert_eq!(state["result"], 2);
        assert_eq!(state["id"], "2");
        assert!(state["seed"].is_null());

        let seeded = RandomInteger.import("-5,5,0,abc").unwrap();
        assert_eq!(seeded["seed"], "abc");
        assert_eq!(seeded["min"], -5);
    }

    #[test]
    fn test_import_rejects_malformed() {
        assert!(matches!(
            RandomInteger.import("1,3").unwrap_err(),
            ProviderError::Import(_)
        ));
        assert!(matches!(
            RandomInteger.import("1,x,2").unwrap_err(),
            ProviderError::Import(_)
        ));
    }
}
