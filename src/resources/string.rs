//! `random_string`: a random string of configurable character classes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

use super::charset::{
    align_number_numeric, copy_number_to_numeric, fill_legacy_defaults, number_attribute,
    with_generation_attributes, StringSettings,
};
use crate::error::ProviderError;
use crate::random;
use crate::resource::{decode, encode, Resource};
use crate::schema::{Attribute, Schema};
use crate::upgrade::{UpgradeChain, UpgradeStep};

/// Resource type name.
pub const TYPE_NAME: &str = "random_string";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StringModel {
    id: Option<String>,
    #[serde(flatten)]
    settings: StringSettings,
    number: Option<bool>,
    keepers: Option<BTreeMap<String, Option<String>>>,
    result: Option<String>,
}

fn upgrade_v0_to_v1(mut state: Map<String, Value>) -> Result<Map<String, Value>, ProviderError> {
    fill_legacy_defaults(&mut state);
    Ok(state)
}

fn upgrade_v1_to_v2(mut state: Map<String, Value>) -> Result<Map<String, Value>, ProviderError> {
    copy_number_to_numeric(&mut state);
    Ok(state)
}

const UPGRADES: UpgradeChain = UpgradeChain::new(
    TYPE_NAME,
    &[upgrade_v0_to_v1 as UpgradeStep, upgrade_v1_to_v2],
);

/// The `random_string` resource.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomString;

impl Resource for RandomString {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        let schema = Schema::new(UPGRADES.current_version())
            .with_description(
                "The resource `random_string` generates a random permutation of alphanumeric \
                 characters and optionally special characters.",
            )
            .with_attribute("keepers", Attribute::keepers())
            .with_attribute("number", number_attribute())
            .with_attribute(
                "result",
                Attribute::computed_string().with_description("The generated random string."),
            )
            .with_attribute(
                "id",
                Attribute::computed_string().with_description("The generated random string."),
            );
        with_generation_attributes(schema, true)
    }

    fn modify_plan(
        &self,
        config: &Value,
        planned: &mut Map<String, Value>,
    ) -> Result<(), ProviderError> {
        align_number_numeric(config, planned)
    }

    fn create(&self, planned: Value) -> Result<Value, ProviderError> {
        let mut model: StringModel = decode(planned)?;
        let params = model.settings.params()?;
        debug!(length = params.length, "generating random_string");

        let result = random::string::generate(&params)?;
        model.id = Some(result.clone());
        model.result = Some(result);
        encode(&model)
    }

    fn import(&self, id: &str) -> Result<Value, ProviderError> {
        let model = StringModel {
            id: Some(id.to_string()),
            settings: StringSettings::imported(id.chars().count()),
            number: Some(true),
            keepers: None,
            result: Some(id.to_string()),
        };
        encode(&model)
    }

    fn upgrade_state(&self, version: i64, state: Value) -> Result<Value, ProviderError> {
        UPGRADES.upgrade(version, state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn planned(config: Value) -> Value {
        crate::plan::plan(&RandomString, None, config.clone(), &config)
            .unwrap()
            .planned_state
    }

    #[test]
    fn test_schema_version() {
        assert_eq!(RandomString.schema().version, 2);
        assert!(!RandomString.schema().attribute("result").unwrap().flags.sensitive);
    }

    #[test]
    fn test_create() {
        let state = RandomString.create(planned(json!({"length": 12}))).unwrap();
        let result = state["result"].as_str().unwrap();
        assert_eq!(result.chars().count(), 12);
        assert_eq!(state["id"], state["result"]);
        assert_eq!(state["numeric"], json!(true));
        assert_eq!(state["number"], json!(true));
    }

    #[test]
    fn test_create_with_classes() {
        let config = json!({
            "length": 20,
            "upper": false,
            "special": false,
            "number": false,
            "min_lower": 2
        });
        let state = RandomString.create(planned(config)).unwrap();
        let result = state["result"].as_str().unwrap();
        assert!(result.chars().all(|c| c.is_ascii_lowercase()), "{result}");
        assert_eq!(state["numeric"], json!(false));
    }

    #[test]
    fn test_create_override_special() {
        let config = json!({
            "length": 30,
            "upper": false,
            "lower": false,
            "numeric": false,
            "override_special": "/@£$"
        });
        let state = RandomString.create(planned(config)).unwrap();
        let result = state["result"].as_str().unwrap();
        assert!(result.chars().all(|c| "/@£$".contains(c)));
    }

    #[test]
    fn test_import() {
        let state = RandomString.import("Z=:cbrJE?Ltg").unwrap();
        assert_eq!(state["result"], "Z=:cbrJE?Ltg");
        assert_eq!(state["id"], "Z=:cbrJE?Ltg");
        assert_eq!(state["length"], 12);
        assert_eq!(state["special"], true);
        assert_eq!(state["min_upper"], 0);
        assert!(state["keepers"].is_null());
        assert!(state["override_special"].is_null());
    }

    #[test]
    fn test_upgrade_from_v1() {
        let v1 = json!({
            "id": "abc",
            "result": "abc",
            "length": 3,
            "number": false,
            "upper": true,
            "lower": true,
            "special": true,
            "min_upper": 0,
            "min_lower": 0,
            "min_numeric": 0,
            "min_special": 0,
            "override_special": null,
            "keepers": null
        });
        let upgraded = RandomString.upgrade_state(1, v1).unwrap();
        assert_eq!(upgraded["numeric"], json!(false));
        assert_eq!(upgraded["number"], json!(false));
        assert_eq!(upgraded["result"], "abc");
    }

    #[test]
    fn test_upgrade_from_v0_fills_defaults() {
        let v0 = json!({"id": "abcd", "result": "abcd", "length": 4, "keepers": {}});
        let upgraded = RandomString.upgrade_state(0, v0).unwrap();
        assert_eq!(upgraded["numeric"], json!(true));
        assert_eq!(upgraded["lower"], json!(true));
        assert_eq!(upgraded["min_special"], json!(0));
        assert!(upgraded["keepers"].is_null());
    }
}
