//! `random_password`: like `random_string`, but the result is sensitive
//! and accompanied by a bcrypt hash.
//!
//! State has gone through four schema versions:
//!
//! | version | change |
//! |---|---|
//! | 0 | initial attributes, `number` flag only |
//! | 1 | adds `bcrypt_hash` |
//! | 2 | adds `numeric`, aliased with `number` |
//! | 3 | `bcrypt_hash` guaranteed to match `result` |

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::charset::{
    align_number_numeric, copy_number_to_numeric, fill_legacy_defaults, number_attribute,
    with_generation_attributes, StringSettings,
};
use crate::error::ProviderError;
use crate::random::hash::{bcrypt_hash, hash_matches};
use crate::random::string;
use crate::resource::{decode, encode, Resource};
use crate::schema::{Attribute, Schema};
use crate::upgrade::{UpgradeChain, UpgradeStep};

/// Resource type name.
pub const TYPE_NAME: &str = "random_password";

/// `id` of every password resource.
pub const PASSWORD_ID: &str = "none";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PasswordModel {
    id: Option<String>,
    #[serde(flatten)]
    settings: StringSettings,
    number: Option<bool>,
    keepers: Option<BTreeMap<String, Option<String>>>,
    result: Option<String>,
    bcrypt_hash: Option<String>,
}

fn stored_result(state: &Map<String, Value>) -> Option<&str> {
    state.get("result").and_then(Value::as_str)
}

fn upgrade_v0_to_v1(mut state: Map<String, Value>) -> Result<Map<String, Value>, ProviderError> {
    fill_legacy_defaults(&mut state);
    let hash = match stored_result(&state) {
        Some(result) => Value::String(bcrypt_hash(result)?),
        None => Value::Null,
    };
    state.insert("bcrypt_hash".to_string(), hash);
    Ok(state)
}

fn upgrade_v1_to_v2(mut state: Map<String, Value>) -> Result<Map<String, Value>, ProviderError> {
    copy_number_to_numeric(&mut state);
    Ok(state)
}

fn upgrade_v2_to_v3(mut state: Map<String, Value>) -> Result<Map<String, Value>, ProviderError> {
    let Some(result) = stored_result(&state).map(str::to_owned) else {
        return Ok(state);
    };
    let current = state.get("bcrypt_hash").and_then(Value::as_str);
    if !current.is_some_and(|hash| hash_matches(hash, &result)) {
        warn!("stored bcrypt_hash does not match result, regenerating");
        state.insert("bcrypt_hash".to_string(), Value::String(bcrypt_hash(&result)?));
    }
    Ok(state)
}

const UPGRADES: UpgradeChain = UpgradeChain::new(
    TYPE_NAME,
    &[
        upgrade_v0_to_v1 as UpgradeStep,
        upgrade_v1_to_v2,
        upgrade_v2_to_v3,
    ],
);

/// The `random_password` resource.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomPassword;

impl Resource for RandomPassword {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        let schema = Schema::new(UPGRADES.current_version())
            .with_description(
                "Identical to `random_string` with the exception that the result is treated as \
                 sensitive and, thus, _not_ displayed in console output.",
            )
            .with_attribute("keepers", Attribute::keepers())
            .with_attribute("number", number_attribute())
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
            )
            .with_attribute(
                "id",
                Attribute::computed_string().with_description("A static value used internally."),
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
        let mut model: PasswordModel = decode(planned)?;
        let params = model.settings.params()?;
        debug!(length = params.length, "generating random_password");

        let result = string::generate(&params)?;
        model.bcrypt_hash = Some(bcrypt_hash(&result)?);
        model.result = Some(result);
        model.id = Some(PASSWORD_ID.to_string());
        encode(&model)
    }

    fn import(&self, id: &str) -> Result<Value, ProviderError> {
        let model = PasswordModel {
            id: Some(PASSWORD_ID.to_string()),
            settings: StringSettings::imported(id.chars().count()),
            number: Some(true),
            keepers: None,
            result: Some(id.to_string()),
            bcrypt_hash: Some(bcrypt_hash(id)?),
        };
        encode(&model)
    }

    fn upgrade_state(&self, version: i64, state: Value) -> Result<Value, ProviderError> {
        UPGRADES.upgrade(version, state)
    }
}
