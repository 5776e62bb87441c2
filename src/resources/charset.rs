//! Attributes and plan rules shared by `random_string`, `random_password`
//! and the ephemeral password.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::ProviderError;
use crate::random::string::StringParams;
use crate::resource::count;
use crate::schema::{Attribute, Schema, Validator};
use crate::upgrade::{fill_missing, normalize_keepers};

/// Deprecation notice for the `number` alias.
pub const NUMBER_DEPRECATION: &str = "**NOTE**: This is deprecated, use `numeric` instead.";

const MIN_ATTRIBUTES: [&str; 4] = ["min_upper", "min_lower", "min_numeric", "min_special"];
const FLAG_ATTRIBUTES: [&str; 4] = ["upper", "lower", "numeric", "special"];

fn flag(description: &str, force_new: bool) -> Attribute {
    let attr = Attribute::optional_computed_bool()
        .with_default(json!(true))
        .with_description(description);
    if force_new {
        attr.with_force_new()
    } else {
        attr
    }
}

fn minimum(description: &str, force_new: bool) -> Attribute {
    let attr = Attribute::optional_computed_int64()
        .with_default(json!(0))
        .with_validator(Validator::AtLeast { min: 0 })
        .with_description(description);
    if force_new {
        attr.with_force_new()
    } else {
        attr
    }
}

/// Add the generation settings to `schema`. Managed resources pass
/// `force_new = true`; any change to a setting regenerates the value.
pub fn with_generation_attributes(schema: Schema, force_new: bool) -> Schema {
    let mut length = Attribute::required_int64()
        .with_description(
            "The length of the string desired. The minimum value for length is 1 and, length \
             must also be >= (`min_upper` + `min_lower` + `min_numeric` + `min_special`).",
        )
        .with_validator(Validator::AtLeast { min: 1 })
        .with_validator(Validator::AtLeastSumOf {
            attributes: MIN_ATTRIBUTES.iter().map(|s| s.to_string()).collect(),
        });
    let mut override_special = Attribute::optional_string().with_description(
        "Supply your own list of special characters to use for string generation. This \
         overrides the default character list in the special argument.",
    );
    if force_new {
        length = length.with_force_new();
        override_special = override_special.with_force_new();
    }

    schema
        .with_attribute("length", length)
        .with_attribute(
            "upper",
            flag(
                "Include uppercase alphabet characters in the result. Default value is `true`.",
                force_new,
            ),
        )
        .with_attribute(
            "lower",
            flag(
                "Include lowercase alphabet characters in the result. Default value is `true`.",
                force_new,
            ),
        )
        .with_attribute(
            "numeric",
            flag("Include numeric characters in the result. Default value is `true`.", force_new),
        )
        .with_attribute(
            "special",
            flag(
                "Include special characters in the result. These are `!@#$%&*()-_=+[]{}<>:?`. \
                 Default value is `true`.",
                force_new,
            ),
        )
        .with_attribute(
            "min_upper",
            minimum("Minimum number of uppercase alphabet characters in the result.", force_new),
        )
        .with_attribute(
            "min_lower",
            minimum("Minimum number of lowercase alphabet characters in the result.", force_new),
        )
        .with_attribute(
            "min_numeric",
            minimum("Minimum number of numeric characters in the result.", force_new),
        )
        .with_attribute(
            "min_special",
            minimum("Minimum number of special characters in the result.", force_new),
        )
        .with_attribute("override_special", override_special)
}

/// The deprecated `number` alias of `numeric`.
pub fn number_attribute() -> Attribute {
    flag(
        "Include numeric characters in the result. Default value is `true`.",
        true,
    )
    .deprecated(NUMBER_DEPRECATION)
}

/// Generation settings as stored in plan and state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringSettings {
    /// Requested length.
    pub length: Option<i64>,
    /// Uppercase letters enabled.
    pub upper: Option<bool>,
    /// Lowercase letters enabled.
    pub lower: Option<bool>,
    /// Digits enabled.
    pub numeric: Option<bool>,
    /// Special characters enabled.
    pub special: Option<bool>,
    /// Minimum uppercase letters.
    pub min_upper: Option<i64>,
    /// Minimum lowercase letters.
    pub min_lower: Option<i64>,
    /// Minimum digits.
    pub min_numeric: Option<i64>,
    /// Minimum special characters.
    pub min_special: Option<i64>,
    /// Replacement special character set.
    pub override_special: Option<String>,
}

impl StringSettings {
    /// Settings recorded for an imported value of `length` characters.
    pub fn imported(length: usize) -> Self {
        Self {
            length: Some(length as i64),
            upper: Some(true),
            lower: Some(true),
            numeric: Some(true),
            special: Some(true),
            min_upper: Some(0),
            min_lower: Some(0),
            min_numeric: Some(0),
            min_special: Some(0),
            override_special: None,
        }
    }

    /// Convert to generator parameters. Unset flags default to enabled and
    /// unset minimums to zero.
    pub fn params(&self) -> Result<StringParams, ProviderError> {
        Ok(StringParams {
            length: count("length", self.length)?,
            upper: self.upper.unwrap_or(true),
            min_upper: count("min_upper", Some(self.min_upper.unwrap_or(0)))?,
            lower: self.lower.unwrap_or(true),
            min_lower: count("min_lower", Some(self.min_lower.unwrap_or(0)))?,
            numeric: self.numeric.unwrap_or(true),
            min_numeric: count("min_numeric", Some(self.min_numeric.unwrap_or(0)))?,
            special: self.special.unwrap_or(true),
            min_special: count("min_special", Some(self.min_special.unwrap_or(0)))?,
            override_special: self.override_special.clone(),
        })
    }
}

/// Keep the deprecated `number` attribute and `numeric` in agreement.
///
/// Whichever one is configured wins; configuring both with different
/// values is an error.
pub fn align_number_numeric(
    config: &Value,
    planned: &mut Map<String, Value>,
) -> Result<(), ProviderError> {
    let configured = |name: &str| config.get(name).and_then(Value::as_bool);
    match (configured("number"), configured("numeric")) {
        (Some(number), Some(numeric)) if number != numeric => Err(ProviderError::Validation(
            "the number and numeric attributes must be equal if both are set; number is \
             deprecated, use numeric instead"
                .to_string(),
        )),
        (Some(number), None) => {
            planned.insert("numeric".to_string(), Value::Bool(number));
            Ok(())
        },
        (None, Some(numeric)) => {
            planned.insert("number".to_string(), Value::Bool(numeric));
            Ok(())
        },
        _ => Ok(()),
    }
}

/// Fill settings that legacy (version 0) state may omit and normalize keepers.
pub fn fill_legacy_defaults(state: &mut Map<String, Value>) {
    for name in FLAG_ATTRIBUTES.iter().chain(&["number"]) {
        fill_missing(state, name, json!(true));
    }
    for name in MIN_ATTRIBUTES {
        fill_missing(state, name, json!(0));
    }
    normalize_keepers(state);
}

/// Copy the legacy `number` flag into `numeric`.
pub fn copy_number_to_numeric(state: &mut Map<String, Value>) {
    let number = state
        .get("number")
        .and_then(Value::as_bool)
        .unwrap_or(true);
    state.insert("number".to_string(), Value::Bool(number));
    state.insert("numeric".to_string(), Value::Bool(number));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ReplaceTrigger;

    #[test]
    fn test_generation_attributes() {
        let schema = with_generation_attributes(Schema::v0(), true);
        for name in ["length", "upper", "min_special", "override_special"] {
            let attr = schema.attribute(name).unwrap();
            assert_eq!(attr.replace, ReplaceTrigger::OnChange, "{name}");
        }
        assert_eq!(schema.attribute("special").unwrap().default, Some(json!(true)));
        assert_eq!(schema.attribute("min_lower").unwrap().default, Some(json!(0)));

        let ephemeral = with_generation_attributes(Schema::v0(), false);
        assert!(!ephemeral.attribute("length").unwrap().force_new());
    }

    #[test]
    fn test_params_defaults() {
        let settings = StringSettings {
            length: Some(12),
            ..StringSettings::default()
        };
        let params = settings.params().unwrap();
        assert_eq!(params, StringParams::with_length(12));
    }

    #[test]
    fn test_params_rejects_negative() {
        let settings = StringSettings {
            length: Some(12),
            min_upper: Some(-2),
            ..StringSettings::default()
        };
        assert!(settings.params().is_err());
    }

    #[test]
    fn test_align_number_only() {
        let mut planned = Map::new();
        planned.insert("number".to_string(), json!(false));
        planned.insert("numeric".to_string(), json!(true));
        align_number_numeric(&json!({"number": false}), &mut planned).unwrap();
        assert_eq!(planned["numeric"], json!(false));
    }

    #[test]
    fn test_align_numeric_only() {
        let mut planned = Map::new();
        planned.insert("number".to_string(), json!(true));
        planned.insert("numeric".to_string(), json!(false));
        align_number_numeric(&json!({"numeric": false}), &mut planned).unwrap();
        assert_eq!(planned["number"], json!(false));
    }

    #[test]
    fn test_align_conflict() {
        let mut planned = Map::new();
        let err = align_number_numeric(&json!({"number": true, "numeric": false}), &mut planned)
            .unwrap_err();
        assert!(matches!(err, ProviderError::Validation(_)));

        let config = json!({"number": true, "numeric": true});
        assert!(align_number_numeric(&config, &mut planned).is_ok());
    }

    #[test]
    fn test_fill_legacy_defaults() {
        let mut state = Map::new();
        state.insert("special".to_string(), json!(false));
        state.insert("keepers".to_string(), json!({}));
        fill_legacy_defaults(&mut state);
        assert_eq!(state["special"], json!(false));
        assert_eq!(state["upper"], json!(true));
        assert_eq!(state["number"], json!(true));
        assert_eq!(state["min_numeric"], json!(0));
        assert_eq!(state["keepers"], Value::Null);
    }

    #[test]
    fn test_copy_number_to_numeric() {
        let mut state = Map::new();
        state.insert("number".to_string(), json!(false));
        copy_number_to_numeric(&mut state);
        assert_eq!(state["numeric"], json!(false));
    }
}
