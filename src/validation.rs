//! Schema validation helpers.
//!
//! Validates a `serde_json::Value` configuration against a [`Schema`]:
//! required attributes, value types, attribute validators and deprecation
//! warnings.
//!
//! # Example
//!
//! ```
//! use hemmer_provider_random::schema::{Attribute, Schema, Validator};
//! use hemmer_provider_random::validation::validate;
//! use serde_json::json;
//!
//! let schema = Schema::v0().with_attribute(
//!     "length",
//!     Attribute::required_int64().with_validator(Validator::AtLeast { min: 1 }),
//! );
//!
//! assert!(validate(&schema, &json!({"length": 16})).is_empty());
//!
//! let diagnostics = validate(&schema, &json!({"length": 0}));
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].attribute, Some("length".to_string()));
//! ```

use serde_json::{Map, Value};

use crate::schema::{has_errors, Attribute, AttributeType, Diagnostic, Schema, Validator};

/// Validate a JSON value against a schema.
///
/// Returns a list of diagnostics. Warnings (such as use of a deprecated
/// attribute) do not make the value invalid; see [`is_valid`].
///
/// # Validation Rules
///
/// - The root value must be an object (or null)
/// - Required attributes must be present and non-null
/// - Computed-only attributes are skipped
/// - Attribute types must match the schema
/// - Validators run only when the attribute is set and well-typed
pub fn validate(schema: &Schema, value: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    let obj = match value {
        Value::Object(map) => map,
        Value::Null => return diagnostics,
        other => {
            diagnostics.push(
                Diagnostic::error("Expected object")
                    .with_detail(format!("Got {}", value_type_name(other))),
            );
            return diagnostics;
        },
    };

    for name in schema.block.attribute_names() {
        if let Some(attr) = schema.attribute(name) {
            validate_attribute(attr, name, obj, &mut diagnostics);
        }
    }

    diagnostics
}

/// Validate a JSON value against a schema, returning Ok if valid or Err with diagnostics.
pub fn validate_result(schema: &Schema, value: &Value) -> Result<(), Vec<Diagnostic>> {
    let diagnostics = validate(schema, value);
    if has_errors(&diagnostics) {
        Err(diagnostics)
    } else {
        Ok(())
    }
}

/// Check if a JSON value is valid against a schema.
pub fn is_valid(schema: &Schema, value: &Value) -> bool {
    !has_errors(&validate(schema, value))
}

fn validate_attribute(
    attr: &Attribute,
    name: &str,
    obj: &Map<String, Value>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if attr.flags.is_computed_only() {
        return;
    }

    match obj.get(name) {
        None | Some(Value::Null) => {
            if attr.flags.required {
                diagnostics.push(
                    Diagnostic::error(format!("Missing required attribute '{}'", name))
                        .with_detail("This attribute is required and must be provided")
                        .with_attribute(name),
                );
            }
        },
        Some(value) => {
            let before = diagnostics.len();
            validate_attribute_type(&attr.attr_type, value, name, diagnostics);
            if diagnostics.len() > before {
                return;
            }

            for validator in &attr.validators {
                if let Some(diag) = check_validator(validator, value, name, obj) {
                    diagnostics.push(diag);
                }
            }

            if let Some(message) = &attr.deprecation {
                diagnostics.push(
                    Diagnostic::warning(format!("Attribute '{}' is deprecated", name))
                        .with_detail(message.clone())
                        .with_attribute(name),
                );
            }
        },
    }
}

fn validate_attribute_type(
    attr_type: &AttributeType,
    value: &Value,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match attr_type {
        AttributeType::String => {
            if !value.is_string() {
                diagnostics.push(type_error(path, "string", value));
            }
        },
        AttributeType::Int64 => {
            if !is_int64(value) {
                diagnostics.push(type_error(path, "int64", value));
            }
        },
        AttributeType::Float64 => {
            if !value.is_number() {
                diagnostics.push(type_error(path, "float64", value));
            }
        },
        AttributeType::Bool => {
            if !value.is_boolean() {
                diagnostics.push(type_error(path, "bool", value));
            }
        },
        AttributeType::List(element_type) | AttributeType::Set(element_type) => {
            if let Some(arr) = value.as_array() {
                for (i, elem) in arr.iter().enumerate() {
                    let elem_path = format!("{}.{}", path, i);
                    validate_attribute_type(element_type, elem, &elem_path, diagnostics);
                }
            } else {
                diagnostics.push(type_error(path, "list", value));
            }
        },
        AttributeType::Map(value_type) => {
            if let Some(obj) = value.as_object() {
                for (key, val) in obj {
                    // Null map entries are allowed; they are ignored by keepers.
                    if val.is_null() {
                        continue;
                    }
                    let key_path = format!("{}.{}", path, key);
                    validate_attribute_type(value_type, val, &key_path, diagnostics);
                }
            } else {
                diagnostics.push(type_error(path, "map", value));
            }
        },
        AttributeType::Dynamic => {},
    }
}

fn check_validator(
    validator: &Validator,
    value: &Value,
    path: &str,
    obj: &Map<String, Value>,
) -> Option<Diagnostic> {
    match validator {
        Validator::AtLeast { min } => {
            let v = value.as_i64()?;
            (v < *min).then(|| {
                invalid_value(
                    path,
                    format!("Attribute {} value must be at least {}, got: {}", path, min, v),
                )
            })
        },
        Validator::OneOf { values } => {
            let v = value.as_str()?;
            (!values.iter().any(|allowed| allowed == v)).then(|| {
                invalid_value(
                    path,
                    format!(
                        "Attribute {} value must be one of: {:?}, got: {:?}",
                        path, values, v
                    ),
                )
            })
        },
        Validator::AtLeastSumOf { attributes } => {
            let v = value.as_i64()?;
            let sum: i64 = attributes
                .iter()
                .filter_map(|name| obj.get(name).and_then(Value::as_i64))
                .fold(0i64, |acc, n| acc.saturating_add(n));
            (v < sum).then(|| {
                invalid_value(
                    path,
                    format!(
                        "Attribute {} value must be at least sum of {}, got: {}",
                        path,
                        attributes.join(" + "),
                        v
                    ),
                )
            })
        },
    }
}

fn invalid_value(path: &str, detail: String) -> Diagnostic {
    Diagnostic::error("Invalid Attribute Value")
        .with_detail(detail)
        .with_attribute(path)
}

pub(crate) fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// Integral floats such as `12.0` do not decode into i64 model fields.
fn is_int64(value: &Value) -> bool {
    value.as_i64().is_some()
}

fn type_error(path: &str, expected: &str, got: &Value) -> Diagnostic {
    Diagnostic::error(format!("Invalid type for attribute '{}'", path))
        .with_detail(format!(
            "Expected {}, got {}",
            expected,
            value_type_name(got)
        ))
        .with_attribute(path)
}
