//! The shared plan engine.
//!
//! Plans are computed from the schema alone plus one resource hook
//! ([`Resource::modify_plan`]). The engine applies defaults, diffs the
//! configurable attributes against prior state, and decides whether the
//! diff forces replacement according to each attribute's
//! [`ReplaceTrigger`].

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ProviderError;
use crate::keepers;
use crate::resource::Resource;
use crate::schema::{ReplaceTrigger, Schema};
use crate::types::{AttributeChange, PlanResult};
use crate::validation::value_type_name;

/// Fill null attributes that have a schema default.
pub fn apply_defaults(schema: &Schema, state: &mut Map<String, Value>) {
    for (name, attr) in &schema.block.attributes {
        if let Some(default) = &attr.default {
            let entry = state.entry(name.clone()).or_insert(Value::Null);
            if entry.is_null() {
                *entry = default.clone();
            }
        }
    }
}

/// Copy computed values from `prior` into `planned` wherever `planned` has none.
///
/// Both sides must be objects.
pub fn carry_computed(
    schema: &Schema,
    prior: &Value,
    planned: Value,
) -> Result<Value, ProviderError> {
    let Some(prior) = prior.as_object() else {
        return Err(ProviderError::InvalidRequest(format!(
            "prior state must be an object, got {}",
            value_type_name(prior)
        )));
    };
    let mut planned = match planned {
        Value::Object(map) => map,
        other => {
            return Err(ProviderError::InvalidRequest(format!(
                "planned state must be an object, got {}",
                value_type_name(&other)
            )))
        },
    };
    for (name, attr) in &schema.block.attributes {
        if !attr.flags.computed {
            continue;
        }
        let current = planned.get(name).unwrap_or(&Value::Null);
        if current.is_null() {
            if let Some(value) = prior.get(name) {
                planned.insert(name.clone(), value.clone());
            }
        }
    }
    Ok(Value::Object(planned))
}

fn clear_computed(schema: &Schema, planned: &mut Map<String, Value>) {
    for (name, attr) in &schema.block.attributes {
        if attr.flags.is_computed_only() {
            planned.insert(name.clone(), Value::Null);
        }
    }
}

/// Plan a create, update, replace or destroy of `resource`.
pub fn plan(
    resource: &dyn Resource,
    prior_state: Option<Value>,
    proposed_state: Value,
    config: &Value,
) -> Result<PlanResult, ProviderError> {
    let schema = resource.schema();
    let prior_state = prior_state.filter(|p| !p.is_null());
    if let Some(prior) = prior_state.as_ref().filter(|p| !p.is_object()) {
        return Err(ProviderError::InvalidRequest(format!(
            "prior state for {} must be an object, got {}",
            resource.type_name(),
            value_type_name(prior)
        )));
    }

    let mut planned = match proposed_state {
        Value::Null => return Ok(plan_destroy(prior_state.as_ref())),
        Value::Object(map) => map,
        other => {
            return Err(ProviderError::InvalidRequest(format!(
                "proposed state for {} must be an object, got {}",
                resource.type_name(),
                value_type_name(&other)
            )))
        },
    };

    apply_defaults(&schema, &mut planned);
    resource.modify_plan(config, &mut planned)?;

    let Some(prior) = prior_state else {
        clear_computed(&schema, &mut planned);
        let changes = schema
            .block
            .attribute_names()
            .into_iter()
            .filter(|name| schema.attribute(name).is_some_and(|a| !a.flags.is_computed_only()))
            .filter_map(|name| {
                planned
                    .get(name)
                    .filter(|v| !v.is_null())
                    .map(|v| AttributeChange::added(name, v.clone()))
            })
            .collect();
        debug!(resource_type = resource.type_name(), "planned create");
        return Ok(PlanResult::with_changes(Value::Object(planned), changes, false));
    };

    let mut changes = Vec::new();
    let mut requires_replace = false;
    for name in schema.block.attribute_names() {
        let Some(attr) = schema.attribute(name) else {
            continue;
        };
        if attr.flags.is_computed_only() {
            continue;
        }
        let before = prior.get(name).cloned().unwrap_or(Value::Null);
        let after = planned.get(name).cloned().unwrap_or(Value::Null);
        if before == after {
            continue;
        }
        let replaces = match attr.replace {
            ReplaceTrigger::Never => false,
            ReplaceTrigger::OnChange => true,
            ReplaceTrigger::OnNonNullChange => keepers::requires_replace(&before, &after),
        };
        if replaces {
            debug!(
                resource_type = resource.type_name(),
                attribute = name,
                "change forces replacement"
            );
        }
        requires_replace |= replaces;
        changes.push(AttributeChange::modified(name, before, after));
    }

    if changes.is_empty() {
        return Ok(PlanResult::no_change(carry_computed(
            &schema,
            &prior,
            Value::Object(planned),
        )?));
    }

    let planned = if requires_replace {
        clear_computed(&schema, &mut planned);
        Value::Object(planned)
    } else {
        carry_computed(&schema, &prior, Value::Object(planned))?
    };
    Ok(PlanResult::with_changes(planned, changes, requires_replace))
}

fn plan_destroy(prior: Option<&Value>) -> PlanResult {
    let changes = prior
        .and_then(Value::as_object)
        .map(|obj| {
            let mut names: Vec<&String> = obj.keys().collect();
            names.sort();
            names
                .into_iter()
                .filter(|name| !obj[name.as_str()].is_null())
                .map(|name| AttributeChange::removed(name.as_str(), obj[name.as_str()].clone()))
                .collect()
        })
        .unwrap_or_default();
    PlanResult::with_changes(Value::Null, changes, false)
}
