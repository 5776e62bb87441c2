//! The random provider: dispatches protocol calls to resources by type name.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{debug, instrument};

use crate::ephemeral::{EphemeralPassword, EphemeralResource};
use crate::error::ProviderError;
use crate::plan;
use crate::resource::Resource;
use crate::resources;
use crate::schema::{Diagnostic, ProviderSchema, Schema};
use crate::server::ProviderService;
use crate::types::{ImportedResource, PlanResult};
use crate::validation;

/// Serves every random resource and the ephemeral password.
pub struct RandomProvider {
    resources: BTreeMap<&'static str, Box<dyn Resource>>,
    ephemeral: BTreeMap<&'static str, Box<dyn EphemeralResource>>,
}

impl RandomProvider {
    /// A provider with all built-in resources registered.
    pub fn new() -> Self {
        let resources = resources::all()
            .into_iter()
            .map(|r| (r.type_name(), r))
            .collect();
        let ephemeral: Vec<Box<dyn EphemeralResource>> = vec![Box::new(EphemeralPassword)];
        Self {
            resources,
            ephemeral: ephemeral.into_iter().map(|e| (e.type_name(), e)).collect(),
        }
    }

    fn resource(&self, resource_type: &str) -> Result<&dyn Resource, ProviderError> {
        self.resources
            .get(resource_type)
            .map(|r| r.as_ref())
            .ok_or_else(|| ProviderError::UnknownResource(resource_type.to_string()))
    }

    fn ephemeral_resource(&self, type_name: &str) -> Result<&dyn EphemeralResource, ProviderError> {
        self.ephemeral
            .get(type_name)
            .map(|e| e.as_ref())
            .ok_or_else(|| {
                ProviderError::UnknownResource(format!("ephemeral resource {}", type_name))
            })
    }
}

impl Default for RandomProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ProviderService for RandomProvider {
    fn schema(&self) -> ProviderSchema {
        let schema = self
            .resources
            .values()
            .fold(ProviderSchema::new(), |schema, r| {
                schema.with_resource(r.type_name(), r.schema())
            })
            .with_provider_config(Schema::v0().with_description(
                "The random provider supports the use of randomness within configurations. It \
                 takes no configuration.",
            ));
        self.ephemeral.values().fold(schema, |schema, e| {
            schema.with_ephemeral_resource(e.type_name(), e.schema())
        })
    }

    async fn configure(&self, _config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(vec![])
    }

    #[instrument(skip(self, config))]
    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let resource = self.resource(resource_type)?;
        let mut diagnostics = validation::validate(&resource.schema(), &config);
        diagnostics.extend(resource.validate_config(&config));
        debug!(diagnostics = diagnostics.len(), "validated resource config");
        Ok(diagnostics)
    }

    #[instrument(skip(self, state))]
    async fn upgrade_resource_state(
        &self,
        resource_type: &str,
        version: i64,
        state: Value,
    ) -> Result<Value, ProviderError> {
        self.resource(resource_type)?.upgrade_state(version, state)
    }

    #[instrument(skip(self, prior_state, proposed_state, config))]
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError> {
        let resource = self.resource(resource_type)?;
        plan::plan(resource, prior_state, proposed_state, &config)
    }

    #[instrument(skip(self, planned_state))]
    async fn create(
        &self,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        self.resource(resource_type)?.create(planned_state)
    }

    #[instrument(skip(self, current_state))]
    async fn read(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Value, ProviderError> {
        self.resource(resource_type)?.read(current_state)
    }

    #[instrument(skip(self, prior_state, planned_state))]
    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        self.resource(resource_type)?.update(prior_state, planned_state)
    }

    #[instrument(skip(self, _current_state))]
    async fn delete(
        &self,
        resource_type: &str,
        _current_state: Value,
    ) -> Result<(), ProviderError> {
        // Nothing exists outside of state.
        self.resource(resource_type)?;
        Ok(())
    }

    #[instrument(skip(self, id))]
    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        let state = self.resource(resource_type)?.import(id)?;
        Ok(vec![ImportedResource::new(resource_type, state)])
    }

    #[instrument(skip(self, config))]
    async fn validate_ephemeral_resource_config(
        &self,
        ephemeral_resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(self
            .ephemeral_resource(ephemeral_resource_type)?
            .validate_config(&config))
    }

    #[instrument(skip(self, config))]
    async fn open_ephemeral_resource(
        &self,
        ephemeral_resource_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        self.ephemeral_resource(ephemeral_resource_type)?.open(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::hash::hash_matches;
    use crate::testing::{
        assert_plan_no_changes, assert_plan_replaces, assert_plan_updates_in_place, ProviderTester,
    };
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_schema_lists_everything() {
        let schema = RandomProvider::new().schema();
        assert_eq!(schema.resources.len(), 9);
        assert!(schema.ephemeral_resources.contains_key("random_password"));
        assert!(schema.data_sources.is_empty());
        assert!(schema.provider.block.attributes.is_empty());
        assert_eq!(schema.resources["random_password"].version, 3);
        assert_eq!(schema.resources["random_string"].version, 2);
    }

    #[test]
    fn test_metadata_is_sorted() {
        let metadata = RandomProvider::new().metadata();
        let mut sorted = metadata.resources.clone();
        sorted.sort();
        assert_eq!(metadata.resources, sorted);
        assert_eq!(metadata.ephemeral_resources, vec!["random_password"]);
    }

    #[tokio::test]
    async fn test_unknown_resource() {
        let provider = RandomProvider::new();
        let err = provider.create("random_nothing", json!({})).await.unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource(_)));
        assert_err!(provider.delete("random_nothing", json!({})).await);
    }

    #[tokio::test]
    async fn test_validate_resource_config_combines_checks() {
        let provider = RandomProvider::new();
        let diags = assert_ok!(
            provider
                .validate_resource_config("random_integer", json!({"min": 5, "max": 1}))
                .await
        );
        assert_eq!(diags.len(), 1);

        let diags = assert_ok!(
            provider
                .validate_resource_config("random_string", json!({"length": 2, "min_upper": 3}))
                .await
        );
        assert!(diags.iter().any(|d| d.attribute.as_deref() == Some("length")));

        let diags = assert_ok!(
            provider
                .validate_resource_config("random_string", json!({"length": 8, "number": true}))
                .await
        );
        assert_eq!(diags.len(), 1);
        assert!(!diags[0].is_error());
    }

    #[tokio::test]
    async fn test_password_lifecycle() {
        let tester = ProviderTester::new(RandomProvider::new());
        let config = json!({"length": 24, "min_special": 4});

        let state = tester.lifecycle_create("random_password", config.clone()).await.unwrap();
        let result = state["result"].as_str().unwrap().to_string();
        assert_eq!(result.chars().count(), 24);

        // Same config: nothing to do.
        let plan = tester
            .plan_update("random_password", state.clone(), config.clone())
            .await
            .unwrap();
        assert_plan_no_changes(&plan);

        // Empty keepers are the same as none.
        let mut with_empty_keepers = config.clone();
        with_empty_keepers["keepers"] = json!({});
        let plan = tester
            .plan_update("random_password", state.clone(), with_empty_keepers)
            .await
            .unwrap();
        assert_plan_updates_in_place(&plan);

        // A real keeper value forces a new password.
        let mut with_keepers = config.clone();
        with_keepers["keepers"] = json!({"rotation": "2024-01"});
        let plan = tester
            .plan_update("random_password", state.clone(), with_keepers)
            .await
            .unwrap();
        assert_plan_replaces(&plan);
        assert!(plan.planned_state["result"].is_null());

        tester.delete("random_password", state).await.unwrap();
    }

    #[tokio::test]
    async fn test_in_place_keepers_update_keeps_result() {
        let tester = ProviderTester::new(RandomProvider::new());
        let config = json!({"byte_length": 4, "keepers": {"a": "1", "b": null}});
        let state = tester.lifecycle_create("random_id", config).await.unwrap();

        let updated_config = json!({"byte_length": 4, "keepers": {"a": "1"}});
        let plan = tester
            .plan_update("random_id", state.clone(), updated_config)
            .await
            .unwrap();
        assert_plan_updates_in_place(&plan);

        let updated = tester
            .update("random_id", state.clone(), plan.planned_state)
            .await
            .unwrap();
        assert_eq!(updated["id"], state["id"]);
        assert_eq!(updated["keepers"], json!({"a": "1"}));
    }

    #[tokio::test]
    async fn test_import_and_upgrade() {
        let tester = ProviderTester::new(RandomProvider::new());
        let imported = tester.import_resource("random_integer", "1,10,5").await.unwrap();
        assert_eq!(imported.len(), 1);
        assert_eq!(imported[0].resource_type, "random_integer");
        assert_eq!(imported[0].state["result"], 5);

        let upgraded = tester
            .upgrade_resource_state(
                "random_string",
                1,
                json!({"id": "ab", "result": "ab", "length": 2, "number": false, "keepers": {}}),
            )
            .await
            .unwrap();
        assert_eq!(upgraded["numeric"], false);

        let err = tester
            .upgrade_resource_state("random_uuid", 1, json!({"id": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::StateUpgrade(_)));
    }

    #[tokio::test]
    async fn test_open_ephemeral_password() {
        let tester = ProviderTester::new(RandomProvider::new());
        let opened = tester
            .open_ephemeral_resource("random_password", json!({"length": 10, "special": false}))
            .await
            .unwrap();
        assert_eq!(opened["result"].as_str().unwrap().len(), 10);

        let err = tester
            .open_ephemeral_resource("random_string", json!({"length": 10}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource(_)));
    }

    #[tokio::test]
    async fn test_plan_rejects_conflicting_number_and_numeric() {
        let tester = ProviderTester::new(RandomProvider::new());
        for resource_type in ["random_password", "random_string"] {
            let err = tester
                .plan_create(resource_type, json!({"length": 8, "number": true, "numeric": false}))
                .await
                .unwrap_err();
            assert!(matches!(err, ProviderError::Validation(_)), "{resource_type}");
        }

        let plan = tester
            .plan_create("random_string", json!({"length": 8, "number": false}))
            .await
            .unwrap();
        assert_eq!(plan.planned_state["numeric"], false);
    }

    #[tokio::test]
    async fn test_long_password_hash_covers_first_72_bytes() {
        let tester = ProviderTester::new(RandomProvider::new());
        let state = tester
            .lifecycle_create("random_password", json!({"length": 100}))
            .await
            .unwrap();
        let result = state["result"].as_str().unwrap();
        let hash = state["bcrypt_hash"].as_str().unwrap();
        assert_eq!(result.len(), 100);
        assert!(hash_matches(hash, result));

        let same_prefix = format!("{}{}", &result[..72], "x".repeat(28));
        assert!(hash_matches(hash, &same_prefix));
        let first = if result.starts_with('a') { "b" } else { "a" };
        let other_prefix = format!("{}{}", first, &result[1..]);
        assert!(!hash_matches(hash, &other_prefix));
    }

    #[tokio::test]
    async fn test_ipv6_range_needs_ipv6_address_type() {
        let provider = RandomProvider::new();
        let diags = assert_ok!(
            provider
                .validate_resource_config("random_ip", json!({"cidr_range": "fd00::/64"}))
                .await
        );
        assert_eq!(diags.len(), 1);
        assert!(diags[0].is_error());
        assert_eq!(diags[0].attribute.as_deref(), Some("cidr_range"));

        let diags = assert_ok!(
            provider
                .validate_resource_config(
                    "random_ip",
                    json!({"address_type": "ipv6", "cidr_range": "fd00::/64"})
                )
                .await
        );
        assert!(diags.is_empty());
    }

    #[tokio::test]
    async fn test_integral_float_length_is_a_type_error() {
        let provider = RandomProvider::new();
        let diags = assert_ok!(
            provider
                .validate_resource_config("random_string", json!({"length": 12.0}))
                .await
        );
        assert_eq!(diags.len(), 1);
        assert!(diags[0].is_error());
        assert_eq!(diags[0].attribute.as_deref(), Some("length"));
    }

    #[tokio::test]
    async fn test_data_sources_unknown() {
        let provider = RandomProvider::new();
        let err = provider
            .read_data_source("random_anything", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource(_)));
    }
}
