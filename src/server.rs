//! Server helpers for running the provider.
//!
//! This module provides the `ProviderService` trait and the `serve` family
//! of functions that start a gRPC server with the handshake protocol.
//!
//! # Signal Handling
//!
//! The server handles OS signals (SIGTERM, SIGINT) for graceful shutdown.
//! When a signal is received, the server:
//! 1. Stops accepting new connections
//! 2. Waits for in-flight requests to complete, bounded by
//!    [`ServeOptions::shutdown_timeout`]
//! 3. Calls the provider's `stop()` method
//! 4. Exits cleanly

use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tonic::transport::Server;
use tracing::{debug, error, info, instrument, warn};

use crate::error::ProviderError;
use crate::proto;
use crate::schema::{
    has_errors, Diagnostic, DiagnosticSeverity, ProviderSchema, ReplaceTrigger, Schema,
};
use crate::types::{
    ImportedResource, PlanResult, ProviderMetadata, HANDSHAKE_PREFIX, PROTOCOL_VERSION,
};

/// Environment variable holding the listen address.
pub const ADDR_ENV: &str = "HEMMER_PROVIDER_ADDR";

/// Environment variable holding the shutdown timeout in seconds.
pub const SHUTDOWN_TIMEOUT_ENV: &str = "HEMMER_PROVIDER_SHUTDOWN_TIMEOUT";

/// Trait that provider implementations must implement.
///
/// This provides a higher-level API than the raw gRPC trait, using
/// JSON values instead of encoded protobuf payloads.
#[async_trait::async_trait]
pub trait ProviderService: Send + Sync + 'static {
    // =========================================================================
    // Schema & Metadata
    // =========================================================================

    /// Return the provider's schema including all resources.
    fn schema(&self) -> ProviderSchema;

    /// Return provider metadata. By default, this is derived from the schema.
    fn metadata(&self) -> ProviderMetadata {
        let schema = self.schema();
        ProviderMetadata {
            resources: sorted_names(&schema.resources),
            data_sources: sorted_names(&schema.data_sources),
            ephemeral_resources: sorted_names(&schema.ephemeral_resources),
            capabilities: Default::default(),
        }
    }

    // =========================================================================
    // Provider Lifecycle
    // =========================================================================

    /// Validate the provider configuration before configuring.
    async fn validate_provider_config(
        &self,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = config;
        Ok(vec![])
    }

    /// Configure the provider.
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError>;

    /// Stop the provider gracefully.
    async fn stop(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    // =========================================================================
    // Resource Operations
    // =========================================================================

    /// Validate a resource's configuration before planning.
    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = (resource_type, config);
        Ok(vec![])
    }

    /// Upgrade resource state from an older schema version.
    async fn upgrade_resource_state(
        &self,
        resource_type: &str,
        version: i64,
        state: Value,
    ) -> Result<Value, ProviderError> {
        let _ = (resource_type, version);
        Ok(state)
    }

    /// Plan changes for a resource.
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError>;

    /// Create a new resource.
    async fn create(
        &self,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError>;

    /// Read the current state of a resource.
    async fn read(&self, resource_type: &str, current_state: Value) -> Result<Value, ProviderError>;

    /// Update an existing resource.
    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError>;

    /// Delete a resource.
    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError>;

    /// Import an existing value into management.
    async fn import_resource(
        &self,
        resource_type: &str,
        _id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        Err(ProviderError::Unimplemented(format!(
            "Import not supported for resource type: {}",
            resource_type
        )))
    }

    // =========================================================================
    // Data Source Operations
    // =========================================================================

    /// Validate a data source's configuration.
    async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        _config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        Err(ProviderError::UnknownResource(format!(
            "Unknown data source type: {}",
            data_source_type
        )))
    }

    /// Read data from an external source.
    async fn read_data_source(
        &self,
        data_source_type: &str,
        _config: Value,
    ) -> Result<Value, ProviderError> {
        Err(ProviderError::UnknownResource(format!(
            "Unknown data source type: {}",
            data_source_type
        )))
    }

    // =========================================================================
    // Ephemeral Resource Operations
    // =========================================================================

    /// Validate an ephemeral resource's configuration.
    async fn validate_ephemeral_resource_config(
        &self,
        ephemeral_resource_type: &str,
        _config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        Err(ProviderError::UnknownResource(format!(
            "Unknown ephemeral resource type: {}",
            ephemeral_resource_type
        )))
    }

    /// Produce the value of an ephemeral resource. Nothing is persisted.
    async fn open_ephemeral_resource(
        &self,
        ephemeral_resource_type: &str,
        _config: Value,
    ) -> Result<Value, ProviderError> {
        Err(ProviderError::UnknownResource(format!(
            "Unknown ephemeral resource type: {}",
            ephemeral_resource_type
        )))
    }
}

fn sorted_names(schemas: &HashMap<String, Schema>) -> Vec<String> {
    let mut names: Vec<String> = schemas.keys().cloned().collect();
    names.sort();
    names
}

/// Wrapper that implements the generated gRPC trait.
struct ProviderGrpcService<P: ProviderService> {
    provider: Arc<P>,
}

fn diagnostics_to_proto(diagnostics: Vec<Diagnostic>) -> Vec<proto::Diagnostic> {
    diagnostics
        .into_iter()
        .map(|d| proto::Diagnostic {
            severity: match d.severity {
                DiagnosticSeverity::Error => proto::diagnostic::Severity::Error as i32,
                DiagnosticSeverity::Warning => proto::diagnostic::Severity::Warning as i32,
            },
            summary: d.summary,
            detail: d.detail.unwrap_or_default(),
            attribute: d.attribute.unwrap_or_default(),
        })
        .collect()
}

fn error_to_diagnostics(err: ProviderError) -> Vec<proto::Diagnostic> {
    vec![proto::Diagnostic {
        severity: proto::diagnostic::Severity::Error as i32,
        summary: err.to_string(),
        detail: String::new(),
        attribute: String::new(),
    }]
}

/// Decode a JSON payload. Empty bytes mean the value is absent.
fn decode_json(bytes: &[u8]) -> Result<Value, ProviderError> {
    Ok(decode_optional_json(bytes)?.unwrap_or(Value::Null))
}

fn decode_optional_json(bytes: &[u8]) -> Result<Option<Value>, ProviderError> {
    if bytes.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_slice(bytes)?))
}

fn encode_json(value: &Value) -> Vec<u8> {
    serde_json::to_vec(value).unwrap_or_default()
}

fn replace_trigger_name(trigger: ReplaceTrigger) -> &'static str {
    match trigger {
        ReplaceTrigger::Never => "never",
        ReplaceTrigger::OnChange => "on_change",
        ReplaceTrigger::OnNonNullChange => "on_non_null_change",
    }
}

fn schema_to_proto(schema: &Schema) -> proto::Schema {
    let names = schema.block.attribute_names();
    proto::Schema {
        version: schema.version as i64,
        block: Some(proto::Block {
            attributes: names
                .into_iter()
                .filter_map(|name| schema.attribute(name).map(|attr| (name, attr)))
                .map(|(name, attr)| proto::Attribute {
                    name: name.to_string(),
                    r#type: serde_json::to_vec(&attr.attr_type).unwrap_or_default(),
                    required: attr.flags.required,
                    optional: attr.flags.optional,
                    computed: attr.flags.computed,
                    sensitive: attr.flags.sensitive,
                    description: attr.description.clone().unwrap_or_default(),
                    force_new: attr.force_new(),
                    default_value: attr
                        .default
                        .as_ref()
                        .map(encode_json)
                        .unwrap_or_default(),
                    deprecation_message: attr.deprecation.clone().unwrap_or_default(),
                    validators: if attr.validators.is_empty() {
                        Vec::new()
                    } else {
                        serde_json::to_vec(&attr.validators).unwrap_or_default()
                    },
                    replace_trigger: replace_trigger_name(attr.replace).to_string(),
                })
                .collect(),
            description: schema.block.description.clone().unwrap_or_default(),
        }),
    }
}

fn schemas_to_proto(schemas: &HashMap<String, Schema>) -> HashMap<String, proto::Schema> {
    schemas
        .iter()
        .map(|(k, v)| (k.clone(), schema_to_proto(v)))
        .collect()
}

fn log_diagnostics(operation: &str, type_name: &str, diagnostics: &[Diagnostic]) {
    if has_errors(diagnostics) {
        warn!(
            type_name,
            diagnostics = diagnostics.len(),
            "{} completed with errors",
            operation
        );
    } else {
        info!(type_name, "{} completed successfully", operation);
    }
}

#[tonic::async_trait]
impl<P: ProviderService> proto::provider_server::Provider for ProviderGrpcService<P> {
    #[instrument(skip(self, _request), name = "grpc.get_metadata")]
    async fn get_metadata(
        &self,
        _request: tonic::Request<proto::GetMetadataRequest>,
    ) -> Result<tonic::Response<proto::GetMetadataResponse>, tonic::Status> {
        debug!("GetMetadata called");
        let metadata = self.provider.metadata();
        info!(
            resources = metadata.resources.len(),
            ephemeral_resources = metadata.ephemeral_resources.len(),
            "GetMetadata completed"
        );
        Ok(tonic::Response::new(proto::GetMetadataResponse {
            server_capabilities: Some(proto::ServerCapabilities {
                plan_destroy: metadata.capabilities.plan_destroy,
            }),
            resources: metadata.resources,
            data_sources: metadata.data_sources,
            diagnostics: vec![],
            ephemeral_resources: metadata.ephemeral_resources,
        }))
    }

    #[instrument(skip(self, _request), name = "grpc.get_schema")]
    async fn get_schema(
        &self,
        _request: tonic::Request<proto::GetSchemaRequest>,
    ) -> Result<tonic::Response<proto::GetSchemaResponse>, tonic::Status> {
        debug!("GetSchema called");
        let schema = self.provider.schema();
        info!(
            resources = schema.resources.len(),
            ephemeral_resources = schema.ephemeral_resources.len(),
            "GetSchema completed"
        );
        Ok(tonic::Response::new(proto::GetSchemaResponse {
            provider: Some(schema_to_proto(&schema.provider)),
            resources: schemas_to_proto(&schema.resources),
            data_sources: schemas_to_proto(&schema.data_sources),
            diagnostics: vec![],
            ephemeral_resources: schemas_to_proto(&schema.ephemeral_resources),
        }))
    }

    #[instrument(skip(self, request), name = "grpc.validate_provider_config")]
    async fn validate_provider_config(
        &self,
        request: tonic::Request<proto::ValidateProviderConfigRequest>,
    ) -> Result<tonic::Response<proto::ValidateProviderConfigResponse>, tonic::Status> {
        debug!("ValidateProviderConfig called");
        let result = async {
            let config = decode_json(&request.into_inner().config)?;
            self.provider.validate_provider_config(config).await
        }
        .await;

        let diagnostics = match result {
            Ok(diagnostics) => {
                log_diagnostics("ValidateProviderConfig", "provider", &diagnostics);
                diagnostics_to_proto(diagnostics)
            },
            Err(e) => {
                error!(error = %e, "ValidateProviderConfig failed");
                error_to_diagnostics(e)
            },
        };
        Ok(tonic::Response::new(proto::ValidateProviderConfigResponse {
            diagnostics,
        }))
    }

    #[instrument(skip(self, request), name = "grpc.configure")]
    async fn configure(
        &self,
        request: tonic::Request<proto::ConfigureRequest>,
    ) -> Result<tonic::Response<proto::ConfigureResponse>, tonic::Status> {
        debug!("Configure called");
        let result = async {
            let config = decode_json(&request.into_inner().config)?;
            self.provider.configure(config).await
        }
        .await;

        let diagnostics = match result {
            Ok(diagnostics) => {
                log_diagnostics("Configure", "provider", &diagnostics);
                diagnostics_to_proto(diagnostics)
            },
            Err(e) => {
                error!(error = %e, "Configure failed");
                error_to_diagnostics(e)
            },
        };
        Ok(tonic::Response::new(proto::ConfigureResponse { diagnostics }))
    }

    #[instrument(skip(self, _request), name = "grpc.stop")]
    async fn stop(
        &self,
        _request: tonic::Request<proto::StopRequest>,
    ) -> Result<tonic::Response<proto::StopResponse>, tonic::Status> {
        info!("Stop called");
        let error = match self.provider.stop().await {
            Ok(()) => {
                info!("Stop completed successfully");
                String::new()
            },
            Err(e) => {
                error!(error = %e, "Stop failed");
                e.to_string()
            },
        };
        Ok(tonic::Response::new(proto::StopResponse { error }))
    }

    #[instrument(skip(self, request), name = "grpc.validate_resource_config")]
    async fn validate_resource_config(
        &self,
        request: tonic::Request<proto::ValidateResourceConfigRequest>,
    ) -> Result<tonic::Response<proto::ValidateResourceConfigResponse>, tonic::Status> {
        let req = request.into_inner();
        debug!(resource_type = %req.resource_type, "ValidateResourceConfig called");
        let result = async {
            let config = decode_json(&req.config)?;
            self.provider
                .validate_resource_config(&req.resource_type, config)
                .await
        }
        .await;

        let diagnostics = match result {
            Ok(diagnostics) => {
                log_diagnostics("ValidateResourceConfig", &req.resource_type, &diagnostics);
                diagnostics_to_proto(diagnostics)
            },
            Err(e) => {
                error!(
                    resource_type = %req.resource_type,
                    error = %e,
                    "ValidateResourceConfig failed"
                );
                error_to_diagnostics(e)
            },
        };
        Ok(tonic::Response::new(proto::ValidateResourceConfigResponse {
            diagnostics,
        }))
    }

    #[instrument(skip(self, request), name = "grpc.upgrade_resource_state")]
    async fn upgrade_resource_state(
        &self,
        request: tonic::Request<proto::UpgradeResourceStateRequest>,
    ) -> Result<tonic::Response<proto::UpgradeResourceStateResponse>, tonic::Status> {
        let req = request.into_inner();
        debug!(
            resource_type = %req.resource_type,
            version = req.version,
            "UpgradeResourceState called"
        );
        let result = async {
            let state = decode_json(&req.raw_state)?;
            self.provider
                .upgrade_resource_state(&req.resource_type, req.version, state)
                .await
        }
        .await;

        let response = match result {
            Ok(upgraded) => {
                info!(
                    resource_type = %req.resource_type,
                    from_version = req.version,
                    "UpgradeResourceState completed"
                );
                proto::UpgradeResourceStateResponse {
                    upgraded_state: encode_json(&upgraded),
                    diagnostics: vec![],
                }
            },
            Err(e) => {
                error!(
                    resource_type = %req.resource_type,
                    version = req.version,
                    error = %e,
                    "UpgradeResourceState failed"
                );
                proto::UpgradeResourceStateResponse {
                    upgraded_state: vec![],
                    diagnostics: error_to_diagnostics(e),
                }
            },
        };
        Ok(tonic::Response::new(response))
    }

    #[instrument(skip(self, request), name = "grpc.plan")]
    async fn plan(
        &self,
        request: tonic::Request<proto::PlanRequest>,
    ) -> Result<tonic::Response<proto::PlanResponse>, tonic::Status> {
        let req = request.into_inner();
        let is_create = req.prior_state.is_empty();
        debug!(resource_type = %req.resource_type, is_create, "Plan called");

        let result = async {
            let prior_state = decode_optional_json(&req.prior_state)?;
            let proposed_state = decode_json(&req.proposed_state)?;
            let config = decode_json(&req.config)?;
            self.provider
                .plan(&req.resource_type, prior_state, proposed_state, config)
                .await
        }
        .await;

        let response = match result {
            Ok(result) => {
                info!(
                    resource_type = %req.resource_type,
                    changes = result.changes.len(),
                    requires_replace = result.requires_replace,
                    "Plan completed"
                );
                proto::PlanResponse {
                    planned_state: encode_json(&result.planned_state),
                    changes: result.changes.into_iter().map(Into::into).collect(),
                    requires_replace: result.requires_replace,
                    diagnostics: vec![],
                }
            },
            Err(e) => {
                error!(resource_type = %req.resource_type, error = %e, "Plan failed");
                proto::PlanResponse {
                    planned_state: vec![],
                    changes: vec![],
                    requires_replace: false,
                    diagnostics: error_to_diagnostics(e),
                }
            },
        };
        Ok(tonic::Response::new(response))
    }

    #[instrument(skip(self, request), name = "grpc.create")]
    async fn create(
        &self,
        request: tonic::Request<proto::CreateRequest>,
    ) -> Result<tonic::Response<proto::CreateResponse>, tonic::Status> {
        let req = request.into_inner();
        info!(resource_type = %req.resource_type, "Create called");
        let result = async {
            let planned_state = decode_json(&req.planned_state)?;
            self.provider.create(&req.resource_type, planned_state).await
        }
        .await;

        let response = match result {
            Ok(state) => {
                info!(resource_type = %req.resource_type, "Create completed successfully");
                proto::CreateResponse {
                    state: encode_json(&state),
                    diagnostics: vec![],
                }
            },
            Err(e) => {
                error!(resource_type = %req.resource_type, error = %e, "Create failed");
                proto::CreateResponse {
                    state: vec![],
                    diagnostics: error_to_diagnostics(e),
                }
            },
        };
        Ok(tonic::Response::new(response))
    }

    #[instrument(skip(self, request), name = "grpc.read")]
    async fn read(
        &self,
        request: tonic::Request<proto::ReadRequest>,
    ) -> Result<tonic::Response<proto::ReadResponse>, tonic::Status> {
        let req = request.into_inner();
        debug!(resource_type = %req.resource_type, "Read called");
        let result = async {
            let current_state = decode_json(&req.current_state)?;
            self.provider.read(&req.resource_type, current_state).await
        }
        .await;

        let response = match result {
            Ok(state) => {
                debug!(resource_type = %req.resource_type, "Read completed successfully");
                proto::ReadResponse {
                    state: encode_json(&state),
                    diagnostics: vec![],
                }
            },
            Err(e) => {
                error!(resource_type = %req.resource_type, error = %e, "Read failed");
                proto::ReadResponse {
                    state: vec![],
                    diagnostics: error_to_diagnostics(e),
                }
            },
        };
        Ok(tonic::Response::new(response))
    }

    #[instrument(skip(self, request), name = "grpc.update")]
    async fn update(
        &self,
        request: tonic::Request<proto::UpdateRequest>,
    ) -> Result<tonic::Response<proto::UpdateResponse>, tonic::Status> {
        let req = request.into_inner();
        info!(resource_type = %req.resource_type, "Update called");
        let result = async {
            let prior_state = decode_json(&req.prior_state)?;
            let planned_state = decode_json(&req.planned_state)?;
            self.provider
                .update(&req.resource_type, prior_state, planned_state)
                .await
        }
        .await;

        let response = match result {
            Ok(state) => {
                info!(resource_type = %req.resource_type, "Update completed successfully");
                proto::UpdateResponse {
                    state: encode_json(&state),
                    diagnostics: vec![],
                }
            },
            Err(e) => {
                error!(resource_type = %req.resource_type, error = %e, "Update failed");
                proto::UpdateResponse {
                    state: vec![],
                    diagnostics: error_to_diagnostics(e),
                }
            },
        };
        Ok(tonic::Response::new(response))
    }

    #[instrument(skip(self, request), name = "grpc.delete")]
    async fn delete(
        &self,
        request: tonic::Request<proto::DeleteRequest>,
    ) -> Result<tonic::Response<proto::DeleteResponse>, tonic::Status> {
        let req = request.into_inner();
        info!(resource_type = %req.resource_type, "Delete called");
        let result = async {
            let current_state = decode_json(&req.current_state)?;
            self.provider.delete(&req.resource_type, current_state).await
        }
        .await;

        let diagnostics = match result {
            Ok(()) => {
                info!(resource_type = %req.resource_type, "Delete completed successfully");
                vec![]
            },
            Err(e) => {
                error!(resource_type = %req.resource_type, error = %e, "Delete failed");
                error_to_diagnostics(e)
            },
        };
        Ok(tonic::Response::new(proto::DeleteResponse { diagnostics }))
    }

    // The import ID of a password is the secret itself, so it is never logged.
    #[instrument(skip(self, request), name = "grpc.import_resource_state")]
    async fn import_resource_state(
        &self,
        request: tonic::Request<proto::ImportResourceStateRequest>,
    ) -> Result<tonic::Response<proto::ImportResourceStateResponse>, tonic::Status> {
        let req = request.into_inner();
        info!(resource_type = %req.resource_type, "ImportResourceState called");

        let response = match self.provider.import_resource(&req.resource_type, &req.id).await {
            Ok(imported) => {
                info!(
                    resource_type = %req.resource_type,
                    imported_count = imported.len(),
                    "ImportResourceState completed"
                );
                proto::ImportResourceStateResponse {
                    imported: imported.into_iter().map(Into::into).collect(),
                    diagnostics: vec![],
                }
            },
            Err(e) => {
                error!(
                    resource_type = %req.resource_type,
                    error = %e,
                    "ImportResourceState failed"
                );
                proto::ImportResourceStateResponse {
                    imported: vec![],
                    diagnostics: error_to_diagnostics(e),
                }
            },
        };
        Ok(tonic::Response::new(response))
    }

    #[instrument(skip(self, request), name = "grpc.validate_data_source_config")]
    async fn validate_data_source_config(
        &self,
        request: tonic::Request<proto::ValidateDataSourceConfigRequest>,
    ) -> Result<tonic::Response<proto::ValidateDataSourceConfigResponse>, tonic::Status> {
        let req = request.into_inner();
        debug!(data_source_type = %req.data_source_type, "ValidateDataSourceConfig called");
        let result = async {
            let config = decode_json(&req.config)?;
            self.provider
                .validate_data_source_config(&req.data_source_type, config)
                .await
        }
        .await;

        let diagnostics = match result {
            Ok(diagnostics) => {
                log_diagnostics("ValidateDataSourceConfig", &req.data_source_type, &diagnostics);
                diagnostics_to_proto(diagnostics)
            },
            Err(e) => {
                error!(
                    data_source_type = %req.data_source_type,
                    error = %e,
                    "ValidateDataSourceConfig failed"
                );
                error_to_diagnostics(e)
            },
        };
        Ok(tonic::Response::new(proto::ValidateDataSourceConfigResponse {
            diagnostics,
        }))
    }

    #[instrument(skip(self, request), name = "grpc.read_data_source")]
    async fn read_data_source(
        &self,
        request: tonic::Request<proto::ReadDataSourceRequest>,
    ) -> Result<tonic::Response<proto::ReadDataSourceResponse>, tonic::Status> {
        let req = request.into_inner();
        debug!(data_source_type = %req.data_source_type, "ReadDataSource called");
        let result = async {
            let config = decode_json(&req.config)?;
            self.provider
                .read_data_source(&req.data_source_type, config)
                .await
        }
        .await;

        let response = match result {
            Ok(state) => {
                info!(
                    data_source_type = %req.data_source_type,
                    "ReadDataSource completed successfully"
                );
                proto::ReadDataSourceResponse {
                    state: encode_json(&state),
                    diagnostics: vec![],
                }
            },
            Err(e) => {
                error!(
                    data_source_type = %req.data_source_type,
                    error = %e,
                    "ReadDataSource failed"
                );
                proto::ReadDataSourceResponse {
                    state: vec![],
                    diagnostics: error_to_diagnostics(e),
                }
            },
        };
        Ok(tonic::Response::new(response))
    }

    #[instrument(skip(self, request), name = "grpc.validate_ephemeral_resource_config")]
    async fn validate_ephemeral_resource_config(
        &self,
        request: tonic::Request<proto::ValidateEphemeralResourceConfigRequest>,
    ) -> Result<tonic::Response<proto::ValidateEphemeralResourceConfigResponse>, tonic::Status> {
        let req = request.into_inner();
        debug!(
            ephemeral_resource_type = %req.ephemeral_resource_type,
            "ValidateEphemeralResourceConfig called"
        );
        let result = async {
            let config = decode_json(&req.config)?;
            self.provider
                .validate_ephemeral_resource_config(&req.ephemeral_resource_type, config)
                .await
        }
        .await;

        let diagnostics = match result {
            Ok(diagnostics) => {
                log_diagnostics(
                    "ValidateEphemeralResourceConfig",
                    &req.ephemeral_resource_type,
                    &diagnostics,
                );
                diagnostics_to_proto(diagnostics)
            },
            Err(e) => {
                error!(
                    ephemeral_resource_type = %req.ephemeral_resource_type,
                    error = %e,
                    "ValidateEphemeralResourceConfig failed"
                );
                error_to_diagnostics(e)
            },
        };
        Ok(tonic::Response::new(
            proto::ValidateEphemeralResourceConfigResponse { diagnostics },
        ))
    }

    #[instrument(skip(self, request), name = "grpc.open_ephemeral_resource")]
    async fn open_ephemeral_resource(
        &self,
        request: tonic::Request<proto::OpenEphemeralResourceRequest>,
    ) -> Result<tonic::Response<proto::OpenEphemeralResourceResponse>, tonic::Status> {
        let req = request.into_inner();
        info!(
            ephemeral_resource_type = %req.ephemeral_resource_type,
            "OpenEphemeralResource called"
        );
        let result = async {
            let config = decode_json(&req.config)?;
            self.provider
                .open_ephemeral_resource(&req.ephemeral_resource_type, config)
                .await
        }
        .await;

        let response = match result {
            Ok(result) => {
                info!(
                    ephemeral_resource_type = %req.ephemeral_resource_type,
                    "OpenEphemeralResource completed successfully"
                );
                proto::OpenEphemeralResourceResponse {
                    result: encode_json(&result),
                    diagnostics: vec![],
                }
            },
            Err(e) => {
                error!(
                    ephemeral_resource_type = %req.ephemeral_resource_type,
                    error = %e,
                    "OpenEphemeralResource failed"
                );
                proto::OpenEphemeralResourceResponse {
                    result: vec![],
                    diagnostics: error_to_diagnostics(e),
                }
            },
        };
        Ok(tonic::Response::new(response))
    }
}

/// Options for configuring the provider server.
#[derive(Debug, Clone)]
pub struct ServeOptions {
    /// Timeout for graceful shutdown. After receiving a shutdown signal,
    /// the server will wait this long for in-flight requests to complete.
    /// Default: 30 seconds.
    pub shutdown_timeout: Duration,
    /// Address to listen on. Default: `127.0.0.1:0`, an ephemeral port.
    pub bind_addr: SocketAddr,
}

impl Default for ServeOptions {
    fn default() -> Self {
        Self {
            shutdown_timeout: Duration::from_secs(30),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        }
    }
}

impl ServeOptions {
    /// Create new serve options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the shutdown timeout.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Set the listen address.
    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Read options from `HEMMER_PROVIDER_ADDR` and
    /// `HEMMER_PROVIDER_SHUTDOWN_TIMEOUT`, falling back to the defaults.
    pub fn from_env() -> Result<Self, ProviderError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ProviderError> {
        let mut options = Self::default();

        if let Some(raw) = lookup(ADDR_ENV).filter(|v| !v.trim().is_empty()) {
            options.bind_addr = raw.trim().parse().map_err(|e| {
                ProviderError::Configuration(format!(
                    "{} must be host:port, got {:?}: {}",
                    ADDR_ENV, raw, e
                ))
            })?;
        }

        if let Some(raw) = lookup(SHUTDOWN_TIMEOUT_ENV).filter(|v| !v.trim().is_empty()) {
            let secs: u64 = raw.trim().parse().map_err(|e| {
                ProviderError::Configuration(format!(
                    "{} must be a whole number of seconds, got {:?}: {}",
                    SHUTDOWN_TIMEOUT_ENV, raw, e
                ))
            })?;
            options.shutdown_timeout = Duration::from_secs(secs);
        }

        Ok(options)
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
///
/// On Unix, this waits for SIGTERM or SIGINT.
/// On Windows, this waits for CTRL+C.
async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(term), Ok(int)) => (term, int),
                (Err(e), _) | (_, Err(e)) => {
                    warn!(error = %e, "Failed to install signal handlers, serving until killed");
                    return std::future::pending().await;
                },
            };

        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM, initiating graceful shutdown"),
            _ = sigint.recv() => info!("Received SIGINT, initiating graceful shutdown"),
        }
    }

    #[cfg(windows)]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install CTRL+C handler, serving until killed");
            return std::future::pending().await;
        }
        info!("Received CTRL+C, initiating graceful shutdown");
    }

    #[cfg(not(any(unix, windows)))]
    {
        std::future::pending::<()>().await;
    }
}

/// Serve a provider implementation as a gRPC server.
///
/// This function:
/// 1. Binds to an available port on localhost
/// 2. Starts the gRPC server
/// 3. Outputs the handshake string to stdout
/// 4. Handles shutdown signals (SIGTERM/SIGINT) gracefully
///
/// The handshake format is: `HEMMER_PROVIDER|<version>|<address>`
///
/// For custom configuration, use [`serve_with_options`].
pub async fn serve<P: ProviderService>(provider: P) -> Result<(), Box<dyn std::error::Error>> {
    serve_with_options(provider, ServeOptions::default()).await
}

/// Serve a provider with custom options, listening on
/// [`ServeOptions::bind_addr`].
pub async fn serve_with_options<P: ProviderService>(
    provider: P,
    options: ServeOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind(options.bind_addr).await?;
    serve_with_shutdown(provider, listener, options, wait_for_shutdown_signal()).await
}

/// Serve a provider on a specific address.
pub async fn serve_on<P: ProviderService>(
    provider: P,
    addr: SocketAddr,
) -> Result<(), Box<dyn std::error::Error>> {
    serve_with_options(provider, ServeOptions::default().with_bind_addr(addr)).await
}

/// Serve on an already-bound listener until `shutdown` resolves.
///
/// In-flight requests get [`ServeOptions::shutdown_timeout`] to finish
/// once `shutdown` has resolved; the provider's `stop()` runs afterwards.
pub async fn serve_with_shutdown<P, F>(
    provider: P,
    listener: TcpListener,
    options: ServeOptions,
    shutdown: F,
) -> Result<(), Box<dyn std::error::Error>>
where
    P: ProviderService,
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    println!("{}|{}|{}", HANDSHAKE_PREFIX, PROTOCOL_VERSION, addr);
    info!(address = %addr, "Provider server starting");

    let provider = Arc::new(provider);
    let provider_for_shutdown = Arc::clone(&provider);

    let grpc_service = ProviderGrpcService { provider };
    let server = proto::provider_server::ProviderServer::new(grpc_service);

    let draining = Arc::new(Notify::new());
    let draining_signal = Arc::clone(&draining);
    let server_future = Server::builder().add_service(server).serve_with_incoming_shutdown(
        tokio_stream::wrappers::TcpListenerStream::new(listener),
        async move {
            shutdown.await;
            draining_signal.notify_one();
        },
    );
    tokio::pin!(server_future);

    // The timeout only starts once shutdown has been requested.
    let drain_deadline = async {
        draining.notified().await;
        tokio::time::sleep(options.shutdown_timeout).await;
    };

    tokio::select! {
        result = &mut server_future => match result {
            Ok(()) => info!("Server shutdown complete"),
            Err(e) => {
                error!(error = %e, "Server error");
                return Err(ProviderError::from(e).into());
            },
        },
        _ = drain_deadline => {
            warn!(
                timeout = ?options.shutdown_timeout,
                "Shutdown timeout exceeded, forcing shutdown"
            );
        },
    }

    debug!("Calling provider stop()");
    if let Err(e) = provider_for_shutdown.stop().await {
        warn!(error = %e, "Provider stop() returned error");
    }

    info!("Provider shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::provider_client::ProviderClient;
    use crate::proto::provider_server::Provider;
    use crate::provider::RandomProvider;
    use crate::resource::Resource;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_serve_options_defaults() {
        let options = ServeOptions::from_lookup(lookup(&[])).unwrap();
        assert_eq!(options.shutdown_timeout, Duration::from_secs(30));
        assert_eq!(options.bind_addr, "127.0.0.1:0".parse().unwrap());
    }

    #[test]
    fn test_serve_options_from_env_values() {
        let options = ServeOptions::from_lookup(lookup(&[
            (ADDR_ENV, "0.0.0.0:50051"),
            (SHUTDOWN_TIMEOUT_ENV, "5"),
        ]))
        .unwrap();
        assert_eq!(options.bind_addr, "0.0.0.0:50051".parse().unwrap());
        assert_eq!(options.shutdown_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_serve_options_rejects_bad_values() {
        let err = ServeOptions::from_lookup(lookup(&[(ADDR_ENV, "localhost")])).unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));

        let err = ServeOptions::from_lookup(lookup(&[(SHUTDOWN_TIMEOUT_ENV, "soon")])).unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
    }

    #[test]
    fn test_schema_to_proto_attribute_fields() {
        let schema = crate::resources::RandomPassword.schema();
        let raw = schema_to_proto(&schema);
        assert_eq!(raw.version, 3);

        let block = raw.block.unwrap();
        let find = |name: &str| block.attributes.iter().find(|a| a.name == name).unwrap();

        let number = find("number");
        assert!(!number.deprecation_message.is_empty());
        assert!(number.force_new);

        let keepers = find("keepers");
        assert_eq!(keepers.replace_trigger, "on_non_null_change");

        let length = find("length");
        let validators: Vec<crate::schema::Validator> =
            serde_json::from_slice(&length.validators).unwrap();
        assert_eq!(validators.len(), 2);

        let result = find("result");
        assert!(result.sensitive);
        assert!(result.validators.is_empty());
        assert_eq!(result.replace_trigger, "never");
    }

    fn grpc_service() -> ProviderGrpcService<RandomProvider> {
        ProviderGrpcService {
            provider: Arc::new(RandomProvider::new()),
        }
    }

    async fn password_state(service: &ProviderGrpcService<RandomProvider>) -> Vec<u8> {
        let planned = service
            .plan(tonic::Request::new(proto::PlanRequest {
                resource_type: "random_password".to_string(),
                prior_state: vec![],
                proposed_state: br#"{"length": 8}"#.to_vec(),
                config: br#"{"length": 8}"#.to_vec(),
            }))
            .await
            .unwrap()
            .into_inner();
        service
            .create(tonic::Request::new(proto::CreateRequest {
                resource_type: "random_password".to_string(),
                planned_state: planned.planned_state,
            }))
            .await
            .unwrap()
            .into_inner()
            .state
    }

    fn assert_single_error(diagnostics: &[proto::Diagnostic]) {
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, proto::diagnostic::Severity::Error as i32);
    }

    #[test]
    fn test_decode_json() {
        assert_eq!(decode_json(b"").unwrap(), Value::Null);
        assert_eq!(decode_optional_json(b"").unwrap(), None);
        assert_eq!(decode_json(b"{\"a\": 1}").unwrap()["a"], 1);
        assert!(matches!(
            decode_json(b"{\"a\":").unwrap_err(),
            ProviderError::Serialization(_)
        ));
    }

    #[tokio::test]
    async fn test_plan_with_malformed_proposed_state_is_an_error() {
        let service = grpc_service();
        let prior = password_state(&service).await;
        let response = service
            .plan(tonic::Request::new(proto::PlanRequest {
                resource_type: "random_password".to_string(),
                prior_state: prior,
                proposed_state: b"{\"length\": 8,".to_vec(),
                config: br#"{"length": 8}"#.to_vec(),
            }))
            .await
            .unwrap()
            .into_inner();
        assert_single_error(&response.diagnostics);
        assert!(response.planned_state.is_empty());
        assert!(response.changes.is_empty());
    }

    #[tokio::test]
    async fn test_plan_with_malformed_prior_state_is_an_error() {
        let response = grpc_service()
            .plan(tonic::Request::new(proto::PlanRequest {
                resource_type: "random_password".to_string(),
                prior_state: b"{\"result\": ".to_vec(),
                proposed_state: br#"{"length": 8}"#.to_vec(),
                config: br#"{"length": 8}"#.to_vec(),
            }))
            .await
            .unwrap()
            .into_inner();
        assert_single_error(&response.diagnostics);
        assert!(response.planned_state.is_empty());
    }

    #[tokio::test]
    async fn test_update_with_malformed_prior_state_is_an_error() {
        let service = grpc_service();
        let planned = password_state(&service).await;
        let response = service
            .update(tonic::Request::new(proto::UpdateRequest {
                resource_type: "random_password".to_string(),
                prior_state: b"[1, 2".to_vec(),
                planned_state: planned.clone(),
            }))
            .await
            .unwrap()
            .into_inner();
        assert_single_error(&response.diagnostics);
        assert!(response.state.is_empty());

        // Well-formed JSON that is not an object is rejected too.
        let response = service
            .update(tonic::Request::new(proto::UpdateRequest {
                resource_type: "random_password".to_string(),
                prior_state: b"[1, 2]".to_vec(),
                planned_state: planned,
            }))
            .await
            .unwrap()
            .into_inner();
        assert_single_error(&response.diagnostics);
        assert!(response.state.is_empty());
    }

    #[tokio::test]
    async fn test_grpc_round_trip() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

        let server = tokio::spawn(async move {
            serve_with_shutdown(
                RandomProvider::new(),
                listener,
                ServeOptions::default().with_shutdown_timeout(Duration::from_secs(5)),
                async move {
                    let _ = stop_rx.await;
                },
            )
            .await
            .map_err(|e| e.to_string())
        });

        let mut client = ProviderClient::connect(format!("http://{}", addr))
            .await
            .unwrap();

        let metadata = client
            .get_metadata(proto::GetMetadataRequest {})
            .await
            .unwrap()
            .into_inner();
        assert!(metadata.resources.contains(&"random_uuid".to_string()));
        assert_eq!(metadata.ephemeral_resources, vec!["random_password".to_string()]);

        let created = client
            .create(proto::CreateRequest {
                resource_type: "random_uuid".to_string(),
                planned_state: b"{}".to_vec(),
            })
            .await
            .unwrap()
            .into_inner();
        assert!(created.diagnostics.is_empty());
        let state: Value = serde_json::from_slice(&created.state).unwrap();
        assert_eq!(state["result"].as_str().unwrap().len(), 36);

        let unknown = client
            .create(proto::CreateRequest {
                resource_type: "random_nothing".to_string(),
                planned_state: b"{}".to_vec(),
            })
            .await
            .unwrap()
            .into_inner();
        assert_eq!(unknown.diagnostics.len(), 1);
        assert_eq!(
            unknown.diagnostics[0].severity,
            proto::diagnostic::Severity::Error as i32
        );

        let opened = client
            .open_ephemeral_resource(proto::OpenEphemeralResourceRequest {
                ephemeral_resource_type: "random_password".to_string(),
                config: br#"{"length": 12}"#.to_vec(),
            })
            .await
            .unwrap()
            .into_inner();
        let result: Value = serde_json::from_slice(&opened.result).unwrap();
        assert_eq!(result["result"].as_str().unwrap().chars().count(), 12);

        stop_tx.send(()).unwrap();
        server.await.unwrap().unwrap();
    }
}
