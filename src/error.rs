//! Error types for the random provider.

use thiserror::Error;

use crate::random::RandomError;
use crate::upgrade::UpgradeError;

/// Errors that can occur while serving a provider request.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// A validation error occurred.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An internal provider error occurred.
    #[error("Internal error: {0}")]
    Internal(String),

    /// A configuration error occurred.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested resource type is unknown.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A gRPC transport error occurred.
    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// Generating a random value failed.
    #[error("Random generation error: {0}")]
    Random(#[from] RandomError),

    /// Hashing a generated secret failed.
    #[error("Hashing error: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    /// Migrating persisted state to the current schema failed.
    #[error("State upgrade error: {0}")]
    StateUpgrade(#[from] UpgradeError),

    /// An import identifier could not be interpreted.
    #[error("Import error: {0}")]
    Import(String),

    /// Operation not implemented.
    #[error("Unimplemented: {0}")]
    Unimplemented(String),

    /// Invalid request from the engine.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ProviderError {
    /// Get the error message without the category prefix.
    pub fn message(&self) -> String {
        match self {
            Self::Validation(msg)
            | Self::Internal(msg)
            | Self::Configuration(msg)
            | Self::UnknownResource(msg)
            | Self::Import(msg)
            | Self::Unimplemented(msg)
            | Self::InvalidRequest(msg) => msg.clone(),
            Self::Serialization(err) => err.to_string(),
            Self::Transport(err) => err.to_string(),
            Self::Random(err) => err.to_string(),
            Self::Hash(err) => err.to_string(),
            Self::StateUpgrade(err) => err.to_string(),
        }
    }
}

impl From<ProviderError> for tonic::Status {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Validation(msg) => tonic::Status::invalid_argument(msg),
            ProviderError::Configuration(msg) => tonic::Status::failed_precondition(msg),
            ProviderError::UnknownResource(msg) => tonic::Status::not_found(msg),
            ProviderError::Internal(msg) => tonic::Status::internal(msg),
            ProviderError::Serialization(err) => {
                tonic::Status::invalid_argument(format!("Serialization error: {}", err))
            },
            ProviderError::Transport(err) => {
                tonic::Status::unavailable(format!("Transport error: {}", err))
            },
            ProviderError::Random(err) => tonic::Status::internal(err.to_string()),
            ProviderError::Hash(err) => tonic::Status::internal(err.to_string()),
            ProviderError::StateUpgrade(err) => tonic::Status::failed_precondition(err.to_string()),
            ProviderError::Import(msg) => tonic::Status::invalid_argument(msg),
            ProviderError::Unimplemented(msg) => tonic::Status::unimplemented(msg),
            ProviderError::InvalidRequest(msg) => tonic::Status::invalid_argument(msg),
        }
    }
}
