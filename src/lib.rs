//! Hemmer Random Provider
//!
//! A Hemmer provider that generates random values and keeps them stable in
//! state until the configuration asks for a new one. It follows the shape of
//! [terraform-provider-random](https://github.com/hashicorp/terraform-provider-random).
//!
//! # Resources
//!
//! | Type              | Produces                                           |
//! |-------------------|----------------------------------------------------|
//! | `random_id`       | random bytes as base64url, base64, hex and decimal |
//! | `random_password` | a constrained string plus its bcrypt hash          |
//! | `random_string`   | a constrained string                               |
//! | `random_integer`  | an integer in `[min, max]`, optionally seeded      |
//! | `random_uuid`     | a random UUID                                      |
//! | `random_pet`      | a pet name such as `calm-hawk`                     |
//! | `random_shuffle`  | a permutation of a list, optionally seeded         |
//! | `random_bytes`    | random bytes as base64 and hex                     |
//! | `random_ip`       | an address within a CIDR range                     |
//!
//! `random_password` is also served as an ephemeral resource, which returns
//! a fresh value on every open and stores nothing.
//!
//! Every resource accepts a `keepers` map. Changing a keeper replaces the
//! resource, which generates a new value; everything else keeps the value
//! it already has.
//!
//! # Running
//!
//! ```ignore
//! use hemmer_provider_random::{init_logging, serve, RandomProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     init_logging();
//!     serve(RandomProvider::new()).await
//! }
//! ```
//!
//! # Handshake Protocol
//!
//! On startup the provider writes one line to stdout:
//!
//! ```text
//! HEMMER_PROVIDER|1|127.0.0.1:50051
//! ```
//!
//! Format: `HEMMER_PROVIDER|<protocol_version>|<address>`. Logs go to stderr.
//!
//! # Configuration
//!
//! - `HEMMER_PROVIDER_ADDR`: the address to bind (default `127.0.0.1:0`)
//! - `HEMMER_PROVIDER_SHUTDOWN_TIMEOUT`: seconds to drain in-flight calls after a
//!   stop signal (default 30)
//! - `RUST_LOG`: log filter (default `info`)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ephemeral;
pub mod error;
pub mod keepers;
pub mod logging;
pub mod plan;
pub mod provider;
pub mod random;
pub mod resource;
pub mod resources;
pub mod schema;
pub mod server;
pub mod testing;
pub mod types;
pub mod upgrade;
pub mod validation;

/// Types generated from `proto/provider.proto`.
#[allow(missing_docs)]
#[allow(clippy::all)]
pub mod proto {
    tonic::include_proto!("hemmer.provider.v1");
}

// Re-export main types at crate root
pub use ephemeral::{EphemeralPassword, EphemeralResource};
pub use error::ProviderError;
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use provider::RandomProvider;
pub use resource::Resource;
pub use schema::ProviderSchema;
pub use server::{
    serve, serve_on, serve_with_options, serve_with_shutdown, ProviderService, ServeOptions,
};
pub use types::{
    AttributeChange, ImportedResource, PlanResult, ProviderMetadata, ServerCapabilities,
    HANDSHAKE_PREFIX, PROTOCOL_VERSION,
};
pub use validation::{is_valid, validate, validate_result};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tonic;
pub use tracing;
