//! Logging setup for the provider binary.
//!
//! All logs are written to **stderr**. Stdout carries only the handshake
//! line, which the host reads to find the gRPC address.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Controls log levels (e.g., `info`, `hemmer_provider_random=debug`)
//!
//! # Examples
//!
//! ```bash
//! # Show info logs (default)
//! RUST_LOG=info ./hemmer-provider-random
//!
//! # Trace plan decisions
//! RUST_LOG=hemmer_provider_random::plan=debug ./hemmer-provider-random
//! ```
//!
//! Generated values are never logged, at any level.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// The default filter when `RUST_LOG` is not set.
pub const DEFAULT_LEVEL: &str = "info";

fn filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

fn try_init_with(default_level: &str) -> Result<(), tracing_subscriber::util::TryInitError> {
    tracing_subscriber::registry()
        .with(filter(default_level))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false),
        )
        .try_init()
}

/// Initialize the stderr subscriber, filtered by `RUST_LOG` or `info`.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging() {
    init_logging_with_default(DEFAULT_LEVEL);
}

/// Like [`init_logging`], with a different level when `RUST_LOG` is not set.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging_with_default(default_level: &str) {
    if let Err(err) = try_init_with(default_level) {
        panic!("failed to initialize logging: {}", err);
    }
}

/// Try to initialize logging, returning false if a subscriber is already set.
pub fn try_init_logging() -> bool {
    try_init_with(DEFAULT_LEVEL).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_filter_parsing() {
        assert!(EnvFilter::try_new(DEFAULT_LEVEL).is_ok());
        assert!(EnvFilter::try_new("hemmer_provider_random=debug").is_ok());
        assert!(EnvFilter::try_new("warn,hemmer_provider_random::plan=debug").is_ok());
    }

    #[test]
    fn test_try_init_twice() {
        // The global subscriber may already be set by another test.
        try_init_logging();
        assert!(!try_init_logging());
    }
}
