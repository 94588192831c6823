//! Chronicle demo error types.

use chronicle_core::error::{ConfigError, DomainError};
use thiserror::Error;

/// Startup and runtime errors for the demo binary.
#[derive(Debug, Error)]
pub enum AppError {
    /// An environment variable holds an invalid value.
    #[error("configuration error: {0}")]
    Config(String),

    /// Type registration failed during startup.
    #[error("registry error: {0}")]
    Registry(#[from] ConfigError),

    /// A command or query failed.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
}
