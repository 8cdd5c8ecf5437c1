//! Error types for dependency management.

use thiserror::Error;

/// Result type alias for dependency operations.
pub type DependencyResult<T> = Result<T, DependencyError>;

/// Errors that can occur while probing or installing dependencies.
#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("Required dependencies missing: {}", .0.join(", "))]
    MissingRequired(Vec<String>),

    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Installation of {name} failed: {message}")]
    InstallFailed { name: String, message: String },

    #[error("Unknown dependency: {0}")]
    Unknown(String),
}
