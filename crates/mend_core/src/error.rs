//! Error types for the core module.

use mend_assist::AssistantError;
use mend_deps::DependencyError;
use mend_syntax::SyntaxError;
use mend_templates::TemplateError;
use thiserror::Error;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur during core operations.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Dependency gate failed: {0}")]
    GateFailed(#[source] DependencyError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Assistant(#[from] AssistantError),

    #[error("Strategy {strategy} failed: {message}")]
    StrategyFailed { strategy: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    pub fn strategy(strategy: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StrategyFailed {
            strategy: strategy.into(),
            message: message.into(),
        }
    }
}
