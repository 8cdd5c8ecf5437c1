//! Error types for templates and code generation.

use mend_syntax::SyntaxError;
use thiserror::Error;

/// Result type alias for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors that can occur while rendering or generating code.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Parameter not provided for placeholder: {0}")]
    MissingParameter(String),

    #[error("Malformed template at byte {position}: {message}")]
    MalformedTemplate { position: usize, message: String },

    /// The rendered text failed validation. The validator's error is carried unmodified.
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TemplateError {
    /// True for template/parameter mismatches raised before validation.
    pub fn is_substitution(&self) -> bool {
        matches!(
            self,
            Self::MissingParameter(_) | Self::MalformedTemplate { .. }
        )
    }
}
