//! Error types for the assistant client.

use thiserror::Error;

/// Result type alias for assistant operations.
pub type AssistantResult<T> = Result<T, AssistantError>;

/// Request-kind failures. Callers treat every variant as "assistant
/// unavailable" and degrade.
#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("Assistant returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Assistant request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Assistant response could not be decoded: {0}")]
    Decode(String),

    #[error("Assistant client could not be built: {0}")]
    Client(String),
}

impl AssistantError {
    /// True when the endpoint answered at all.
    pub fn is_reachable(&self) -> bool {
        matches!(self, Self::Status { .. } | Self::Decode(_))
    }
}
