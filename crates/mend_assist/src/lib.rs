//! # mend_assist
//!
//! Client for the optional code-repair assistant.
//!
//! The assistant is a local or remote LLM server speaking an Ollama-style
//! JSON API. Every failure is a request-kind [`AssistantError`]; callers
//! are expected to degrade rather than abort.
//!
//! # Example
//!
//! ```rust,no_run
//! use mend_assist::{Assistant, AssistantClient, AssistantSettings};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = AssistantClient::new(AssistantSettings::default())?;
//!     if client.is_available().await {
//!         let fix = client.suggest_fix("SyntaxError: expected ':'", "def f() return 1").await?;
//!         println!("{}", fix);
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod mock;
pub mod prompt;
pub mod settings;

pub use client::{Assistant, AssistantClient};
pub use error::{AssistantError, AssistantResult};
pub use mock::{AssistantCall, MockAssistant};
pub use prompt::{extract_code, fix_prompt};
pub use settings::AssistantSettings;
