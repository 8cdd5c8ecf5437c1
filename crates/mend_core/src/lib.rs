//! # mend_core
//!
//! Error remediation and pipeline orchestration for codemend.
//!
//! # Features
//!
//! - **Classification**: every workspace error maps to an [`ErrorKind`]
//! - **ErrorHandler**: kind -> strategy registry that never propagates
//!   strategy failures
//! - **Built-in strategies**: module installation, import and syntax
//!   diagnostics, optional assistant repair
//! - **Pipeline**: dependency gate, generation, remediation, import probe
//!   and analysis
//! - **Configuration**: YAML/TOML file plus `MEND_*` overrides
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use mend_core::{ErrorHandler, ErrorKind, ErrorRecord, FnStrategy, RemediationOutcome};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let mut handler = ErrorHandler::new();
//! handler.register(
//!     ErrorKind::Custom("Timeout".into()),
//!     Arc::new(FnStrategy::new("note", |_: &ErrorRecord| {
//!         Ok(RemediationOutcome::Diagnostic("try again later".into()))
//!     })),
//! );
//!
//! let outcome = handler
//!     .handle(ErrorRecord::new(ErrorKind::Custom("Timeout".into()), "slow"))
//!     .await;
//! assert!(outcome.is_some());
//! # }
//! ```

pub mod classify;
pub mod config;
pub mod error;
pub mod handler;
pub mod pipeline;
pub mod record;
pub mod strategies;
pub mod strategy;

pub use classify::Classify;
pub use config::{LlmConfig, MendConfig, RuntimeConfig};
pub use error::{CoreError, CoreResult};
pub use handler::ErrorHandler;
pub use pipeline::{ModuleCheck, Pipeline, PipelineOptions, PipelineReport};
pub use record::{ErrorKind, ErrorRecord, RuntimeFailure};
pub use strategies::{
    extract_module_name, AssistantRepairStrategy, ImportFailureStrategy,
    IndentationDiagnosticStrategy, MissingModuleStrategy, SyntaxDiagnosticStrategy,
};
pub use strategy::{FnStrategy, RemediationOutcome, RemediationStrategy};
