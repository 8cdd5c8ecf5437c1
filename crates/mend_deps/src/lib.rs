//! # mend_deps
//!
//! Dependency probing and installation for codemend.
//!
//! # Features
//!
//! - **Probes**: Python interpreter version, pip, and the local LLM runtime
//! - **Gating**: pre-flight check over required dependencies
//! - **Installation**: pip packages and vendor-scripted system dependencies,
//!   reported as booleans rather than errors
//! - **Module lookup**: whether the interpreter can locate an import
//! - **Mock Executor**: for testing without touching the host
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use mend_deps::{DependencyManager, DependencySettings, MockExecutor, MockResponse};
//!
//! let executor = MockExecutor::new()
//!     .on("python3 --version", MockResponse::success("Python 3.11.4"))
//!     .on("python3 -m pip --version", MockResponse::success("pip 24.0"));
//!
//! let deps = DependencyManager::new(Arc::new(executor), DependencySettings::default());
//! let required = deps.check_all();
//! assert_eq!(required.get("python"), Some(&true));
//! assert!(!required.contains_key("ollama"));
//! ```

pub mod descriptor;
pub mod error;
pub mod executor;
pub mod manager;
pub mod mock;

pub use descriptor::{
    DependencyDescriptor, DependencySettings, DependencyStatus, InstallAttempt, ModuleStatus,
    Probe,
};
pub use error::{DependencyError, DependencyResult};
pub use executor::{format_command, CommandExecutor, CommandOutput, SystemExecutor};
pub use manager::DependencyManager;
pub use mock::{CapturedCall, MockExecutor, MockResponse};
