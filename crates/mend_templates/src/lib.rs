//! # mend_templates
//!
//! Template rendering and validated code generation for codemend.
//!
//! A template is plain text with `{name}` placeholders. Rendering requires a
//! parameter for every placeholder; the rendered text is then validated as
//! Python before it is handed back as a [`GeneratedArtifact`].
//!
//! ## Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use mend_templates::CodeGenerator;
//!
//! let generator = CodeGenerator::new();
//! let mut params = HashMap::new();
//! params.insert("name".to_string(), "greet".to_string());
//! params.insert("value".to_string(), "'Hello'".to_string());
//!
//! let artifact = generator
//!     .generate("def {name}():\n    return {value}\n", &params)
//!     .unwrap();
//! assert!(artifact.as_str().starts_with("def greet():"));
//! ```

pub mod error;
pub mod generator;
pub mod renderer;

pub use error::{TemplateError, TemplateResult};
pub use generator::{CodeGenerator, GeneratedArtifact};
pub use renderer::TemplateRenderer;
