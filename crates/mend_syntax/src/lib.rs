//! # mend_syntax
//!
//! Python syntax validation for codemend.
//!
//! Generated code is never executed; it is only parsed. This crate provides:
//!
//! - **Validator**: full-language parse via tree-sitter-python, reporting the
//!   first defect with line, column and message, and rejecting the
//!   Python 2 forms the grammar still accepts
//! - **Indentation scan**: tells indentation problems apart from other
//!   syntax errors
//! - **Formatter**: whitespace normalization that never fails the caller
//! - **Import discovery**: top-level modules a piece of source depends on
//!
//! ## Example
//!
//! ```rust
//! use mend_syntax::{DefectKind, SyntaxError, Validator};
//!
//! let validator = Validator::new();
//! assert!(validator.validate("def f():\n    return 1\n").is_ok());
//!
//! match validator.validate("x = 1\n    y = 2\n") {
//!     Err(SyntaxError::Defect(defect)) => assert_eq!(defect.kind, DefectKind::Indentation),
//!     other => panic!("unexpected: {:?}", other),
//! }
//! ```

pub mod error;
pub mod format;
pub mod imports;
pub mod indent;
mod legacy;
pub mod validator;

pub use error::{DefectKind, SyntaxDefect, SyntaxError, SyntaxResult};
pub use format::{Formatted, Formatter};
pub use imports::imported_modules;
pub use indent::IndentIssue;
pub use validator::{SyntaxCheck, Validator};
