//! Structured failure records.

use std::error::Error as StdError;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Tag used to pick a remediation strategy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ErrorKind {
    /// An importable unit is absent.
    MissingDependency,
    /// The import machinery failed for a reason other than absence.
    ImportFailure,
    SyntaxDefect,
    IndentationDefect,
    /// Template and parameters do not match.
    SubstitutionFailure,
    InstallationFailure,
    /// The assistant was unreachable or answered with an error.
    RequestFailure,
    Unclassified,
    /// A kind introduced at runtime by a caller.
    Custom(String),
}

impl ErrorKind {
    pub fn name(&self) -> &str {
        match self {
            Self::MissingDependency => "MissingDependency",
            Self::ImportFailure => "ImportFailure",
            Self::SyntaxDefect => "SyntaxDefect",
            Self::IndentationDefect => "IndentationDefect",
            Self::SubstitutionFailure => "SubstitutionFailure",
            Self::InstallationFailure => "InstallationFailure",
            Self::RequestFailure => "RequestFailure",
            Self::Unclassified => "Unclassified",
            Self::Custom(name) => name,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A classified failure, consumed once by the error handler.
#[derive(Debug)]
pub struct ErrorRecord {
    pub kind: ErrorKind,
    pub message: String,
    pub line: Option<usize>,
    pub column: Option<usize>,
    /// Module name supplied by the failing operation, when it knows one.
    pub module: Option<String>,
    /// The offending source text, when available.
    pub code: Option<String>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl ErrorRecord {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            line: None,
            column: None,
            module: None,
            code: None,
            source: None,
        }
    }

    pub fn unclassified(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unclassified, message)
    }

    pub fn with_location(mut self, line: usize, column: usize) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// The raised condition this record was built from.
    pub fn source_error(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(line) = self.line {
            write!(f, " (line {})", line)?;
        }
        Ok(())
    }
}

/// A failure observed while probing a generated artifact's imports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeFailure {
    ModuleNotFound { module: String, message: String },
    Import { message: String },
}

impl RuntimeFailure {
    /// Missing-module failure worded the way the interpreter words it.
    pub fn module_not_found(module: impl Into<String>) -> Self {
        let module = module.into();
        let message = format!("No module named '{}'", module);
        Self::ModuleNotFound { module, message }
    }
}

impl fmt::Display for RuntimeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModuleNotFound { message, .. } | Self::Import { message } => {
                f.write_str(message)
            }
        }
    }
}

impl StdError for RuntimeFailure {}
