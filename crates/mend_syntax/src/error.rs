//! Error types for syntax validation.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Result type alias for syntax operations.
pub type SyntaxResult<T> = Result<T, SyntaxError>;

/// Which family of parse failure a defect belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DefectKind {
    Syntax,
    /// Indentation problems are a specialization of syntax failures.
    Indentation,
}

impl DefectKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Syntax => "SyntaxError",
            Self::Indentation => "IndentationError",
        }
    }
}

/// A precise syntax defect with a 1-based position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyntaxDefect {
    pub kind: DefectKind,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl SyntaxDefect {
    pub fn new(kind: DefectKind, line: usize, column: usize, message: impl Into<String>) -> Self {
        Self {
            kind,
            line,
            column,
            message: message.into(),
        }
    }

    pub fn is_indentation(&self) -> bool {
        self.kind == DefectKind::Indentation
    }
}

impl fmt::Display for SyntaxDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} (line {}, column {})",
            self.kind.label(),
            self.message,
            self.line,
            self.column
        )
    }
}

/// Errors that can occur during validation.
#[derive(Error, Debug, Clone)]
pub enum SyntaxError {
    #[error("{0}")]
    Defect(SyntaxDefect),

    #[error("Python parser unavailable: {0}")]
    ParserUnavailable(String),
}

impl SyntaxError {
    /// The positioned defect, if this error came from the source text.
    pub fn defect(&self) -> Option<&SyntaxDefect> {
        match self {
            Self::Defect(defect) => Some(defect),
            Self::ParserUnavailable(_) => None,
        }
    }
}
