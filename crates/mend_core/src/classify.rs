//! Structural classification of workspace errors.
//!
//! Kinds are derived from the error's type and variant, never from its
//! message text.

use mend_assist::AssistantError;
use mend_deps::DependencyError;
use mend_syntax::{DefectKind, SyntaxError};
use mend_templates::TemplateError;

use crate::record::{ErrorKind, ErrorRecord, RuntimeFailure};

/// Conversion of a raised condition into an [`ErrorRecord`].
pub trait Classify {
    fn classify(self) -> ErrorRecord;
}

impl Classify for ErrorRecord {
    fn classify(self) -> ErrorRecord {
        self
    }
}

impl Classify for SyntaxError {
    fn classify(self) -> ErrorRecord {
        let record = match &self {
            SyntaxError::Defect(defect) => {
                let kind = match defect.kind {
                    DefectKind::Syntax => ErrorKind::SyntaxDefect,
                    DefectKind::Indentation => ErrorKind::IndentationDefect,
                };
                ErrorRecord::new(kind, defect.message.clone())
                    .with_location(defect.line, defect.column)
            }
            SyntaxError::ParserUnavailable(_) => ErrorRecord::unclassified(self.to_string()),
        };
        record.with_source(self)
    }
}

impl Classify for TemplateError {
    fn classify(self) -> ErrorRecord {
        let kind = match self {
            TemplateError::Syntax(inner) => return inner.classify(),
            TemplateError::MissingParameter(_) | TemplateError::MalformedTemplate { .. } => {
                ErrorKind::SubstitutionFailure
            }
            TemplateError::Io(_) => ErrorKind::Unclassified,
        };
        ErrorRecord::new(kind, self.to_string()).with_source(self)
    }
}

impl Classify for DependencyError {
    fn classify(self) -> ErrorRecord {
        let kind = match &self {
            DependencyError::MissingRequired(_) => ErrorKind::MissingDependency,
            DependencyError::InstallFailed { .. } => ErrorKind::InstallationFailure,
            DependencyError::Spawn { .. } | DependencyError::Unknown(_) => ErrorKind::Unclassified,
        };
        ErrorRecord::new(kind, self.to_string()).with_source(self)
    }
}

impl Classify for AssistantError {
    fn classify(self) -> ErrorRecord {
        ErrorRecord::new(ErrorKind::RequestFailure, self.to_string()).with_source(self)
    }
}

impl Classify for RuntimeFailure {
    fn classify(self) -> ErrorRecord {
        let record = match &self {
            RuntimeFailure::ModuleNotFound { module, message } => {
                ErrorRecord::new(ErrorKind::MissingDependency, message.clone()).with_module(module.clone())
            }
            RuntimeFailure::Import { message } => {
                ErrorRecord::new(ErrorKind::ImportFailure, message.clone())
            }
        };
        record.with_source(self)
    }
}

impl Classify for anyhow::Error {
    fn classify(self) -> ErrorRecord {
        ErrorRecord::unclassified(format!("{:#}", self)).with_source(self)
    }
}
