//! Remediation strategy trait and outcomes.

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::CoreResult;
use crate::record::ErrorRecord;

/// What a strategy achieved. Deliberately strategy-specific.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum RemediationOutcome {
    /// Acknowledged; `true` when the condition was resolved.
    Resolved(bool),
    /// Informational remediation only.
    Diagnostic(String),
    /// A package was installed.
    Installed { package: String },
    /// Replacement source text that passed validation.
    Repaired { code: String },
}

impl RemediationOutcome {
    /// Whether the underlying condition is now fixed.
    pub fn is_resolved(&self) -> bool {
        match self {
            Self::Resolved(resolved) => *resolved,
            Self::Diagnostic(_) => false,
            Self::Installed { .. } | Self::Repaired { .. } => true,
        }
    }
}

impl fmt::Display for RemediationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolved(true) => f.write_str("resolved"),
            Self::Resolved(false) => f.write_str("unresolved"),
            Self::Diagnostic(text) => f.write_str(text),
            Self::Installed { package } => write!(f, "installed {}", package),
            Self::Repaired { code } => write!(f, "repaired ({} line(s))", code.lines().count()),
        }
    }
}

/// A remediation bound to one error kind.
///
/// Returning `Err` is allowed; the handler turns it into "no remediation".
#[async_trait]
pub trait RemediationStrategy: Send + Sync {
    fn name(&self) -> &str;

    async fn remediate(&self, record: &ErrorRecord) -> CoreResult<RemediationOutcome>;
}

/// Strategy built from a synchronous closure.
pub struct FnStrategy<F> {
    name: String,
    f: F,
}

impl<F> FnStrategy<F>
where
    F: Fn(&ErrorRecord) -> CoreResult<RemediationOutcome> + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

#[async_trait]
impl<F> RemediationStrategy for FnStrategy<F>
where
    F: Fn(&ErrorRecord) -> CoreResult<RemediationOutcome> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn remediate(&self, record: &ErrorRecord) -> CoreResult<RemediationOutcome> {
        (self.f)(record)
    }
}
