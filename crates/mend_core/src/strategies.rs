//! Built-in remediation strategies.

use std::sync::Arc;

use async_trait::async_trait;
use mend_assist::{extract_code, Assistant};
use mend_deps::DependencyManager;
use mend_syntax::Validator;
use tracing::{info, warn};

use crate::error::{CoreError, CoreResult};
use crate::record::ErrorRecord;
use crate::strategy::{RemediationOutcome, RemediationStrategy};

/// First token enclosed in matching single or double quotes.
pub fn extract_module_name(message: &str) -> Option<String> {
    let (start, quote) = message.char_indices().find(|(_, c)| *c == '\'' || *c == '"')?;
    let rest = &message[start + 1..];
    let end = rest.find(quote)?;
    let name = rest[..end].trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// Installs the package named by a missing-module failure.
pub struct MissingModuleStrategy {
    deps: Arc<DependencyManager>,
}

impl MissingModuleStrategy {
    pub fn new(deps: Arc<DependencyManager>) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl RemediationStrategy for MissingModuleStrategy {
    fn name(&self) -> &str {
        "missing-module"
    }

    async fn remediate(&self, record: &ErrorRecord) -> CoreResult<RemediationOutcome> {
        let Some(module) = record
            .module
            .clone()
            .or_else(|| extract_module_name(&record.message))
        else {
            warn!("Could not determine module name from: {}", record.message);
            return Ok(RemediationOutcome::Resolved(false));
        };

        // Submodules are provided by their top-level package.
        let package = module.split('.').next().unwrap_or(&module).to_string();

        if self.deps.install(&package, None) {
            info!("Installed missing module {}", package);
            Ok(RemediationOutcome::Installed { package })
        } else {
            warn!("Could not install missing module {}", package);
            Ok(RemediationOutcome::Resolved(false))
        }
    }
}

/// Acknowledges import failures without acting.
pub struct ImportFailureStrategy;

#[async_trait]
impl RemediationStrategy for ImportFailureStrategy {
    fn name(&self) -> &str {
        "import-failure"
    }

    async fn remediate(&self, record: &ErrorRecord) -> CoreResult<RemediationOutcome> {
        warn!("Import failure left unresolved: {}", record.message);
        Ok(RemediationOutcome::Resolved(false))
    }
}

pub struct SyntaxDiagnosticStrategy;

#[async_trait]
impl RemediationStrategy for SyntaxDiagnosticStrategy {
    fn name(&self) -> &str {
        "syntax-diagnostic"
    }

    async fn remediate(&self, record: &ErrorRecord) -> CoreResult<RemediationOutcome> {
        Ok(RemediationOutcome::Diagnostic(format!(
            "Syntax error at line {}: {}",
            line_label(record),
            record.message
        )))
    }
}

pub struct IndentationDiagnosticStrategy;

#[async_trait]
impl RemediationStrategy for IndentationDiagnosticStrategy {
    fn name(&self) -> &str {
        "indentation-diagnostic"
    }

    async fn remediate(&self, record: &ErrorRecord) -> CoreResult<RemediationOutcome> {
        Ok(RemediationOutcome::Diagnostic(format!(
            "Indentation error at line {}",
            line_label(record)
        )))
    }
}

fn line_label(record: &ErrorRecord) -> String {
    record
        .line
        .map(|line| line.to_string())
        .unwrap_or_else(|| "?".to_string())
}

/// Asks the assistant for corrected code.
///
/// The reply is accepted only if it validates. Otherwise, and when the
/// assistant cannot be reached, the fallback strategy runs if one is set.
pub struct AssistantRepairStrategy {
    assistant: Arc<dyn Assistant>,
    validator: Validator,
    fallback: Option<Arc<dyn RemediationStrategy>>,
}

impl AssistantRepairStrategy {
    pub fn new(assistant: Arc<dyn Assistant>) -> Self {
        Self {
            assistant,
            validator: Validator::new(),
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, fallback: Option<Arc<dyn RemediationStrategy>>) -> Self {
        self.fallback = fallback;
        self
    }

    async fn fall_back(
        &self,
        record: &ErrorRecord,
        reason: CoreError,
    ) -> CoreResult<RemediationOutcome> {
        match &self.fallback {
            Some(fallback) => {
                warn!("{}; falling back to {}", reason, fallback.name());
                fallback.remediate(record).await
            }
            None => Err(reason),
        }
    }
}

#[async_trait]
impl RemediationStrategy for AssistantRepairStrategy {
    fn name(&self) -> &str {
        "assistant-repair"
    }

    async fn remediate(&self, record: &ErrorRecord) -> CoreResult<RemediationOutcome> {
        let Some(code) = record.code.as_deref() else {
            let reason = CoreError::strategy(self.name(), "no source attached to the failure");
            return self.fall_back(record, reason).await;
        };

        let error_message = record.to_string();
        let reply = match self.assistant.suggest_fix(&error_message, code).await {
            Ok(reply) => reply,
            Err(e) => return self.fall_back(record, e.into()).await,
        };

        let candidate = extract_code(&reply);
        match self.validator.validate(&candidate) {
            Ok(()) => {
                info!("Assistant repair validated ({} line(s))", candidate.lines().count());
                Ok(RemediationOutcome::Repaired { code: candidate })
            }
            Err(e) => {
                let reason = CoreError::strategy(
                    self.name(),
                    format!("suggested code does not validate: {}", e),
                );
                self.fall_back(record, reason).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ErrorKind;
    use mend_assist::{AssistantCall, MockAssistant};
    use mend_deps::{DependencySettings, MockExecutor, MockResponse};

    fn deps(executor: &MockExecutor) -> Arc<DependencyManager> {
        Arc::new(DependencyManager::new(
            Arc::new(executor.clone()),
            DependencySettings::default(),
        ))
    }

    #[test]
    fn test_extract_module_name() {
        assert_eq!(extract_module_name("No module named 'foo'"), Some("foo".into()));
        assert_eq!(extract_module_name("No module named \"foo.bar\""), Some("foo.bar".into()));
        assert_eq!(extract_module_name("No module named foo"), None);
        assert_eq!(extract_module_name("unterminated 'foo"), None);
        assert_eq!(extract_module_name("empty ''"), None);
    }

    #[tokio::test]
    async fn test_missing_module_prefers_structured_field() {
        let executor =
            MockExecutor::new().on("python3 -m pip install requests", MockResponse::success(""));
        let strategy = MissingModuleStrategy::new(deps(&executor));

        let record = ErrorRecord::new(ErrorKind::MissingDependency, "No module named 'other'")
            .with_module("requests.adapters");
        let outcome = strategy.remediate(&record).await.unwrap();

        assert_eq!(
            outcome,
            RemediationOutcome::Installed {
                package: "requests".into()
            }
        );
        assert!(!executor.was_called("python3 -m pip install other"));
    }

    #[tokio::test]
    async fn test_missing_module_install_failure() {
        let executor = MockExecutor::new()
            .on("python3 -m pip install foo", MockResponse::failure(1, "ERROR: not found"));
        let strategy = MissingModuleStrategy::new(deps(&executor));

        let record = ErrorRecord::new(ErrorKind::MissingDependency, "No module named 'foo'");
        let outcome = strategy.remediate(&record).await.unwrap();
        assert_eq!(outcome, RemediationOutcome::Resolved(false));
        assert!(executor.was_called("python3 -m pip install foo"));
    }

    #[tokio::test]
    async fn test_missing_module_without_name() {
        let executor = MockExecutor::new();
        let strategy = MissingModuleStrategy::new(deps(&executor));

        let record = ErrorRecord::new(ErrorKind::MissingDependency, "something is missing");
        assert_eq!(
            strategy.remediate(&record).await.unwrap(),
            RemediationOutcome::Resolved(false)
        );
        assert_eq!(executor.call_count(), 0);
    }

    #[tokio::test]
    async fn test_diagnostics() {
        let record =
            ErrorRecord::new(ErrorKind::SyntaxDefect, "expected ':'").with_location(1, 12);
        assert_eq!(
            SyntaxDiagnosticStrategy.remediate(&record).await.unwrap(),
            RemediationOutcome::Diagnostic("Syntax error at line 1: expected ':'".into())
        );

        let record =
            ErrorRecord::new(ErrorKind::IndentationDefect, "unexpected indent").with_location(2, 5);
        assert_eq!(
            IndentationDiagnosticStrategy.remediate(&record).await.unwrap(),
            RemediationOutcome::Diagnostic("Indentation error at line 2".into())
        );
    }

    #[tokio::test]
    async fn test_import_failure_is_acknowledged() {
        let record = ErrorRecord::new(ErrorKind::ImportFailure, "cannot import name 'x'");
        assert_eq!(
            ImportFailureStrategy.remediate(&record).await.unwrap(),
            RemediationOutcome::Resolved(false)
        );
    }

    #[tokio::test]
    async fn test_assistant_repair_accepts_valid_code() {
        let assistant = MockAssistant::new().reply("```python\ndef f():\n    return 1\n```");
        let strategy = AssistantRepairStrategy::new(Arc::new(assistant.clone()));

        let record = ErrorRecord::new(ErrorKind::SyntaxDefect, "expected ':'")
            .with_location(1, 8)
            .with_code("def f() return 1\n");
        let outcome = strategy.remediate(&record).await.unwrap();

        assert_eq!(
            outcome,
            RemediationOutcome::Repaired {
                code: "def f():\n    return 1\n".into()
            }
        );
        match &assistant.calls()[0] {
            AssistantCall::SuggestFix { error_message, code } => {
                assert!(error_message.contains("expected ':'"));
                assert_eq!(code, "def f() return 1\n");
            }
            other => panic!("unexpected call {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_assistant_repair_rejects_invalid_reply() {
        let assistant = MockAssistant::new().reply("def f() return 1");
        let strategy = AssistantRepairStrategy::new(Arc::new(assistant))
            .with_fallback(Some(Arc::new(SyntaxDiagnosticStrategy)));

        let record = ErrorRecord::new(ErrorKind::SyntaxDefect, "expected ':'")
            .with_location(1, 8)
            .with_code("def f() return 1\n");
        assert_eq!(
            strategy.remediate(&record).await.unwrap(),
            RemediationOutcome::Diagnostic("Syntax error at line 1: expected ':'".into())
        );
    }

    #[tokio::test]
    async fn test_assistant_repair_request_failure_without_fallback() {
        let strategy = AssistantRepairStrategy::new(Arc::new(MockAssistant::new().fail(503)));
        let record = ErrorRecord::new(ErrorKind::SyntaxDefect, "expected ':'").with_code("x y\n");

        assert!(matches!(
            strategy.remediate(&record).await,
            Err(CoreError::Assistant(_))
        ));
    }
}
