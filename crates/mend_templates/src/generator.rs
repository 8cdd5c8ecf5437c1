//! Validated code generation.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use mend_syntax::{Formatted, Formatter, SyntaxCheck, Validator};
use tracing::{error, info, warn};

use crate::error::TemplateResult;
use crate::renderer::TemplateRenderer;

/// Rendered source text that passed validation.
///
/// Only [`CodeGenerator`] can construct one, so holding an artifact means
/// the exact text inside was confirmed syntactically valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifact {
    code: String,
}

impl GeneratedArtifact {
    pub fn as_str(&self) -> &str {
        &self.code
    }

    pub fn into_code(self) -> String {
        self.code
    }

    pub fn line_count(&self) -> usize {
        self.code.lines().count()
    }
}

impl fmt::Display for GeneratedArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}

/// Fills templates with parameters and validates the result.
pub struct CodeGenerator {
    renderer: TemplateRenderer,
    validator: Arc<dyn SyntaxCheck>,
    formatter: Formatter,
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeGenerator {
    /// Create a generator backed by the Python validator.
    pub fn new() -> Self {
        Self::with_validator(Arc::new(Validator::new()))
    }

    /// Create a generator with a custom syntax check.
    pub fn with_validator(validator: Arc<dyn SyntaxCheck>) -> Self {
        Self {
            renderer: TemplateRenderer::new(),
            validator,
            formatter: Formatter::new(),
        }
    }

    pub fn renderer(&self) -> &TemplateRenderer {
        &self.renderer
    }

    /// Substitute parameters without validating the result.
    pub fn render(
        &self,
        template: &str,
        params: &HashMap<String, String>,
    ) -> TemplateResult<String> {
        self.renderer.render(template, params)
    }

    /// Render `template` and validate the output.
    ///
    /// Substitution failures are raised before the validator runs. A
    /// validation failure is returned as the validator reported it.
    pub fn generate(
        &self,
        template: &str,
        params: &HashMap<String, String>,
    ) -> TemplateResult<GeneratedArtifact> {
        let result = self.render(template, params).and_then(|code| {
            self.validator.check(&code)?;
            Ok(GeneratedArtifact { code })
        });

        match &result {
            Ok(artifact) => info!(
                "Generated {} line(s) of validated code",
                artifact.line_count()
            ),
            Err(e) => error!("Code generation failed: {}", e),
        }

        result
    }

    /// Read a template from disk and generate from it.
    pub fn generate_from_file(
        &self,
        template_path: &Path,
        params: &HashMap<String, String>,
    ) -> TemplateResult<GeneratedArtifact> {
        let template = fs::read_to_string(template_path).map_err(|e| {
            error!("Failed to read template {:?}: {}", template_path, e);
            e
        })?;
        self.generate(&template, params)
    }

    /// Validate externally produced code and wrap it as an artifact.
    pub fn accept(&self, code: impl Into<String>) -> TemplateResult<GeneratedArtifact> {
        let code = code.into();
        self.validator.check(&code)?;
        Ok(GeneratedArtifact { code })
    }

    /// Best-effort formatting; never fails.
    pub fn format(&self, code: &str) -> Formatted {
        self.formatter.format(code)
    }

    /// Format an artifact, keeping the original if the result does not validate.
    pub fn format_artifact(&self, artifact: GeneratedArtifact) -> GeneratedArtifact {
        match self.format(artifact.as_str()) {
            Formatted::Normalized(code) => {
                if self.validator.check(&code).is_ok() {
                    GeneratedArtifact { code }
                } else {
                    warn!("Formatted code failed validation, keeping original");
                    artifact
                }
            }
            Formatted::Unchanged(_) => artifact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TemplateError;
    use mend_syntax::{DefectKind, SyntaxError, SyntaxResult};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingValidator {
        calls: AtomicUsize,
    }

    impl SyntaxCheck for CountingValidator {
        fn check(&self, source: &str) -> SyntaxResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Validator::new().validate(source)
        }
    }

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    /// Captures formatted log lines while installed as the thread default.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        fn install(&self) -> tracing::subscriber::DefaultGuard {
            let writer = self.clone();
            let subscriber = tracing_subscriber::fmt()
                .with_writer(move || writer.clone())
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_default(subscriber)
        }

        fn lines(&self, level: &str) -> Vec<String> {
            String::from_utf8_lossy(&self.0.lock().unwrap())
                .lines()
                .filter(|l| l.contains(level))
                .map(str::to_string)
                .collect()
        }
    }

    #[test]
    fn test_generate_valid_function() {
        let generator = CodeGenerator::new();
        let artifact = generator
            .generate(
                "def {name}():\n    return {value}",
                &params(&[("name", "test_func"), ("value", "'Hello'")]),
            )
            .unwrap();

        assert!(artifact.as_str().contains("def test_func():"));
        assert!(artifact.as_str().contains("return 'Hello'"));
        assert!(Validator::new().is_valid(artifact.as_str()));
    }

    #[test]
    fn test_generate_syntax_defect() {
        let generator = CodeGenerator::new();
        let err = generator
            .generate("def {name}() return None", &params(&[("name", "test_func")]))
            .unwrap_err();

        match err {
            TemplateError::Syntax(SyntaxError::Defect(defect)) => {
                assert_eq!(defect.kind, DefectKind::Syntax);
                assert_eq!((defect.line, defect.column), (1, 16));
                assert_eq!(defect.message, "expected ':'");
            }
            other => panic!("expected syntax defect, got {:?}", other),
        }
    }

    #[test]
    fn test_generate_logs_one_outcome_entry() {
        let logs = LogBuffer::default();
        let _guard = logs.install();
        let generator = CodeGenerator::new();

        generator
            .generate("def {name}():\n    return 1\n", &params(&[("name", "f")]))
            .unwrap();
        let info = logs.lines("INFO");
        assert_eq!(info.len(), 1, "{:?}", info);
        assert!(info[0].contains("Generated 2 line(s) of validated code"));
        assert!(logs.lines("ERROR").is_empty());

        generator
            .generate("def {name}() return None", &params(&[("name", "g")]))
            .unwrap_err();
        let errors = logs.lines("ERROR");
        assert_eq!(errors.len(), 1, "{:?}", errors);
        assert!(errors[0].contains("Code generation failed"));
        assert!(errors[0].contains("expected ':'"));
        assert_eq!(logs.lines("INFO").len(), 1);
    }

    #[test]
    fn test_substitution_fails_before_validation() {
        let counter = Arc::new(CountingValidator::default());
        let generator = CodeGenerator::with_validator(counter.clone());

        let err = generator
            .generate("def {name}():\n    return {value}", &params(&[("name", "f")]))
            .unwrap_err();

        assert!(err.is_substitution());
        assert_eq!(counter.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_validator_runs_once_on_success() {
        let counter = Arc::new(CountingValidator::default());
        let generator = CodeGenerator::with_validator(counter.clone());

        generator
            .generate("x = {v}\n", &params(&[("v", "1")]))
            .unwrap();
        assert_eq!(counter.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_accept_rejects_invalid_code() {
        let generator = CodeGenerator::new();
        assert!(generator.accept("x = 1\n").is_ok());
        assert!(generator.accept("x = = 1\n").is_err());
    }

    #[test]
    fn test_format_artifact() {
        let generator = CodeGenerator::new();
        let artifact = generator
            .generate("x = {v}   \n\n\n\n\ny = 2", &params(&[("v", "1")]))
            .unwrap();
        let formatted = generator.format_artifact(artifact);
        assert_eq!(formatted.as_str(), "x = 1\n\n\ny = 2\n");
    }

    #[test]
    fn test_format_never_fails() {
        let generator = CodeGenerator::new();
        let formatted = generator.format("def (:");
        assert_eq!(formatted.as_str(), "def (:");
    }
}
