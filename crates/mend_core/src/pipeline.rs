//! End-to-end orchestration: gate, generate, remediate, post-process.

use std::collections::HashMap;
use std::sync::Arc;

use mend_assist::Assistant;
use mend_deps::{DependencyManager, InstallAttempt, ModuleStatus};
use mend_syntax::imported_modules;
use mend_templates::{CodeGenerator, GeneratedArtifact};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::classify::Classify;
use crate::error::{CoreError, CoreResult};
use crate::handler::ErrorHandler;
use crate::record::{ErrorKind, RuntimeFailure};
use crate::strategies::AssistantRepairStrategy;
use crate::strategy::RemediationOutcome;

/// Switches for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Skip the dependency gate and auto-install step.
    pub skip_deps: bool,
    /// Check that the artifact's imports resolve.
    pub probe_imports: bool,
    /// Normalize whitespace of the artifact.
    pub format: bool,
    /// Send the artifact to the assistant for analysis.
    pub analyze: bool,
    /// Let the assistant repair syntax failures.
    pub repair: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            skip_deps: false,
            probe_imports: true,
            format: false,
            analyze: true,
            repair: false,
        }
    }
}

/// Result of probing one import of the artifact.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleCheck {
    pub module: String,
    /// Whether the module resolves after any remediation.
    pub available: bool,
    pub remediation: Option<RemediationOutcome>,
}

/// Everything a run produced.
#[derive(Debug, Default)]
pub struct PipelineReport {
    pub artifact: Option<GeneratedArtifact>,
    /// Rendering of the generation failure, when there was one.
    pub failure: Option<String>,
    /// What the handler made of the generation failure.
    pub remediation: Option<RemediationOutcome>,
    /// The artifact came from an assistant repair.
    pub repaired: bool,
    pub assistant_available: bool,
    pub installs: Vec<InstallAttempt>,
    pub modules: Vec<ModuleCheck>,
    pub analysis: Option<Value>,
}

impl PipelineReport {
    pub fn succeeded(&self) -> bool {
        self.artifact.is_some()
    }

    pub fn unresolved_modules(&self) -> Vec<&str> {
        self.modules
            .iter()
            .filter(|m| !m.available)
            .map(|m| m.module.as_str())
            .collect()
    }
}

/// Wires dependency gating, generation and remediation together.
pub struct Pipeline {
    generator: CodeGenerator,
    deps: Arc<DependencyManager>,
    handler: ErrorHandler,
    assistant: Option<Arc<dyn Assistant>>,
    options: PipelineOptions,
}

impl Pipeline {
    /// Create a pipeline with the built-in strategies.
    ///
    /// With `options.repair` and an assistant, syntax and indentation
    /// failures go to the assistant first and fall back to the built-in
    /// diagnostics.
    pub fn new(
        deps: Arc<DependencyManager>,
        assistant: Option<Arc<dyn Assistant>>,
        options: PipelineOptions,
    ) -> Self {
        let mut handler = ErrorHandler::with_builtins(deps.clone());

        if options.repair {
            match &assistant {
                Some(assistant) => {
                    for kind in [ErrorKind::SyntaxDefect, ErrorKind::IndentationDefect] {
                        let fallback = handler.strategy(&kind);
                        let repair = AssistantRepairStrategy::new(assistant.clone())
                            .with_fallback(fallback);
                        handler.register(kind, Arc::new(repair));
                    }
                }
                None => warn!("Repair requested but no assistant configured"),
            }
        }

        Self {
            generator: CodeGenerator::new(),
            deps,
            handler,
            assistant,
            options,
        }
    }

    pub fn with_generator(mut self, generator: CodeGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub fn handler(&self) -> &ErrorHandler {
        &self.handler
    }

    /// Register further strategies before running.
    pub fn handler_mut(&mut self) -> &mut ErrorHandler {
        &mut self.handler
    }

    pub fn generator(&self) -> &CodeGenerator {
        &self.generator
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Run the whole flow for one template.
    ///
    /// Only a dependency gate failure is returned as `Err`. Generation and
    /// remediation failures are reported in the [`PipelineReport`].
    pub async fn run(
        &self,
        template: &str,
        params: &HashMap<String, String>,
    ) -> CoreResult<PipelineReport> {
        let mut report = PipelineReport::default();

        if self.options.skip_deps {
            debug!("Skipping dependency gate");
        } else {
            self.deps.gate().map_err(CoreError::GateFailed)?;
            report.installs = self.deps.auto_install_missing();
        }

        report.assistant_available = self.assistant_available().await;

        let artifact = match self.generator.generate(template, params) {
            Ok(artifact) => artifact,
            Err(e) => {
                report.failure = Some(e.to_string());
                let mut record = e.classify();
                if matches!(
                    record.kind,
                    ErrorKind::SyntaxDefect | ErrorKind::IndentationDefect
                ) {
                    // Rendering is deterministic, so this is the text that failed.
                    if let Ok(code) = self.generator.render(template, params) {
                        record = record.with_code(code);
                    }
                }

                let outcome = self.handler.handle(record).await;
                let repaired = match &outcome {
                    Some(RemediationOutcome::Repaired { code }) => {
                        self.generator.accept(code.clone()).ok()
                    }
                    _ => None,
                };
                report.remediation = outcome;

                match repaired {
                    Some(artifact) => {
                        info!("Continuing with repaired code");
                        report.repaired = true;
                        artifact
                    }
                    None => {
                        error!("Generation failed and was not remediated");
                        return Ok(report);
                    }
                }
            }
        };

        let artifact = if self.options.format {
            self.generator.format_artifact(artifact)
        } else {
            artifact
        };

        if self.options.probe_imports {
            report.modules = self.probe_imports(&artifact).await;
        }

        if self.options.analyze {
            report.analysis = self.analyze(&artifact, report.assistant_available).await;
        }

        report.artifact = Some(artifact);
        Ok(report)
    }

    async fn assistant_available(&self) -> bool {
        let Some(assistant) = &self.assistant else {
            return false;
        };
        let available = assistant.is_available().await;
        if !available {
            warn!("Assistant unreachable, continuing in degraded mode");
        }
        available
    }

    /// Resolve every top-level import, remediating missing ones once.
    async fn probe_imports(&self, artifact: &GeneratedArtifact) -> Vec<ModuleCheck> {
        let modules = match imported_modules(artifact.as_str()) {
            Ok(modules) => modules,
            Err(e) => {
                warn!("Could not list imports: {}", e);
                return Vec::new();
            }
        };

        let mut checks = Vec::with_capacity(modules.len());
        for module in modules {
            let failure = match self.deps.module_status(&module) {
                ModuleStatus::Present => {
                    debug!("Module {} is available", module);
                    checks.push(ModuleCheck {
                        module,
                        available: true,
                        remediation: None,
                    });
                    continue;
                }
                ModuleStatus::Missing => RuntimeFailure::module_not_found(module.clone()),
                ModuleStatus::ImportFailed(message) => RuntimeFailure::Import { message },
            };

            let remediation = self.handler.handle(failure).await;
            let available = remediation.as_ref().is_some_and(RemediationOutcome::is_resolved)
                && self.deps.module_status(&module) == ModuleStatus::Present;
            if !available {
                warn!("Module {} is still unavailable", module);
            }

            checks.push(ModuleCheck {
                module,
                available,
                remediation,
            });
        }
        checks
    }

    async fn analyze(&self, artifact: &GeneratedArtifact, available: bool) -> Option<Value> {
        let assistant = self.assistant.as_ref()?;
        if !available {
            debug!("Skipping analysis, assistant unavailable");
            return None;
        }

        match assistant.analyze(artifact.as_str()).await {
            Ok(report) => {
                info!("Received analysis from {}", assistant.model());
                Some(report)
            }
            Err(e) => {
                warn!("Analysis skipped: {}", e);
                None
            }
        }
    }
}
