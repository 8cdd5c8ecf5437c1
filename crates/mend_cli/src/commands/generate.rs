//! Generate command - Render, validate and remediate a template.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{info, warn};

use mend_assist::{Assistant, AssistantClient};
use mend_core::{MendConfig, Pipeline, PipelineOptions, PipelineReport};
use mend_deps::DependencyManager;
use mend_templates::TemplateRenderer;

use super::CliError;

#[derive(Args)]
pub struct GenerateArgs {
    /// Inline template text with {name} placeholders
    #[arg(short, long, conflicts_with = "template_file")]
    template: Option<String>,

    /// Read the template from a file
    #[arg(short = 'f', long)]
    template_file: Option<PathBuf>,

    /// Template parameter as key=value (repeatable)
    #[arg(short = 'p', long = "param", value_parser = parse_key_val)]
    params: Vec<(String, String)>,

    /// Write the artifact here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Normalize whitespace of the artifact
    #[arg(long)]
    format: bool,

    /// Let the assistant repair syntax failures
    #[arg(long)]
    repair: bool,

    /// Skip the dependency gate and import checks
    #[arg(long)]
    skip_deps: bool,

    /// Do not send the artifact to the assistant for analysis
    #[arg(long)]
    no_analyze: bool,
}

impl GenerateArgs {
    fn options(&self) -> PipelineOptions {
        PipelineOptions {
            skip_deps: self.skip_deps,
            probe_imports: !self.skip_deps,
            format: self.format,
            analyze: !self.no_analyze,
            repair: self.repair,
        }
    }

    fn load_template(&self) -> Result<String> {
        match (&self.template, &self.template_file) {
            (Some(template), _) => Ok(template.clone()),
            (None, Some(path)) => fs::read_to_string(path)
                .with_context(|| format!("Failed to read template {:?}", path)),
            (None, None) => Err(CliError::NoTemplate.into()),
        }
    }
}

/// Parse a `key=value` pair. The value may itself contain `=`.
pub fn parse_key_val(s: &str) -> Result<(String, String), CliError> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(CliError::InvalidParameter(s.to_string())),
    }
}

pub async fn execute(args: GenerateArgs, config: &MendConfig) -> Result<()> {
    let template = args.load_template()?;
    let params: HashMap<String, String> = args.params.iter().cloned().collect();
    info!("Generating from template with {} parameter(s)", params.len());

    if let Ok(missing) = TemplateRenderer::new().missing_parameters(&template, &params) {
        if !missing.is_empty() {
            eprintln!("⚠️  No value for placeholder(s): {}", missing.join(", "));
        }
    }

    let deps = Arc::new(DependencyManager::system(config.dependency_settings()));
    let assistant: Option<Arc<dyn Assistant>> = match AssistantClient::new(config.assistant.clone())
    {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            warn!("Assistant disabled: {}", e);
            None
        }
    };

    let pipeline = Pipeline::new(deps, assistant, args.options());
    let report = pipeline.run(&template, &params).await?;

    print_report(&report);

    let Some(artifact) = report.artifact else {
        let reason = report
            .failure
            .unwrap_or_else(|| "unknown failure".to_string());
        return Err(CliError::GenerationFailed(reason).into());
    };

    match &args.output {
        Some(path) => {
            fs::write(path, artifact.as_str())
                .with_context(|| format!("Failed to write {:?}", path))?;
            eprintln!("✅ Wrote {} line(s) to {:?}", artifact.line_count(), path);
        }
        None => print!("{}", artifact),
    }

    Ok(())
}

/// Status goes to stderr; stdout carries only the artifact.
fn print_report(report: &PipelineReport) {
    for attempt in &report.installs {
        let mark = if attempt.success { "✅" } else { "⚠️ " };
        eprintln!("{} Auto-install {}", mark, attempt.name);
    }

    if let Some(failure) = &report.failure {
        eprintln!("❌ {}", failure);
        match &report.remediation {
            Some(outcome) => eprintln!("   ↳ {}", outcome),
            None => eprintln!("   ↳ no remediation available"),
        }
    }
    if report.repaired {
        eprintln!("🔧 Code was repaired by the assistant");
    }

    for check in &report.modules {
        if check.available {
            continue;
        }
        eprintln!("⚠️  Module '{}' is not available", check.module);
        if let Some(outcome) = &check.remediation {
            eprintln!("   ↳ {}", outcome);
        }
    }

    if let Some(analysis) = &report.analysis {
        if let Ok(pretty) = serde_json::to_string_pretty(analysis) {
            eprintln!("📋 Analysis:\n{}", pretty);
        }
    }
}
