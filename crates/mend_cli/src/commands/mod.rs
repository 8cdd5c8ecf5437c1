//! CLI command definitions.
//!
//! Each subcommand maps to one stage of the pipeline, or to the whole of it.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use thiserror::Error;

pub mod deps;
pub mod format;
pub mod generate;
pub mod validate;

/// codemend - self-remediating Python code generation
#[derive(Parser)]
#[command(name = "mend")]
#[command(version, about = "codemend - self-remediating Python code generation")]
#[command(long_about = r#"
codemend renders Python code from templates, validates it, and routes
failures to remediation strategies: installing missing modules, producing
diagnostics, or asking a local LLM assistant for a fix.

COMMANDS:
  generate  → Render a template, validate it, remediate failures
  validate  → Check a Python file for syntax defects
  format    → Normalize whitespace of a Python file
  deps      → Report (and optionally install) dependencies

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Dependency gate failure
  4 - Template or generation error
  5 - Validation failure
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Configuration file (defaults to ./mend.yaml or ./mend.toml)
    #[arg(short, long, global = true, env = "MEND_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate code from a template
    Generate(generate::GenerateArgs),

    /// Validate a Python file
    Validate(validate::ValidateArgs),

    /// Format a Python file
    Format(format::FormatArgs),

    /// Check dependencies
    Deps(deps::DepsArgs),
}

/// Failures raised by the commands themselves.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid parameter {0:?}: expected key=value")]
    InvalidParameter(String),

    #[error("Provide --template or --template-file")]
    NoTemplate,

    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}
