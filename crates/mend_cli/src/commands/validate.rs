//! Validate command - Check a Python file for syntax defects.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use mend_syntax::{SyntaxError, Validator};

use super::CliError;

#[derive(Args)]
pub struct ValidateArgs {
    /// Python file to validate
    file: PathBuf,
}

pub async fn execute(args: ValidateArgs) -> Result<()> {
    info!("Validating {:?}", args.file);

    let source = fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {:?}", args.file))?;

    match Validator::new().validate(&source) {
        Ok(()) => {
            println!("✅ {} is valid", args.file.display());
            Ok(())
        }
        Err(SyntaxError::Defect(defect)) => {
            println!("❌ {}", args.file.display());
            println!("   {}", defect);
            if let Some(text) = source.lines().nth(defect.line.saturating_sub(1)) {
                println!("   {:>4} | {}", defect.line, text);
                println!("        | {}^", " ".repeat(defect.column.saturating_sub(1)));
            }
            Err(CliError::ValidationFailed(args.file.display().to_string()).into())
        }
        Err(e) => Err(e.into()),
    }
}
