//! Format command - Normalize whitespace of a Python file.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use mend_syntax::{Formatted, Formatter};

#[derive(Args)]
pub struct FormatArgs {
    /// Python file to format
    file: PathBuf,

    /// Rewrite the file in place instead of printing
    #[arg(short, long)]
    write: bool,

    /// Longest run of blank lines to keep
    #[arg(long, default_value_t = 2)]
    max_blank_lines: usize,
}

pub async fn execute(args: FormatArgs) -> Result<()> {
    info!("Formatting {:?}", args.file);

    let source = fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {:?}", args.file))?;

    let formatted = Formatter::new().max_blank_lines(args.max_blank_lines).format(&source);

    match (&formatted, args.write) {
        (Formatted::Normalized(code), true) => {
            fs::write(&args.file, code)
                .with_context(|| format!("Failed to write {:?}", args.file))?;
            eprintln!("✅ Formatted {}", args.file.display());
        }
        (Formatted::Unchanged(_), true) => {
            eprintln!("✅ {} left unchanged", args.file.display());
        }
        (_, false) => print!("{}", formatted.as_str()),
    }

    Ok(())
}
