//! codemend CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - 3: Dependency gate failure
//! - 4: Template or generation error
//! - 5: Validation failure

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::{Cli, CliError, Commands};
use mend_core::{CoreError, MendConfig};
use mend_templates::TemplateError;

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const GATE_FAILURE: u8 = 3;
    pub const TEMPLATE_ERROR: u8 = 4;
    pub const VALIDATION_FAILURE: u8 = 5;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let config = match MendConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Error: {:#}", e);
            return ExitCode::from(ExitCodes::INVALID_ARGS);
        }
    };

    let result = match cli.command {
        Commands::Generate(args) => commands::generate::execute(args, &config).await,
        Commands::Validate(args) => commands::validate::execute(args).await,
        Commands::Format(args) => commands::format::execute(args).await,
        Commands::Deps(args) => commands::deps::execute(args, &config).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Install the process-wide subscriber. Logs go to stderr so generated
/// code on stdout stays pipeable.
fn init_logging(verbose: bool, quiet: bool) {
    let directives: &[&str] = if quiet {
        &["warn"]
    } else if verbose {
        &["mend=debug", "info"]
    } else {
        &["mend=info", "warn"]
    };

    let mut filter = EnvFilter::from_default_env();
    for directive in directives {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    if log_result.is_err() {
        // Logging already initialized, continue
    }
}

/// Map an error to its exit code by looking through the error chain.
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if let Some(cli) = cause.downcast_ref::<CliError>() {
            return match cli {
                CliError::InvalidParameter(_) | CliError::NoTemplate => ExitCodes::INVALID_ARGS,
                CliError::GenerationFailed(_) => ExitCodes::TEMPLATE_ERROR,
                CliError::ValidationFailed(_) => ExitCodes::VALIDATION_FAILURE,
            };
        }
        if let Some(core) = cause.downcast_ref::<CoreError>() {
            return match core {
                CoreError::GateFailed(_) => ExitCodes::GATE_FAILURE,
                CoreError::Template(_) | CoreError::Syntax(_) => ExitCodes::TEMPLATE_ERROR,
                CoreError::Config(_) => ExitCodes::INVALID_ARGS,
                _ => ExitCodes::GENERAL_ERROR,
            };
        }
        if cause.downcast_ref::<TemplateError>().is_some() {
            return ExitCodes::TEMPLATE_ERROR;
        }
    }
    ExitCodes::GENERAL_ERROR
}

#[cfg(test)]
mod tests {
    use super::*;
    use mend_deps::DependencyError;

    #[test]
    fn test_gate_failure_exit_code() {
        let err = anyhow::Error::new(CoreError::GateFailed(DependencyError::MissingRequired(
            vec!["python".into()],
        )));
        assert_eq!(categorize_error(&err), ExitCodes::GATE_FAILURE);
    }

    #[test]
    fn test_context_is_looked_through() {
        let err = anyhow::Error::new(CliError::GenerationFailed("x".into()))
            .context("while generating");
        assert_eq!(categorize_error(&err), ExitCodes::TEMPLATE_ERROR);

        let err = anyhow::Error::new(TemplateError::MissingParameter("name".into()))
            .context("rendering");
        assert_eq!(categorize_error(&err), ExitCodes::TEMPLATE_ERROR);
    }

    #[test]
    fn test_other_errors_are_general() {
        let err = anyhow::anyhow!("something else");
        assert_eq!(categorize_error(&err), ExitCodes::GENERAL_ERROR);

        let err = anyhow::Error::new(CliError::ValidationFailed("f.py".into()));
        assert_eq!(categorize_error(&err), ExitCodes::VALIDATION_FAILURE);
    }
}
