//! Subprocess execution.
//!
//! Every probe and installer invocation goes through [`CommandExecutor`], so
//! the manager can be exercised against [`crate::MockExecutor`] in tests.

use std::process::Command;

use tracing::debug;

use crate::error::{DependencyError, DependencyResult};

/// Captured result of a finished process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, or -1 when the process was terminated by a signal.
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn new(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Check if the process exited with code 0.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Get combined output (stdout + stderr).
    pub fn combined_output(&self) -> String {
        if self.stdout.is_empty() {
            self.stderr.clone()
        } else if self.stderr.is_empty() {
            self.stdout.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }

    /// Last non-empty line of stderr, falling back to stdout.
    pub fn last_error_line(&self) -> &str {
        fn last_line(text: &str) -> Option<&str> {
            text.lines().map(str::trim).filter(|l| !l.is_empty()).last()
        }
        last_line(&self.stderr)
            .or_else(|| last_line(&self.stdout))
            .unwrap_or("Unknown error")
    }
}

/// Runs an external program to completion.
pub trait CommandExecutor: Send + Sync {
    /// Run `program` with `args`, blocking until it exits.
    ///
    /// A missing executable is an error; a non-zero exit is not.
    fn run(&self, program: &str, args: &[&str]) -> DependencyResult<CommandOutput>;
}

/// Executor backed by real processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl SystemExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl CommandExecutor for SystemExecutor {
    fn run(&self, program: &str, args: &[&str]) -> DependencyResult<CommandOutput> {
        debug!("Executing: {}", format_command(program, args));

        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|source| DependencyError::Spawn {
                program: program.to_string(),
                source,
            })?;

        Ok(CommandOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Format a command line for logging.
pub fn format_command(program: &str, args: &[&str]) -> String {
    let mut cmd = program.to_string();
    for arg in args {
        if arg.contains(' ') || arg.contains('=') || arg.contains('\n') {
            cmd.push_str(&format!(" '{}'", arg.replace('\n', "\\n")));
        } else {
            cmd.push_str(&format!(" {}", arg));
        }
    }
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_command() {
        assert_eq!(
            format_command("python3", &["-m", "pip", "install", "requests==2.31"]),
            "python3 -m pip install 'requests==2.31'"
        );
        assert_eq!(
            format_command("sh", &["-c", "curl -fsSL x | sh"]),
            "sh -c 'curl -fsSL x | sh'"
        );
    }

    #[test]
    fn test_last_error_line() {
        let output = CommandOutput::new(1, "", "Collecting foo\nERROR: No matching distribution\n\n");
        assert_eq!(output.last_error_line(), "ERROR: No matching distribution");
        assert!(!output.success());

        let empty = CommandOutput::new(2, "", "");
        assert_eq!(empty.last_error_line(), "Unknown error");
    }

    #[test]
    fn test_missing_executable_is_spawn_error() {
        let result = SystemExecutor::new().run("definitely-not-a-real-binary-5c1f", &["--version"]);
        assert!(matches!(result, Err(DependencyError::Spawn { .. })));
    }
}
