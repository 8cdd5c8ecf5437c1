//! Mock command executor for testing.
//!
//! Provides a configurable [`CommandExecutor`] for unit tests that must not
//! touch the host's Python, pip or package installers.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{DependencyError, DependencyResult};
use crate::executor::{format_command, CommandExecutor, CommandOutput};

/// Predefined response for a matching command.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// The process ran and produced this output.
    Output(CommandOutput),
    /// The executable could not be found.
    NotFound,
}

impl MockResponse {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self::Output(CommandOutput::new(0, stdout, ""))
    }

    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self::Output(CommandOutput::new(exit_code, "", stderr))
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}

/// Captured call information for verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedCall {
    pub program: String,
    pub args: Vec<String>,
}

impl CapturedCall {
    /// The call rendered the same way it is matched.
    pub fn command_line(&self) -> String {
        let args: Vec<&str> = self.args.iter().map(String::as_str).collect();
        format_command(&self.program, &args)
    }
}

type Predicate = Arc<dyn Fn(&str, &[String]) -> bool + Send + Sync>;

enum Matcher {
    Prefix(String),
    Predicate(Predicate),
}

struct Rule {
    matcher: Matcher,
    responses: VecDeque<MockResponse>,
}

impl Rule {
    fn matches(&self, call: &CapturedCall) -> bool {
        match &self.matcher {
            Matcher::Prefix(prefix) => call.command_line().starts_with(prefix.as_str()),
            Matcher::Predicate(predicate) => predicate(&call.program, &call.args),
        }
    }

    /// Responses are consumed in order; the last one repeats forever.
    fn next_response(&mut self) -> MockResponse {
        if self.responses.len() > 1 {
            self.responses.pop_front().unwrap_or(MockResponse::NotFound)
        } else {
            self.responses.front().cloned().unwrap_or(MockResponse::NotFound)
        }
    }
}

/// Mock executor for testing.
///
/// Commands are matched against rules in reverse registration order, so a
/// later rule overrides an earlier one. Unmatched commands behave like a
/// missing executable.
#[derive(Clone, Default)]
pub struct MockExecutor {
    rules: Arc<RwLock<Vec<Rule>>>,
    captured_calls: Arc<RwLock<Vec<CapturedCall>>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond to commands whose formatted command line starts with `prefix`.
    pub fn on(self, prefix: impl Into<String>, response: MockResponse) -> Self {
        self.on_sequence(prefix, vec![response])
    }

    /// Respond with `responses` in order, repeating the last one.
    pub fn on_sequence(self, prefix: impl Into<String>, responses: Vec<MockResponse>) -> Self {
        self.rules.write().push(Rule {
            matcher: Matcher::Prefix(prefix.into()),
            responses: responses.into(),
        });
        self
    }

    /// Respond to commands accepted by `predicate`.
    pub fn on_match<F>(self, predicate: F, response: MockResponse) -> Self
    where
        F: Fn(&str, &[String]) -> bool + Send + Sync + 'static,
    {
        self.on_match_sequence(predicate, vec![response])
    }

    /// Respond to commands accepted by `predicate` with `responses` in
    /// order, repeating the last one.
    pub fn on_match_sequence<F>(self, predicate: F, responses: Vec<MockResponse>) -> Self
    where
        F: Fn(&str, &[String]) -> bool + Send + Sync + 'static,
    {
        self.rules.write().push(Rule {
            matcher: Matcher::Predicate(Arc::new(predicate)),
            responses: responses.into(),
        });
        self
    }

    /// Get all captured calls.
    pub fn get_calls(&self) -> Vec<CapturedCall> {
        self.captured_calls.read().clone()
    }

    /// Get the number of calls made.
    pub fn call_count(&self) -> usize {
        self.captured_calls.read().len()
    }

    /// Check if any call's command line starts with `prefix`.
    pub fn was_called(&self, prefix: &str) -> bool {
        self.captured_calls
            .read()
            .iter()
            .any(|c| c.command_line().starts_with(prefix))
    }

    /// Clear all captured calls.
    pub fn clear_calls(&self) {
        self.captured_calls.write().clear();
    }
}

impl CommandExecutor for MockExecutor {
    fn run(&self, program: &str, args: &[&str]) -> DependencyResult<CommandOutput> {
        let call = CapturedCall {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        };
        self.captured_calls.write().push(call.clone());

        let response = self
            .rules
            .write()
            .iter_mut()
            .rev()
            .find(|rule| rule.matches(&call))
            .map(Rule::next_response)
            .unwrap_or(MockResponse::NotFound);

        match response {
            MockResponse::Output(output) => Ok(output),
            MockResponse::NotFound => Err(DependencyError::Spawn {
                program: program.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "mock: no such file"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_match() {
        let executor = MockExecutor::new().on("python3 --version", MockResponse::success("Python 3.11.2"));

        let output = executor.run("python3", &["--version"]).unwrap();
        assert_eq!(output.stdout, "Python 3.11.2");
        assert!(executor.was_called("python3 --version"));
    }

    #[test]
    fn test_unmatched_is_not_found() {
        let executor = MockExecutor::new();
        assert!(executor.run("ollama", &["--version"]).is_err());
        assert_eq!(executor.call_count(), 1);
    }

    #[test]
    fn test_calls_captured_and_cleared() {
        let executor = MockExecutor::new().on("python3", MockResponse::success("ok"));
        executor.run("python3", &["-m", "pip", "install", "requests==2.31"]).unwrap();

        let calls = executor.get_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, "python3");
        assert_eq!(calls[0].args, vec!["-m", "pip", "install", "requests==2.31"]);
        assert_eq!(calls[0].command_line(), "python3 -m pip install 'requests==2.31'");

        executor.clear_calls();
        assert_eq!(executor.call_count(), 0);
        assert!(executor.get_calls().is_empty());
    }

    #[test]
    fn test_sequence_repeats_last() {
        let executor = MockExecutor::new().on_sequence(
            "ollama --version",
            vec![MockResponse::not_found(), MockResponse::success("ollama 0.1.32")],
        );

        assert!(executor.run("ollama", &["--version"]).is_err());
        assert!(executor.run("ollama", &["--version"]).is_ok());
        assert!(executor.run("ollama", &["--version"]).is_ok());
    }

    #[test]
    fn test_later_rule_wins() {
        let executor = MockExecutor::new()
            .on("pip", MockResponse::failure(1, "old"))
            .on("pip", MockResponse::success("new"));
        assert!(executor.run("pip", &["--version"]).unwrap().success());
    }

    #[test]
    fn test_predicate_match() {
        let executor = MockExecutor::new().on_match(
            |program, args| program == "python3" && args.last().map(String::as_str) == Some("yaml"),
            MockResponse::failure(1, ""),
        );
        let output = executor.run("python3", &["-c", "script", "yaml"]).unwrap();
        assert_eq!(output.exit_code, 1);
    }
}
