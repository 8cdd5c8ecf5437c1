//! Mock assistant for testing.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use crate::client::Assistant;
use crate::error::{AssistantError, AssistantResult};

/// A recorded assistant call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistantCall {
    Generate { prompt: String },
    Analyze { code: String },
    SuggestFix { error_message: String, code: String },
}

#[derive(Default)]
struct MockState {
    available: bool,
    replies: VecDeque<AssistantResult<String>>,
    analysis: Option<Value>,
    calls: Vec<AssistantCall>,
}

/// Scripted [`Assistant`].
///
/// Text replies are consumed in order by `generate` and `suggest_fix`. With
/// no reply queued those calls fail like an unreachable endpoint.
#[derive(Clone, Default)]
pub struct MockAssistant {
    state: Arc<RwLock<MockState>>,
}

impl MockAssistant {
    /// A mock that reports itself available.
    pub fn new() -> Self {
        let mock = Self::default();
        mock.state.write().available = true;
        mock
    }

    /// A mock whose health check fails.
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Queue a successful text reply.
    pub fn reply(self, text: impl Into<String>) -> Self {
        self.state.write().replies.push_back(Ok(text.into()));
        self
    }

    /// Queue an HTTP error reply.
    pub fn fail(self, status: u16) -> Self {
        self.state.write().replies.push_back(Err(AssistantError::Status {
            status,
            body: "mock failure".to_string(),
        }));
        self
    }

    /// Set the report returned by `analyze`.
    pub fn analysis(self, report: Value) -> Self {
        self.state.write().analysis = Some(report);
        self
    }

    pub fn calls(&self) -> Vec<AssistantCall> {
        self.state.read().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.read().calls.len()
    }

    fn next_reply(&self, call: AssistantCall) -> AssistantResult<String> {
        let mut state = self.state.write();
        state.calls.push(call);
        state
            .replies
            .pop_front()
            .unwrap_or_else(|| Err(AssistantError::Decode("mock: no reply queued".to_string())))
    }
}

#[async_trait]
impl Assistant for MockAssistant {
    async fn generate(&self, prompt: &str) -> AssistantResult<String> {
        self.next_reply(AssistantCall::Generate {
            prompt: prompt.to_string(),
        })
    }

    async fn analyze(&self, code: &str) -> AssistantResult<Value> {
        let mut state = self.state.write();
        state.calls.push(AssistantCall::Analyze {
            code: code.to_string(),
        });
        state.analysis.clone().ok_or(AssistantError::Status {
            status: 404,
            body: "mock: no analysis configured".to_string(),
        })
    }

    async fn suggest_fix(&self, error_message: &str, code: &str) -> AssistantResult<String> {
        self.next_reply(AssistantCall::SuggestFix {
            error_message: error_message.to_string(),
            code: code.to_string(),
        })
    }

    async fn is_available(&self) -> bool {
        self.state.read().available
    }

    fn model(&self) -> &str {
        "mock"
    }
}
