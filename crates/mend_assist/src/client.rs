//! HTTP client for the code-repair assistant.
//!
//! Speaks the Ollama-style JSON API: `POST /api/generate` with
//! `{model, prompt, stream: false}` answering `{response, ...}`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{AssistantError, AssistantResult};
use crate::prompt::fix_prompt;
use crate::settings::AssistantSettings;

/// Remote code generation and repair.
#[async_trait]
pub trait Assistant: Send + Sync {
    /// Generate code for a free-form prompt.
    async fn generate(&self, prompt: &str) -> AssistantResult<String>;

    /// Ask for a structured analysis of `code`.
    async fn analyze(&self, code: &str) -> AssistantResult<Value>;

    /// Ask for a fix of `code`, given the error it produced.
    async fn suggest_fix(&self, error_message: &str, code: &str) -> AssistantResult<String>;

    /// Whether the endpoint answers at all.
    async fn is_available(&self) -> bool;

    /// Model identifier sent with every request.
    fn model(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    model: &'a str,
    code: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Assistant backed by a reqwest client.
pub struct AssistantClient {
    settings: AssistantSettings,
    client: reqwest::Client,
}

impl AssistantClient {
    /// Create a client with the configured request timeout.
    pub fn new(settings: AssistantSettings) -> AssistantResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| AssistantError::Client(e.to_string()))?;

        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &AssistantSettings {
        &self.settings
    }

    async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> AssistantResult<reqwest::Response> {
        let url = self.settings.url(path);
        debug!("POST {}", url);

        let response = self.client.post(&url).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Assistant returned {} for {}", status, url);
            return Err(AssistantError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl Assistant for AssistantClient {
    async fn generate(&self, prompt: &str) -> AssistantResult<String> {
        let request = GenerateRequest {
            model: &self.settings.model,
            prompt,
            stream: false,
        };

        let response: GenerateResponse = self
            .post("/api/generate", &request)
            .await?
            .json()
            .await
            .map_err(|e| AssistantError::Decode(e.to_string()))?;

        info!(
            "Assistant generated {} byte(s) with {}",
            response.response.len(),
            self.settings.model
        );
        Ok(response.response)
    }

    async fn analyze(&self, code: &str) -> AssistantResult<Value> {
        let request = AnalyzeRequest {
            model: &self.settings.model,
            code,
            stream: false,
        };

        self.post("/api/analyze", &request)
            .await?
            .json()
            .await
            .map_err(|e| AssistantError::Decode(e.to_string()))
    }

    async fn suggest_fix(&self, error_message: &str, code: &str) -> AssistantResult<String> {
        self.generate(&fix_prompt(error_message, code)).await
    }

    async fn is_available(&self) -> bool {
        let url = self.settings.url("/api/tags");
        match self.client.get(&url).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                debug!("Assistant health check returned {}", response.status());
                false
            }
            Err(e) => {
                debug!("Assistant unreachable at {}: {}", url, e);
                false
            }
        }
    }

    fn model(&self) -> &str {
        &self.settings.model
    }
}
