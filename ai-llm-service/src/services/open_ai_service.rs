//! Chat-completions client for OpenAI-protocol providers.
//!
//! Both OpenAI and DeepSeek speak the same chat-completions wire format, so
//! one client covers them; the config decides the endpoint, key, and model.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::llm_model_config::LlmModelConfig;
use crate::error_handler::{AiLlmError, Result, validate_http_endpoint};

/// Thin client for a chat-completions endpoint.
///
/// Reuses one HTTP client with the configured timeout; safe to call from
/// many tasks at once.
pub struct OpenAiService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
}

impl OpenAiService {
    /// Creates a new client from the given config.
    ///
    /// # Errors
    /// - [`AiLlmError::InvalidEndpoint`] if the endpoint is not http(s)
    /// - [`AiLlmError::Transport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self> {
        validate_http_endpoint(&cfg.endpoint)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;

        Ok(Self { client, cfg })
    }

    /// Sends one user prompt and returns the assistant text.
    ///
    /// # Errors
    /// - [`AiLlmError::HttpStatus`] for non-2xx responses
    /// - [`AiLlmError::Decode`] if the response cannot be parsed
    /// - [`AiLlmError::EmptyResponse`] if no choice carries text
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let body = ChatRequest {
            model: &self.cfg.model,
            messages: vec![ChatMessage { role: "user", content: prompt }],
        };

        debug!("POST {}", self.cfg.endpoint);
        let mut request = self.client.post(&self.cfg.endpoint).json(&body);
        if let Some(key) = &self.cfg.api_key {
            request = request.bearer_auth(key);
        }
        let resp = request.send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let url = self.cfg.endpoint.clone();
            let text = resp.text().await.unwrap_or_default();
            let snippet = text.chars().take(240).collect::<String>();
            return Err(AiLlmError::HttpStatus { status, url, snippet });
        }

        let out: ChatResponse = resp
            .json()
            .await
            .map_err(|e| AiLlmError::Decode(format!("serde error: {e}")))?;

        let content = out
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();
        if content.trim().is_empty() {
            return Err(AiLlmError::EmptyResponse);
        }
        Ok(content)
    }
}

/* ==========================
HTTP payloads
========================== */

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: String,
}
