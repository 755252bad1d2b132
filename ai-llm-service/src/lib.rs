//! LLM and embedding clients for the enrichment pipeline.
//!
//! One summarization surface over four backends (OpenAI, DeepSeek, Ollama,
//! fake) plus a fixed-dimension embedding client. Construct once, wrap in
//! `Arc`, and call from any number of worker tasks; every client reuses a
//! single pooled HTTP connection with a per-request timeout.

pub mod config;
pub mod embeddings;
pub mod error_handler;
pub mod services;

pub use config::llm_model_config::LlmModelConfig;
pub use config::llm_provider::LlmProvider;
pub use embeddings::EmbeddingService;
pub use error_handler::AiLlmError;

use tracing::info;

use crate::services::fake_service::FakeService;
use crate::services::ollama_service::OllamaService;
use crate::services::open_ai_service::OpenAiService;

/// Summarization backend handle.
///
/// OpenAI and DeepSeek share the chat-completions client; only the config
/// differs.
pub enum LlmService {
    Chat(OpenAiService),
    Ollama(OllamaService),
    Fake(FakeService),
}

impl LlmService {
    /// Builds the client for a provider from its environment variables.
    ///
    /// # Errors
    /// [`AiLlmError::MissingVar`] for absent API keys,
    /// [`AiLlmError::InvalidEndpoint`] for malformed endpoints.
    pub fn from_env(provider: LlmProvider) -> Result<Self, AiLlmError> {
        let cfg = LlmModelConfig::from_env(provider)?;
        info!(provider = %provider, model = %cfg.model, "LLM backend configured");
        match provider {
            LlmProvider::OpenAi | LlmProvider::DeepSeek => {
                Ok(Self::Chat(OpenAiService::new(cfg)?))
            }
            LlmProvider::Ollama => Ok(Self::Ollama(OllamaService::new(cfg)?)),
            LlmProvider::Fake => Ok(Self::Fake(FakeService)),
        }
    }

    /// Generates a summary for one prompt.
    ///
    /// # Errors
    /// Transport, HTTP, decode, and empty-response failures from the
    /// underlying backend. Callers treat these as per-item faults.
    pub async fn generate_summary(&self, prompt: &str) -> Result<String, AiLlmError> {
        match self {
            Self::Chat(service) => service.generate(prompt).await,
            Self::Ollama(service) => service.generate(prompt).await,
            Self::Fake(service) => Ok(service.generate(prompt)),
        }
    }
}
