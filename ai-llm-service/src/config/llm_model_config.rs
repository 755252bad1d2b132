//! Universal model configuration shared by all backends.

use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{AiLlmError, env_or, must_env};

/// Configuration for one model endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    /// The backend serving this config.
    pub provider: LlmProvider,

    /// Model identifier string (e.g. `"deepseek-coder"`, `"qwen3:14b"`).
    pub model: String,

    /// Inference endpoint (full API URL for hosted providers, base URL for
    /// local servers).
    pub endpoint: String,

    /// API key for providers that require authentication.
    pub api_key: Option<String>,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl LlmModelConfig {
    /// Builds the config for a provider from its environment variables.
    ///
    /// - OpenAI: `OPENAI_API_KEY` (required), `OPENAI_MODEL`
    /// - DeepSeek: `DEEPSEEK_API_KEY` (required), `DEEPSEEK_MODEL`
    /// - Ollama: `OLLAMA_BASE_URL`, `OLLAMA_MODEL`
    /// - Fake: no environment needed
    ///
    /// # Errors
    /// [`AiLlmError::MissingVar`] when a required key is absent.
    pub fn from_env(provider: LlmProvider) -> Result<Self, AiLlmError> {
        match provider {
            LlmProvider::OpenAi => Ok(Self {
                provider,
                model: env_or("OPENAI_MODEL", "gpt-4o-mini"),
                endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
                api_key: Some(must_env("OPENAI_API_KEY")?),
                timeout_secs: 120,
            }),
            LlmProvider::DeepSeek => Ok(Self {
                provider,
                model: env_or("DEEPSEEK_MODEL", "deepseek-coder"),
                endpoint: "https://api.deepseek.com/chat/completions".to_string(),
                api_key: Some(must_env("DEEPSEEK_API_KEY")?),
                timeout_secs: 120,
            }),
            LlmProvider::Ollama => Ok(Self {
                provider,
                model: env_or("OLLAMA_MODEL", "deepseek-llm:7b"),
                endpoint: env_or("OLLAMA_BASE_URL", "http://localhost:11434"),
                api_key: None,
                timeout_secs: 300,
            }),
            LlmProvider::Fake => Ok(Self {
                provider,
                model: "fake".to_string(),
                endpoint: String::new(),
                api_key: None,
                timeout_secs: 1,
            }),
        }
    }
}
