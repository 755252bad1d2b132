//! Error type for the summarization engine.

use graph_store::GraphError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SummaryError {
    /// Gateway failure; fatal to the running pass.
    #[error("summarization stopped: {0}")]
    Graph(#[from] GraphError),

    /// LLM or embedding backend failure; per-item, the item is skipped.
    #[error("llm call failed: {0}")]
    Llm(#[from] ai_llm_service::AiLlmError),

    /// Cache file I/O failure.
    #[error("cache i/o error: {0}")]
    CacheIo(#[from] std::io::Error),

    /// Tokenizer could not be constructed.
    #[error("tokenizer setup failed: {0}")]
    Tokenizer(String),
}
