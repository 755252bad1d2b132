//! Embedding client with a fixed output dimension.
//!
//! Real embeddings come from an Ollama-served sentence-transformer model;
//! the fake backend produces deterministic vectors of the right shape so
//! the pipeline (and its tests) can run without a model server.

use futures::stream::{self, StreamExt};
use tracing::info;

use crate::config::llm_model_config::LlmModelConfig;
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{AiLlmError, Result, env_or};
use crate::services::ollama_service::OllamaService;

/// Embedding backend handle. Cheap to share behind an `Arc`.
pub enum EmbeddingService {
    Ollama { service: OllamaService, dim: usize },
    Fake { dim: usize },
}

impl EmbeddingService {
    /// Builds the embedding client from the environment.
    ///
    /// The model name comes from `SENTENCE_TRANSFORMER_MODEL`, the server
    /// from `OLLAMA_BASE_URL`. With `use_fake`, no environment is read.
    pub fn from_env(use_fake: bool, dim: usize) -> Result<Self> {
        if use_fake {
            info!(dim, "using fake embedding backend");
            return Ok(Self::Fake { dim });
        }

        let cfg = LlmModelConfig {
            provider: LlmProvider::Ollama,
            model: env_or("SENTENCE_TRANSFORMER_MODEL", "all-minilm:l6-v2"),
            endpoint: env_or("OLLAMA_BASE_URL", "http://localhost:11434"),
            api_key: None,
            timeout_secs: 120,
        };
        info!(model = %cfg.model, endpoint = %cfg.endpoint, dim, "embedding backend configured");
        Ok(Self::Ollama { service: OllamaService::new(cfg)?, dim })
    }

    /// Output dimensionality every vector is checked against.
    pub fn dim(&self) -> usize {
        match self {
            Self::Ollama { dim, .. } | Self::Fake { dim } => *dim,
        }
    }

    /// Embeds one text.
    ///
    /// # Errors
    /// [`AiLlmError::VectorSizeMismatch`] when the backend returns a vector
    /// of the wrong size; transport and decode errors otherwise.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let vector = match self {
            Self::Ollama { service, .. } => service.embeddings(text).await?,
            Self::Fake { dim } => fake_vector(text, *dim),
        };

        if vector.len() != self.dim() {
            return Err(AiLlmError::VectorSizeMismatch {
                got: vector.len(),
                want: self.dim(),
            });
        }
        Ok(vector)
    }

    /// Embeds a batch, preserving input order, at most `concurrency`
    /// requests in flight.
    pub async fn embed_batch(
        &self,
        texts: &[String],
        concurrency: usize,
    ) -> Result<Vec<Vec<f32>>> {
        stream::iter(texts.iter().map(|t| self.embed(t)))
            .buffered(concurrency.max(1))
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect()
    }
}

/// Deterministic pseudo-embedding: a cheap rolling hash of the text spread
/// over the requested dimensions, normalized into `[-1, 1]`.
fn fake_vector(text: &str, dim: usize) -> Vec<f32> {
    let mut seed: u64 = 1469598103934665603;
    for b in text.as_bytes() {
        seed ^= u64::from(*b);
        seed = seed.wrapping_mul(1099511628211);
    }
    (0..dim)
        .map(|i| {
            let v = seed.wrapping_add(i as u64).wrapping_mul(2654435761) % 2000;
            (v as f32 / 1000.0) - 1.0
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fake_embeddings_are_deterministic() {
        let svc = EmbeddingService::Fake { dim: 384 };
        let a = svc.embed("hello graph").await.unwrap();
        let b = svc.embed("hello graph").await.unwrap();
        let c = svc.embed("something else").await.unwrap();
        assert_eq!(a.len(), 384);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[tokio::test]
    async fn batch_preserves_order() {
        let svc = EmbeddingService::Fake { dim: 8 };
        let texts: Vec<String> = (0..20).map(|i| format!("text {i}")).collect();
        let vectors = svc.embed_batch(&texts, 4).await.unwrap();
        assert_eq!(vectors.len(), 20);
        for (i, v) in vectors.iter().enumerate() {
            assert_eq!(v, &svc.embed(&texts[i]).await.unwrap());
        }
    }
}
