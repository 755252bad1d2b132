//! Run sequencing: normalization, linking, ids, summarization, embedding.
//!
//! The orchestrator owns the cache lifecycle and nothing else: clients are
//! constructed once at startup and borrowed by the passes. The cache is
//! saved on every exit path, so a failed pass still persists whatever was
//! regenerated before it.

use std::sync::Arc;

use ai_llm_service::{EmbeddingService, LlmService};
use graph_store::GraphStore;
use summary_engine::{
    DEFAULT_MAX_CONTEXT, NodeProcessor, PassStats, SummaryCache, TokenBudget,
};
use tracing::{error, info};

/// Outcome of one enrichment run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Summarizer outcome; `None` when summarization was not requested.
    pub summaries: Option<PassStats>,
    pub embedded: u64,
    pub embedding_skipped: u64,
}

pub struct Orchestrator {
    pub store: GraphStore,
    pub cache: Arc<SummaryCache>,
    pub llm: Arc<LlmService>,
    pub embeddings: Arc<EmbeddingService>,
    pub project_name: String,
    pub project_path: String,
    pub generate_summary: bool,
    pub workers: usize,
}

impl Orchestrator {
    /// Runs the full pipeline. The cache is loaded first and saved before
    /// returning, also when a pass failed.
    pub async fn run(&self) -> anyhow::Result<RunReport> {
        self.cache.load();

        let result = self.run_passes().await;

        if let Err(e) = self.cache.save() {
            error!(error = %e, "cache save failed; temp file may hold the latest state");
        }
        result
    }

    async fn run_passes(&self) -> anyhow::Result<RunReport> {
        info!(project = %self.project_name, "enrichment run starting");

        graph_normalize::passes::run_all(&self.store, &self.project_name, &self.project_path)
            .await?;
        graph_normalize::linker::link_sources(&self.store).await?;
        graph_normalize::entities::assign_entity_ids(&self.store).await?;

        let mut report = RunReport::default();
        if self.generate_summary {
            let processor = NodeProcessor::new(
                Arc::clone(&self.llm),
                Arc::clone(&self.cache),
                TokenBudget::new(DEFAULT_MAX_CONTEXT)?,
            );

            let stats =
                summary_engine::passes::run_all(&self.store, &processor, self.workers).await?;
            let (embedded, embedding_skipped) = summary_engine::embedder::embed_entities(
                &self.store,
                &self.embeddings,
                self.workers,
            )
            .await?;

            report.summaries = Some(stats);
            report.embedded = embedded;
            report.embedding_skipped = embedding_skipped;
        } else {
            info!("summarization not requested; skipping summarizer and embedder");
        }

        info!(project = %self.project_name, "enrichment run complete");
        Ok(report)
    }
}
