//! Level-ordered summarizer passes.
//!
//! Fixed sequence, leaves first: method analysis → method summaries →
//! type summaries (by inheritance level) → source files → directories
//! (deepest first) → project. Each pass completes before the next starts;
//! within a level, items run on the shared worker pool.

mod directory;
mod method_analysis;
mod method_summary;
mod project;
mod source_file;
mod type_summary;

use graph_store::GraphStore;
use tracing::info;

use crate::batch::PassStats;
use crate::errors::SummaryError;
use crate::processor::NodeProcessor;

/// Runs all summarizer passes in dependency order and returns the merged
/// outcome counts.
pub async fn run_all(
    store: &GraphStore,
    processor: &NodeProcessor,
    workers: usize,
) -> Result<PassStats, SummaryError> {
    info!(workers, "--- summarizer passes starting ---");

    let mut stats = PassStats::default();
    stats.absorb(method_analysis::run(store, processor, workers).await?);
    stats.absorb(method_summary::run(store, processor, workers).await?);
    stats.absorb(type_summary::run(store, processor, workers).await?);
    stats.absorb(source_file::run(store, processor, workers).await?);
    stats.absorb(directory::run(store, processor, workers).await?);
    stats.absorb(project::run(store, processor, workers).await?);

    info!(
        regenerated = stats.regenerated,
        restored = stats.restored,
        unchanged = stats.unchanged,
        skipped = stats.skipped,
        "--- summarizer passes complete ---"
    );
    Ok(stats)
}
