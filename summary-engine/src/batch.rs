//! Parallel batch execution for one dependency level.
//!
//! Items of a level are independent by construction, so they are pushed
//! through a bounded pool of concurrent workers; results are folded into
//! the cache and written back to the graph with a single parameterized
//! statement per level. A failed item is logged and skipped; its neighbors
//! continue.

use futures::stream::{self, StreamExt};
use graph_store::GraphStore;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use tracing::{info, warn};

use crate::cache::{CacheEntry, SummaryCache};
use crate::errors::SummaryError;
use crate::processor::{Processed, Status};

/// Default number of concurrent workers per level.
pub const DEFAULT_WORKERS: usize = 8;

/// Outcome counts of one pass (or one level of a pass).
#[derive(Debug, Default, Clone, Copy)]
pub struct PassStats {
    pub regenerated: u64,
    pub restored: u64,
    pub unchanged: u64,
    pub skipped: u64,
    /// Properties written back by the level's update statement.
    pub properties_set: u64,
}

impl PassStats {
    pub fn absorb(&mut self, other: PassStats) {
        self.regenerated += other.regenerated;
        self.restored += other.restored;
        self.unchanged += other.unchanged;
        self.skipped += other.skipped;
        self.properties_set += other.properties_set;
    }
}

/// Processes `items` concurrently, folds the results into `cache`, and
/// issues one batched update for everything that needs the graph refreshed
/// (restored and regenerated items; unchanged items only refresh the
/// cache).
pub async fn run_level<T, F, Fut>(
    store: &GraphStore,
    cache: &SummaryCache,
    update_query: &'static str,
    label: &str,
    items: Vec<T>,
    workers: usize,
    handler: F,
) -> Result<PassStats, SummaryError>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<Option<Processed>, SummaryError>>,
{
    if items.is_empty() {
        return Ok(PassStats::default());
    }

    let bar = ProgressBar::new(items.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos:>4}/{len:4} {msg}").unwrap(),
    );
    bar.set_message(label.to_string());

    let results: Vec<Result<Option<Processed>, SummaryError>> =
        stream::iter(items.into_iter().map(|item| handler(item)))
            .buffer_unordered(workers.max(1))
            .inspect(|_| bar.inc(1))
            .collect()
            .await;
    bar.finish_and_clear();

    let mut stats = PassStats::default();
    let mut rows = Vec::new();

    for result in results {
        let processed = match result {
            Ok(Some(processed)) => processed,
            Ok(None) => {
                stats.skipped += 1;
                continue;
            }
            Err(SummaryError::Graph(e)) => return Err(SummaryError::Graph(e)),
            Err(e) => {
                warn!(label, error = %e, "item failed; skipping");
                stats.skipped += 1;
                continue;
            }
        };

        cache.update(
            &processed.id,
            CacheEntry {
                summary: processed.summary.clone(),
                code_analysis: processed.code_analysis.clone(),
                code_hash: processed.code_hash.clone(),
            },
        );

        match processed.status {
            Status::Unchanged => stats.unchanged += 1,
            Status::Restored => {
                stats.restored += 1;
                rows.push(to_row(&processed));
            }
            Status::Regenerated => {
                cache.mark_regenerated(&processed.id);
                stats.regenerated += 1;
                rows.push(to_row(&processed));
            }
        }
    }

    if !rows.is_empty() {
        let counters = store.write(update_query, json!({ "updates": rows })).await?;
        stats.properties_set = counters.properties_set;
    }

    info!(
        label,
        regenerated = stats.regenerated,
        restored = stats.restored,
        unchanged = stats.unchanged,
        skipped = stats.skipped,
        properties_set = stats.properties_set,
        "level complete"
    );
    Ok(stats)
}

fn to_row(processed: &Processed) -> serde_json::Value {
    let mut row = serde_json::Map::new();
    row.insert("id".to_string(), json!(&processed.id));
    if let Some(summary) = &processed.summary {
        row.insert("summary".to_string(), json!(summary));
    }
    if let Some(analysis) = &processed.code_analysis {
        row.insert("code_analysis".to_string(), json!(analysis));
    }
    if let Some(hash) = &processed.code_hash {
        row.insert("code_hash".to_string(), json!(hash));
    }
    serde_json::Value::Object(row)
}
