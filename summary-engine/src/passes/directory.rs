//! Pass 5: directory summaries, deepest directories first.
//!
//! Only directories participating in the source overlay are summarized;
//! processing by descending path depth guarantees a directory's children
//! were handled in an earlier level.

use std::collections::BTreeMap;

use graph_store::GraphStore;
use serde_json::Value;
use tracing::{info, warn};

use crate::batch::{PassStats, run_level};
use crate::errors::SummaryError;
use crate::processor::{HierarchicalItem, NodeProcessor};
use crate::prompts::HierarchicalKind;

const DIRECTORY_ITEMS: &str = "
MATCH (d:Directory)
WHERE d.absolute_path IS NOT NULL AND d.entity_id IS NOT NULL
  AND EXISTS { (d)-[:CONTAINS_SOURCE]->() }
OPTIONAL MATCH (d)-[:CONTAINS_SOURCE]->(child)
WHERE child:SourceFile OR child:Directory
RETURN d.entity_id AS id,
       d.absolute_path AS path,
       size(split(d.absolute_path, '/')) AS depth,
       d.summary AS dbSummary,
       collect(DISTINCT child.entity_id) AS dependencyIds
";

const UPDATE_SUMMARIES: &str = "
UNWIND $updates AS item
MATCH (d:Directory {entity_id: item.id})
SET d.summary = item.summary
";

/// Runs the directory summary pass.
pub async fn run(
    store: &GraphStore,
    processor: &NodeProcessor,
    workers: usize,
) -> Result<PassStats, SummaryError> {
    info!("--- pass: directory summaries ---");

    let records = store.read(DIRECTORY_ITEMS, Value::Null).await?;
    if records.is_empty() {
        warn!("no source directories found; skipping pass");
        return Ok(PassStats::default());
    }

    // Deepest level first; within a level, directories are independent.
    let mut by_depth: BTreeMap<i64, Vec<HierarchicalItem>> = BTreeMap::new();
    for r in &records {
        let (Some(id), Some(depth)) = (r.string("id"), r.i64("depth")) else {
            continue;
        };
        by_depth.entry(depth).or_default().push(HierarchicalItem {
            id,
            name: r.string("path").unwrap_or_default(),
            db_summary: r.string("dbSummary"),
            dependency_ids: r.string_list("dependencyIds"),
        });
    }

    let mut stats = PassStats::default();
    for (depth, items) in by_depth.into_iter().rev() {
        info!(depth, directories = items.len(), "processing directory level");
        let level_stats = run_level(
            store,
            processor.cache(),
            UPDATE_SUMMARIES,
            "directory summaries",
            items,
            workers,
            |item| async move {
                processor
                    .hierarchical_summary(&item, HierarchicalKind::Directory)
                    .await
            },
        )
        .await?;
        stats.absorb(level_stats);
    }
    Ok(stats)
}
