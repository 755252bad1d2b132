//! Pass 6: the single project summary.

use graph_store::GraphStore;
use serde_json::Value;
use tracing::{info, warn};

use crate::batch::{PassStats, run_level};
use crate::errors::SummaryError;
use crate::processor::{HierarchicalItem, NodeProcessor};
use crate::prompts::HierarchicalKind;

const PROJECT_ITEM: &str = "
MATCH (p:Project)
WHERE p.entity_id IS NOT NULL
OPTIONAL MATCH (p)-[:CONTAINS_SOURCE]->(child)
RETURN p.entity_id AS id,
       p.name AS name,
       p.summary AS dbSummary,
       collect(DISTINCT child.entity_id) AS dependencyIds
LIMIT 1
";

const UPDATE_SUMMARY: &str = "
UNWIND $updates AS item
MATCH (p:Project {entity_id: item.id})
SET p.summary = item.summary
";

/// Runs the project summary pass.
pub async fn run(
    store: &GraphStore,
    processor: &NodeProcessor,
    workers: usize,
) -> Result<PassStats, SummaryError> {
    info!("--- pass: project summary ---");

    let records = store.read(PROJECT_ITEM, Value::Null).await?;
    let items: Vec<HierarchicalItem> = records
        .iter()
        .filter_map(|r| {
            Some(HierarchicalItem {
                id: r.string("id")?,
                name: r.string("name").unwrap_or_default(),
                db_summary: r.string("dbSummary"),
                dependency_ids: r.string_list("dependencyIds"),
            })
        })
        .collect();

    if items.is_empty() {
        warn!("no project node found; skipping pass");
        return Ok(PassStats::default());
    }

    run_level(
        store,
        processor.cache(),
        UPDATE_SUMMARY,
        "project summary",
        items,
        workers,
        |item| async move {
            processor
                .hierarchical_summary(&item, HierarchicalKind::Project)
                .await
        },
    )
    .await
}
