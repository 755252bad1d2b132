//! Pass 4: source-file summaries from their declared types.

use graph_store::GraphStore;
use serde_json::Value;
use tracing::{info, warn};

use crate::batch::{PassStats, run_level};
use crate::errors::SummaryError;
use crate::processor::{HierarchicalItem, NodeProcessor};
use crate::prompts::HierarchicalKind;

const SOURCE_FILE_ITEMS: &str = "
MATCH (sf:SourceFile)
WHERE sf.entity_id IS NOT NULL
OPTIONAL MATCH (sf)<-[:WITH_SOURCE]-(t:Type)
WHERE t.summary IS NOT NULL
RETURN sf.entity_id AS id,
       sf.absolute_path AS path,
       sf.summary AS dbSummary,
       collect(DISTINCT t.entity_id) AS dependencyIds
";

const UPDATE_SUMMARIES: &str = "
UNWIND $updates AS item
MATCH (sf:SourceFile {entity_id: item.id})
SET sf.summary = item.summary
";

/// Runs the source-file summary pass.
pub async fn run(
    store: &GraphStore,
    processor: &NodeProcessor,
    workers: usize,
) -> Result<PassStats, SummaryError> {
    info!("--- pass: source file summaries ---");

    let records = store.read(SOURCE_FILE_ITEMS, Value::Null).await?;
    if records.is_empty() {
        warn!("no source files found; skipping pass");
        return Ok(PassStats::default());
    }

    let items: Vec<HierarchicalItem> = records
        .iter()
        .filter_map(|r| {
            Some(HierarchicalItem {
                id: r.string("id")?,
                name: r.string("path").unwrap_or_default(),
                db_summary: r.string("dbSummary"),
                dependency_ids: r.string_list("dependencyIds"),
            })
        })
        .collect();

    run_level(
        store,
        processor.cache(),
        UPDATE_SUMMARIES,
        "source file summaries",
        items,
        workers,
        |item| async move {
            processor
                .hierarchical_summary(&item, HierarchicalKind::SourceFile)
                .await
        },
    )
    .await
}
