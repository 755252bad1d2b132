//! Pass 2: contextual method summaries.
//!
//! Every analyzed method is summarized in the context of its direct
//! callers and callees; their summaries are resolved from the cache, which
//! the analysis pass has just refreshed.

use graph_store::GraphStore;
use serde_json::Value;
use tracing::{info, warn};

use crate::batch::{PassStats, run_level};
use crate::errors::SummaryError;
use crate::processor::{MethodSummaryItem, NodeProcessor};

const METHOD_ITEMS: &str = "
MATCH (m:Method)
WHERE m.code_analysis IS NOT NULL AND m.entity_id IS NOT NULL
OPTIONAL MATCH (caller:Method)-[:INVOKES]->(m)
OPTIONAL MATCH (m)-[:INVOKES]->(callee:Method)
RETURN m.entity_id AS id,
       m.name AS name,
       m.summary AS dbSummary,
       collect(DISTINCT caller.entity_id) AS callers,
       collect(DISTINCT callee.entity_id) AS callees
";

const UPDATE_SUMMARIES: &str = "
UNWIND $updates AS item
MATCH (m:Method {entity_id: item.id})
SET m.summary = item.summary
";

/// Runs the method summary pass.
pub async fn run(
    store: &GraphStore,
    processor: &NodeProcessor,
    workers: usize,
) -> Result<PassStats, SummaryError> {
    info!("--- pass: method summaries ---");

    let records = store.read(METHOD_ITEMS, Value::Null).await?;
    if records.is_empty() {
        warn!("no analyzed methods found; skipping pass");
        return Ok(PassStats::default());
    }

    let items: Vec<MethodSummaryItem> = records
        .iter()
        .filter_map(|r| {
            Some(MethodSummaryItem {
                id: r.string("id")?,
                name: r.string("name").unwrap_or_default(),
                db_summary: r.string("dbSummary"),
                callers: r.string_list("callers"),
                callees: r.string_list("callees"),
            })
        })
        .collect();

    run_level(
        store,
        processor.cache(),
        UPDATE_SUMMARIES,
        "method summaries",
        items,
        workers,
        |item| async move { processor.method_summary(&item).await },
    )
    .await
}
