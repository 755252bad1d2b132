//! Pass 1: per-method code analysis.
//!
//! Fetches every method with a known source line range, slices its body
//! out of the file on disk, and runs the analysis waterfall keyed on the
//! body's content hash.

use graph_store::GraphStore;
use serde_json::Value;
use tracing::{info, warn};

use crate::batch::{PassStats, run_level};
use crate::errors::SummaryError;
use crate::processor::{MethodAnalysisItem, NodeProcessor};
use crate::snippet;

const METHOD_ITEMS: &str = "
MATCH (m:Method)-[:WITH_SOURCE]->(sf:SourceFile)
WHERE m.firstLineNumber IS NOT NULL AND m.lastLineNumber IS NOT NULL
  AND m.entity_id IS NOT NULL
RETURN m.entity_id AS id,
       sf.absolute_path AS sourceFilePath,
       m.firstLineNumber AS firstLine,
       m.lastLineNumber AS lastLine,
       m.code_analysis AS dbAnalysis,
       m.code_hash AS dbHash
";

const UPDATE_ANALYSES: &str = "
UNWIND $updates AS item
MATCH (m:Method {entity_id: item.id})
SET m.code_analysis = item.code_analysis, m.code_hash = item.code_hash
";

/// Runs the method code-analysis pass.
pub async fn run(
    store: &GraphStore,
    processor: &NodeProcessor,
    workers: usize,
) -> Result<PassStats, SummaryError> {
    info!("--- pass: method code analysis ---");

    let records = store.read(METHOD_ITEMS, Value::Null).await?;
    if records.is_empty() {
        warn!("no methods with source ranges found; skipping pass");
        return Ok(PassStats::default());
    }

    let items: Vec<MethodAnalysisItem> = records
        .iter()
        .filter_map(|r| {
            let id = r.string("id")?;
            let path = r.string("sourceFilePath")?;
            let first = r.i64("firstLine")?;
            let last = r.i64("lastLine")?;
            Some(MethodAnalysisItem {
                id,
                source_code: snippet::extract_snippet(&path, first, last),
                db_analysis: r.string("dbAnalysis"),
                db_hash: r.string("dbHash"),
            })
        })
        .collect();

    run_level(
        store,
        processor.cache(),
        UPDATE_ANALYSES,
        "method analysis",
        items,
        workers,
        |item| async move { processor.method_code_analysis(&item).await },
    )
    .await
}
