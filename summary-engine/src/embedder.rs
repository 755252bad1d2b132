//! Embedding of summarized entities and the vector index.
//!
//! Pages through every `:Entity` carrying a summary, embeds the summaries
//! with bounded concurrency, and bulk-writes the vectors back, one update
//! per page. A failed embedding skips that entity only. Finally ensures
//! the vector index exists; its dimensionality matches the default
//! embedding size.

use std::sync::Arc;

use ai_llm_service::EmbeddingService;
use futures::stream::{self, StreamExt};
use graph_store::GraphStore;
use serde_json::json;
use tracing::{info, warn};

use crate::errors::SummaryError;

const PAGE_SIZE: i64 = 500;

const SUMMARIZED_ENTITIES_PAGE: &str = "
MATCH (e:Entity)
WHERE e.summary IS NOT NULL
RETURN e.entity_id AS id, e.summary AS summary
SKIP $skip LIMIT $limit
";

const UPDATE_EMBEDDINGS: &str = "
UNWIND $updates AS item
MATCH (e:Entity {entity_id: item.id})
SET e.summaryEmbedding = item.embedding
";

const CREATE_VECTOR_INDEX: &str = "
CREATE VECTOR INDEX summary_embeddings IF NOT EXISTS
FOR (e:Entity) ON (e.summaryEmbedding)
OPTIONS {indexConfig: {
    `vector.dimensions`: 384,
    `vector.similarity_function`: 'cosine'
}}
";

/// Embeds every summarized entity and maintains the vector index.
/// Returns `(embedded, skipped)` counts.
pub async fn embed_entities(
    store: &GraphStore,
    embeddings: &Arc<EmbeddingService>,
    concurrency: usize,
) -> Result<(u64, u64), SummaryError> {
    info!("--- pass: entity embeddings ---");

    let mut skip = 0i64;
    let mut embedded = 0u64;
    let mut skipped = 0u64;

    loop {
        let page = store
            .read(
                SUMMARIZED_ENTITIES_PAGE,
                json!({ "skip": skip, "limit": PAGE_SIZE }),
            )
            .await?;
        skip += PAGE_SIZE;
        if page.is_empty() {
            break;
        }

        let entries: Vec<(String, String)> = page
            .iter()
            .filter_map(|r| Some((r.string("id")?, r.string("summary")?)))
            .collect();

        // Per-entity embedding: one failure never drops the page.
        let results: Vec<(String, Option<Vec<f32>>)> =
            stream::iter(entries.into_iter().map(|(id, summary)| async move {
                match embeddings.embed(&summary).await {
                    Ok(vector) => (id, Some(vector)),
                    Err(e) => {
                        warn!(entity = %id, error = %e, "embedding failed; entity skipped");
                        (id, None)
                    }
                }
            }))
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;

        let updates: Vec<serde_json::Value> = results
            .into_iter()
            .filter_map(|(id, vector)| match vector {
                Some(v) => Some(json!({ "id": id, "embedding": v })),
                None => {
                    skipped += 1;
                    None
                }
            })
            .collect();

        if !updates.is_empty() {
            embedded += updates.len() as u64;
            store
                .write(UPDATE_EMBEDDINGS, json!({ "updates": updates }))
                .await?;
        }
        info!(page_embedded = embedded, "embedding page written");
    }

    store.write(CREATE_VECTOR_INDEX, serde_json::Value::Null).await?;
    info!(embedded, skipped, "entity embeddings complete; vector index ready");
    Ok((embedded, skipped))
}
