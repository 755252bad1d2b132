//! Pass 3: type summaries, ordered by inheritance level.
//!
//! Source-linked types are grouped into levels: level 0 has no
//! source-linked parents, level k+1 has all parents in levels ≤ k. Levels
//! run strictly in ascending order so a type's parents are always
//! summarized before the type itself; cycles in the raw graph cannot occur
//! along `EXTENDS`/`IMPLEMENTS` between compiled types.

use std::collections::HashSet;

use graph_store::GraphStore;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::batch::{PassStats, run_level};
use crate::errors::SummaryError;
use crate::processor::{NodeProcessor, TypeSummaryItem};

const SOURCE_LINKED_TYPES: &str = "
MATCH (t:Type)-[:WITH_SOURCE]->(:SourceFile)
WHERE (t:Class OR t:Interface OR t:Enum OR t:Record)
  AND t.entity_id IS NOT NULL
RETURN DISTINCT t.entity_id AS id
";

const LEVEL_ZERO_TYPES: &str = "
MATCH (t:Type)
WHERE t.entity_id IN $ids
  AND NOT (t)-[:EXTENDS|IMPLEMENTS]->(:Type)-[:WITH_SOURCE]->()
RETURN t.entity_id AS id
";

const NEXT_LEVEL_TYPES: &str = "
MATCH (t:Type)
WHERE t.entity_id IN $allIds AND NOT t.entity_id IN $visitedIds
WITH t, [(t)-[:EXTENDS|IMPLEMENTS]->(p:Type) WHERE p.entity_id IN $allIds | p] AS parents
WHERE size(parents) > 0 AND all(p IN parents WHERE p.entity_id IN $visitedIds)
RETURN t.entity_id AS id
";

const TYPE_CONTEXT: &str = "
MATCH (t:Type)
WHERE t.entity_id IN $ids
OPTIONAL MATCH (t)-[:EXTENDS|IMPLEMENTS]->(p:Type)
WITH t, collect(DISTINCT p.entity_id) AS parentIds
OPTIONAL MATCH (t)-[:DECLARES]->(m)
WHERE m:Method OR m:Field
WITH t, parentIds, collect(DISTINCT m.entity_id) AS memberIds
RETURN t.entity_id AS id,
       t.name AS name,
       t.summary AS dbSummary,
       labels(t) AS labels,
       parentIds,
       memberIds
";

const UPDATE_SUMMARIES: &str = "
UNWIND $updates AS item
MATCH (t:Type {entity_id: item.id})
SET t.summary = item.summary
";

const TYPE_LABELS: [&str; 4] = ["Class", "Interface", "Enum", "Record"];

/// Runs the type summary pass level by level.
pub async fn run(
    store: &GraphStore,
    processor: &NodeProcessor,
    workers: usize,
) -> Result<PassStats, SummaryError> {
    info!("--- pass: type summaries ---");

    let levels = types_by_inheritance_level(store).await?;
    if levels.is_empty() {
        warn!("no source-linked types found; skipping pass");
        return Ok(PassStats::default());
    }

    let mut stats = PassStats::default();
    for (level, ids) in levels.iter().enumerate() {
        info!(level, types = ids.len(), "processing inheritance level");

        let records = store.read(TYPE_CONTEXT, json!({ "ids": ids })).await?;
        let items: Vec<TypeSummaryItem> = records
            .iter()
            .filter_map(|r| {
                let labels = r.string_list("labels");
                let label = labels
                    .iter()
                    .find(|l| TYPE_LABELS.contains(&l.as_str()))
                    .cloned()
                    .unwrap_or_else(|| "Type".to_string());
                Some(TypeSummaryItem {
                    id: r.string("id")?,
                    name: r.string("name").unwrap_or_default(),
                    label,
                    db_summary: r.string("dbSummary"),
                    parent_ids: r.string_list("parentIds"),
                    member_ids: r.string_list("memberIds"),
                })
            })
            .collect();

        let level_stats = run_level(
            store,
            processor.cache(),
            UPDATE_SUMMARIES,
            "type summaries",
            items,
            workers,
            |item| async move { processor.type_summary(&item).await },
        )
        .await?;
        stats.absorb(level_stats);
    }
    Ok(stats)
}

/// Levels of the inheritance hierarchy, index 0 first. Types whose parents
/// never all resolve (dangling edges) are left out, like any node the
/// traversal cannot order.
async fn types_by_inheritance_level(
    store: &GraphStore,
) -> Result<Vec<Vec<String>>, SummaryError> {
    let all_ids: Vec<String> = store
        .read(SOURCE_LINKED_TYPES, Value::Null)
        .await?
        .iter()
        .filter_map(|r| r.string("id"))
        .collect();
    if all_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut levels: Vec<Vec<String>> = Vec::new();
    let mut visited: HashSet<String> = HashSet::new();

    let level_zero: Vec<String> = store
        .read(LEVEL_ZERO_TYPES, json!({ "ids": &all_ids }))
        .await?
        .iter()
        .filter_map(|r| r.string("id"))
        .collect();
    if level_zero.is_empty() {
        return Ok(Vec::new());
    }
    visited.extend(level_zero.iter().cloned());
    levels.push(level_zero);

    loop {
        let visited_ids: Vec<&String> = visited.iter().collect();
        let next: Vec<String> = store
            .read(
                NEXT_LEVEL_TYPES,
                json!({ "allIds": &all_ids, "visitedIds": visited_ids }),
            )
            .await?
            .iter()
            .filter_map(|r| r.string("id"))
            .collect();
        if next.is_empty() {
            break;
        }
        visited.extend(next.iter().cloned());
        levels.push(next);
    }

    Ok(levels)
}
