//! Pass 1: merge duplicate types and members.
//!
//! The scanner creates "phantom" Type nodes when a `REQUIRES` edge is
//! resolved before the real class file is seen: same `fqn`, but a bare
//! `fileName` instead of the full in-artifact path. The phantom is folded
//! into the real node, keeping the union of the edges. Members duplicated
//! under one type are folded on equal `signature`.

use graph_store::GraphStore;
use tracing::info;

use crate::errors::NormalizeError;

const MERGE_DUPLICATE_TYPES: &str = "
MATCH (a:Artifact:Directory)
MATCH (a)-[:CONTAINS]->(realType:Type)
WHERE realType.fqn IS NOT NULL AND realType.fileName IS NOT NULL
MATCH (a)-[:REQUIRES]->(phantomType:Type)
WHERE phantomType.fqn IS NOT NULL AND phantomType.fileName IS NOT NULL
  AND realType.fqn = phantomType.fqn
  AND realType.fileName ENDS WITH phantomType.fileName
  AND realType.fileName <> phantomType.fileName
WITH realType, phantomType
CALL apoc.refactor.mergeNodes([realType, phantomType], {
    properties: 'discard',
    mergeRels: true
}) YIELD node
RETURN count(node) AS merged
";

const MERGE_DUPLICATE_MEMBERS: &str = "
MATCH (a:Artifact:Directory)-[:CONTAINS]->(t:Type)
MATCH (t)-[:DECLARES]->(realMember:Member)
MATCH (t)-[:DECLARES]->(phantomMember:Member)
WHERE realMember.name IS NOT NULL AND phantomMember.signature IS NOT NULL
  AND realMember.signature = phantomMember.signature
  AND elementId(realMember) <> elementId(phantomMember)
WITH realMember, phantomMember
CALL apoc.refactor.mergeNodes([realMember, phantomMember], {
    properties: 'discard',
    mergeRels: true
}) YIELD node
RETURN count(node) AS merged
";

/// Folds phantom Type nodes into their real counterparts, then duplicated
/// Members on signature equality. Runs before any path rewriting so later
/// passes see one node per entity.
pub async fn merge_duplicates(store: &GraphStore) -> Result<(), NormalizeError> {
    info!("pass: merge duplicate types");
    let counters = store
        .write(MERGE_DUPLICATE_TYPES, serde_json::Value::Null)
        .await?;
    info!(nodes_deleted = counters.nodes_deleted, "duplicate types merged");

    info!("pass: merge duplicate members");
    let counters = store
        .write(MERGE_DUPLICATE_MEMBERS, serde_json::Value::Null)
        .await?;
    info!(nodes_deleted = counters.nodes_deleted, "duplicate members merged");
    Ok(())
}
