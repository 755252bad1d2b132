//! Entity labeling and stable content-addressed identifiers.
//!
//! Every node that participates in summarization gets the `:Entity` label
//! and an `entity_id` that is stable across scans: the md5 of the node's
//! identity key. Keys are built from artifact-relative names, never from
//! internal element ids, so a re-scan of the same project regenerates the
//! same ids and the summary cache stays valid.

use graph_store::GraphStore;
use md5::{Digest, Md5};
use serde_json::json;
use tracing::info;

use crate::errors::NormalizeError;

const ID_BATCH_SIZE: usize = 1000;

const CREATE_ENTITY_ID_CONSTRAINT: &str = "
CREATE CONSTRAINT entity_id_unique IF NOT EXISTS
FOR (e:Entity) REQUIRE e.entity_id IS UNIQUE
";

const PROJECT_NODE: &str = "
MATCH (p:Project)
WHERE p.absolute_path IS NOT NULL
RETURN p.absolute_path AS path
";

const SET_PROJECT_ENTITY: &str = "
MATCH (p:Project {absolute_path: $path})
SET p:Entity, p.entity_id = $id
";

const ARTIFACT_NODES: &str = "
MATCH (a:Artifact)
WHERE a.fileName IS NOT NULL
RETURN a.fileName AS fileName
";

const SET_ARTIFACT_ENTITIES: &str = "
UNWIND $rows AS row
MATCH (a:Artifact {fileName: row.fileName})
SET a:Entity, a.entity_id = row.id
";

const FILESYSTEM_NODES: &str = "
MATCH (a:Artifact)-[:CONTAINS]->(n)
WHERE (n:File OR n:Directory OR n:Package OR n:Type)
  AND a.fileName IS NOT NULL AND n.fileName IS NOT NULL
RETURN a.fileName AS artifact, n.fileName AS fileName
";

const SET_FILESYSTEM_ENTITIES: &str = "
UNWIND $rows AS row
MATCH (a:Artifact {fileName: row.artifact})-[:CONTAINS]->(n {fileName: row.fileName})
WHERE n:File OR n:Directory OR n:Package OR n:Type
SET n:Entity, n.entity_id = row.id
";

const MEMBER_NODES: &str = "
MATCH (a:Artifact)-[:CONTAINS]->(t:Type)-[:DECLARES]->(m:Member)
WHERE a.fileName IS NOT NULL AND t.fileName IS NOT NULL AND m.signature IS NOT NULL
RETURN a.fileName AS artifact, t.fileName AS typeFile, m.signature AS signature
";

const SET_MEMBER_ENTITIES: &str = "
UNWIND $rows AS row
MATCH (a:Artifact {fileName: row.artifact})-[:CONTAINS]->(t:Type {fileName: row.typeFile})-[:DECLARES]->(m:Member {signature: row.signature})
SET m:Entity, m.entity_id = row.id
";

/// md5 over the concatenated key parts, lowercase hex.
pub fn entity_id(parts: &[&str]) -> String {
    let mut hasher = Md5::new();
    for part in parts {
        hasher.update(part.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// Labels Project, Artifact, filesystem, and Member nodes as `:Entity` and
/// assigns their stable ids. The uniqueness constraint is created first.
pub async fn assign_entity_ids(store: &GraphStore) -> Result<(), NormalizeError> {
    info!("pass: assign entity ids");

    store
        .write(CREATE_ENTITY_ID_CONSTRAINT, serde_json::Value::Null)
        .await?;

    // Project
    for record in store.read(PROJECT_NODE, serde_json::Value::Null).await? {
        let Some(path) = record.string("path") else {
            continue;
        };
        let id = entity_id(&["Project://", &path]);
        store
            .write(SET_PROJECT_ENTITY, json!({ "path": path, "id": id }))
            .await?;
    }

    // Artifacts
    let rows: Vec<serde_json::Value> = store
        .read(ARTIFACT_NODES, serde_json::Value::Null)
        .await?
        .iter()
        .filter_map(|r| {
            let file_name = r.string("fileName")?;
            let id = entity_id(&[&file_name]);
            Some(json!({ "fileName": file_name, "id": id }))
        })
        .collect();
    write_in_batches(store, SET_ARTIFACT_ENTITIES, rows).await?;

    // Files, directories, packages, types
    let rows: Vec<serde_json::Value> = store
        .read(FILESYSTEM_NODES, serde_json::Value::Null)
        .await?
        .iter()
        .filter_map(|r| {
            let artifact = r.string("artifact")?;
            let file_name = r.string("fileName")?;
            let id = entity_id(&[&artifact, &file_name]);
            Some(json!({ "artifact": artifact, "fileName": file_name, "id": id }))
        })
        .collect();
    write_in_batches(store, SET_FILESYSTEM_ENTITIES, rows).await?;

    // Members
    let rows: Vec<serde_json::Value> = store
        .read(MEMBER_NODES, serde_json::Value::Null)
        .await?
        .iter()
        .filter_map(|r| {
            let artifact = r.string("artifact")?;
            let type_file = r.string("typeFile")?;
            let signature = r.string("signature")?;
            let id = entity_id(&[&artifact, &type_file, &signature]);
            Some(json!({
                "artifact": artifact,
                "typeFile": type_file,
                "signature": signature,
                "id": id
            }))
        })
        .collect();
    write_in_batches(store, SET_MEMBER_ENTITIES, rows).await?;

    info!("entity ids assigned");
    Ok(())
}

async fn write_in_batches(
    store: &GraphStore,
    query: &'static str,
    rows: Vec<serde_json::Value>,
) -> Result<(), NormalizeError> {
    let total = rows.len();
    let mut labeled = 0u64;
    for batch in rows.chunks(ID_BATCH_SIZE) {
        let counters = store.write(query, json!({ "rows": batch })).await?;
        labeled += counters.labels_added;
    }
    info!(nodes = total, labels_added = labeled, "entity batch written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_deterministic_32_hex() {
        let a = entity_id(&["/proj/src/main/java", "/com/x/Foo.class"]);
        let b = entity_id(&["/proj/src/main/java", "/com/x/Foo.class"]);
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn distinct_keys_yield_distinct_ids() {
        let a = entity_id(&["/proj/a", "/X.class"]);
        let b = entity_id(&["/proj/b", "/X.class"]);
        let c = entity_id(&["/proj/a", "/Y.class"]);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn known_digest() {
        // md5("abc") is a fixed vector; concatenation of parts feeds one hash.
        assert_eq!(entity_id(&["a", "b", "c"]), "900150983cd24fb0d6963f7d28e17f72");
    }
}
