//! Passes 7 and 8: the `CONTAINS_CLASS` overlay and package cleanup.
//!
//! Within each artifact's containment subtree, directories are linked to
//! the types and directories exactly one path segment below them, deepest
//! level first, and the artifact is linked to the tops of the resulting
//! forest. Directories that end up outside the forest are no packages.

use std::collections::BTreeMap;

use graph_store::GraphStore;
use serde_json::json;
use tracing::{debug, info};

use crate::errors::NormalizeError;

const ALL_ARTIFACT_PATHS: &str = "
MATCH (a:Artifact)
WHERE a.fileName IS NOT NULL
RETURN a.fileName AS path
";

const DIRECTORIES_WITH_DEPTH: &str = "
MATCH (a:Artifact {fileName: $artifact})-[:CONTAINS]->(d:Directory)
WHERE d.fileName IS NOT NULL
RETURN DISTINCT d.fileName AS path, size(split(d.fileName, '/')) AS depth
";

const LINK_TYPES_TO_PARENT_DIRS: &str = "
UNWIND $paths AS dirPath
MATCH (a:Artifact {fileName: $artifact})-[:CONTAINS]->(parentDir:Directory {fileName: dirPath})
MATCH (a)-[:CONTAINS]->(t:Type:File)
WHERE t.fileName STARTS WITH parentDir.fileName + '/'
  AND size(split(t.fileName, '/')) = size(split(parentDir.fileName, '/')) + 1
MERGE (parentDir)-[:CONTAINS_CLASS]->(t)
";

const LINK_DIRS_TO_PARENT_DIRS: &str = "
UNWIND $paths AS parentPath
MATCH (a:Artifact {fileName: $artifact})-[:CONTAINS]->(parentDir:Directory {fileName: parentPath})
MATCH (a)-[:CONTAINS]->(childDir:Directory)
WHERE childDir.fileName STARTS WITH parentDir.fileName + '/'
  AND size(split(childDir.fileName, '/')) = size(split(parentDir.fileName, '/')) + 1
MERGE (parentDir)-[:CONTAINS_CLASS]->(childDir)
";

const LINK_ARTIFACT_TO_FOREST_TOPS: &str = "
MATCH (a:Artifact {fileName: $artifact})-[:CONTAINS]->(n:Directory)
WHERE NOT EXISTS { ()-[:CONTAINS_CLASS]->(n) }
  AND EXISTS { (n)-[:CONTAINS_CLASS*0..]->(:Type) }
MERGE (a)-[:CONTAINS_CLASS]->(n)
";

const CLEANUP_NON_PACKAGES: &str = "
MATCH (d:Directory:Package)
WHERE NOT ()-[:CONTAINS_CLASS]->(d)
REMOVE d.fqn, d:Package
";

/// Builds the class-hierarchy overlay inside every artifact, archives
/// included.
pub async fn establish_class_hierarchy(store: &GraphStore) -> Result<(), NormalizeError> {
    info!("pass: establish class hierarchy");

    let artifacts = store
        .read(ALL_ARTIFACT_PATHS, serde_json::Value::Null)
        .await?;

    for record in &artifacts {
        let Some(artifact) = record.string("path") else {
            continue;
        };
        build_hierarchy_in_artifact(store, &artifact).await?;
    }

    info!(artifacts = artifacts.len(), "class hierarchy established");
    Ok(())
}

async fn build_hierarchy_in_artifact(
    store: &GraphStore,
    artifact: &str,
) -> Result<(), NormalizeError> {
    debug!(artifact, "building class hierarchy");

    let rows = store
        .read(DIRECTORIES_WITH_DEPTH, json!({ "artifact": artifact }))
        .await?;

    let all_paths: Vec<String> = rows.iter().filter_map(|r| r.string("path")).collect();
    if all_paths.is_empty() {
        return Ok(());
    }

    store
        .write(
            LINK_TYPES_TO_PARENT_DIRS,
            json!({ "artifact": artifact, "paths": all_paths }),
        )
        .await?;

    // Directory-to-directory edges, deepest parents first.
    let mut by_depth: BTreeMap<i64, Vec<String>> = BTreeMap::new();
    for record in &rows {
        if let (Some(path), Some(depth)) = (record.string("path"), record.i64("depth")) {
            by_depth.entry(depth).or_default().push(path);
        }
    }
    for (_, paths) in by_depth.iter().rev() {
        store
            .write(
                LINK_DIRS_TO_PARENT_DIRS,
                json!({ "artifact": artifact, "paths": paths }),
            )
            .await?;
    }

    store
        .write(LINK_ARTIFACT_TO_FOREST_TOPS, json!({ "artifact": artifact }))
        .await?;
    Ok(())
}

/// Strips the `:Package` label and `fqn` from directories outside the
/// class forest.
pub async fn cleanup_package_semantics(store: &GraphStore) -> Result<(), NormalizeError> {
    info!("pass: cleanup package semantics");
    let counters = store
        .write(CLEANUP_NON_PACKAGES, serde_json::Value::Null)
        .await?;
    info!(
        labels_removed = counters.labels_removed,
        "non-package directories cleaned"
    );
    Ok(())
}
