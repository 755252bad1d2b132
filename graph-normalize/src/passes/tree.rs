//! Pass 9: the project node and the `CONTAINS_SOURCE` overlay.
//!
//! Creates the singleton `:Project`, links directories to their direct
//! source files and subdirectories (deepest level first, so intermediate
//! directories only join the overlay when something below them owns
//! source), and finally roots both overlays at the project node.

use std::collections::BTreeMap;

use graph_store::GraphStore;
use serde_json::json;
use tracing::info;

use crate::errors::NormalizeError;

const MERGE_PROJECT_NODE: &str = "
MERGE (p:Project {name: $projectName})
ON CREATE SET p.creationTimestamp = datetime()
SET p.absolute_path = $projectPath
";

const DIRECTORIES_WITH_DEPTH: &str = "
MATCH (d:Directory)
WHERE d.absolute_path IS NOT NULL
RETURN DISTINCT d.absolute_path AS path, size(split(d.absolute_path, '/')) AS depth
";

const LINK_DIRS_TO_SOURCE_FILES: &str = "
UNWIND $paths AS dirPath
MATCH (parentDir:Directory {absolute_path: dirPath})
MATCH (sf:SourceFile)
WHERE sf.absolute_path STARTS WITH parentDir.absolute_path + '/'
  AND size(split(sf.absolute_path, '/')) = size(split(parentDir.absolute_path, '/')) + 1
MERGE (parentDir)-[:CONTAINS_SOURCE]->(sf)
";

const LINK_DIRS_TO_SOURCE_DIRS: &str = "
UNWIND $paths AS parentPath
MATCH (parentDir:Directory {absolute_path: parentPath})
MATCH (childDir:Directory)
WHERE childDir.absolute_path STARTS WITH parentDir.absolute_path + '/'
  AND size(split(childDir.absolute_path, '/')) = size(split(parentDir.absolute_path, '/')) + 1
  AND EXISTS { (childDir)-[:CONTAINS_SOURCE]->() }
MERGE (parentDir)-[:CONTAINS_SOURCE]->(childDir)
";

const LINK_PROJECT_TO_SOURCE_ROOTS: &str = "
MATCH (p:Project {absolute_path: $projectPath})
MATCH (d:Directory:Artifact)
WHERE EXISTS { (d)-[:CONTAINS_SOURCE]->() }
MERGE (p)-[:CONTAINS_SOURCE]->(d)
";

const LINK_PROJECT_TO_ARTIFACTS: &str = "
MATCH (p:Project {name: $projectName})
MATCH (a:Artifact)
MERGE (p)-[:CONTAINS_CLASS]->(a)
";

/// Creates the project node and builds both project-rooted overlays.
pub async fn build_project_tree(
    store: &GraphStore,
    project_name: &str,
    project_path: &str,
) -> Result<(), NormalizeError> {
    info!(project = project_name, "pass: build project tree");

    store
        .write(
            MERGE_PROJECT_NODE,
            json!({ "projectName": project_name, "projectPath": project_path }),
        )
        .await?;

    let rows = store
        .read(DIRECTORIES_WITH_DEPTH, serde_json::Value::Null)
        .await?;
    if rows.is_empty() {
        info!("no directories with absolute paths; source overlay skipped");
    } else {
        let all_paths: Vec<String> = rows.iter().filter_map(|r| r.string("path")).collect();
        store
            .write(LINK_DIRS_TO_SOURCE_FILES, json!({ "paths": all_paths }))
            .await?;

        let mut by_depth: BTreeMap<i64, Vec<String>> = BTreeMap::new();
        for record in &rows {
            if let (Some(path), Some(depth)) = (record.string("path"), record.i64("depth")) {
                by_depth.entry(depth).or_default().push(path);
            }
        }
        for (_, paths) in by_depth.iter().rev() {
            store
                .write(LINK_DIRS_TO_SOURCE_DIRS, json!({ "paths": paths }))
                .await?;
        }

        store
            .write(
                LINK_PROJECT_TO_SOURCE_ROOTS,
                json!({ "projectPath": project_path }),
            )
            .await?;
    }

    let counters = store
        .write(
            LINK_PROJECT_TO_ARTIFACTS,
            json!({ "projectName": project_name }),
        )
        .await?;
    info!(
        relationships_created = counters.relationships_created,
        "project linked to artifacts"
    );
    Ok(())
}
