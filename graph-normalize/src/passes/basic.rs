//! Passes 2 and 3: absolute paths and source-file labeling.
//!
//! The scanner writes an artifact root's `fileName` as an absolute path and
//! every contained node's `fileName` as a slash-leading path relative to
//! its artifact, so absolute paths are plain concatenation.

use graph_store::GraphStore;
use tracing::info;

use crate::errors::NormalizeError;

const SET_ARTIFACT_ABSOLUTE_PATHS: &str = "
MATCH (a:Artifact)
WHERE a.fileName IS NOT NULL
SET a.absolute_path = a.fileName
";

const SET_CONTAINED_ABSOLUTE_PATHS: &str = "
MATCH (a:Artifact)-[:CONTAINS]->(f)
WHERE (f:File OR f:Directory)
  AND a.fileName IS NOT NULL AND f.fileName IS NOT NULL
SET f.absolute_path = a.fileName + f.fileName
";

const LABEL_SOURCE_FILES: &str = "
MATCH (f:File)
WHERE f.absolute_path IS NOT NULL
  AND (f.absolute_path ENDS WITH '.java' OR f.absolute_path ENDS WITH '.kt')
SET f:SourceFile
";

/// Sets `absolute_path` on artifact roots and everything they contain.
pub async fn add_absolute_paths(store: &GraphStore) -> Result<(), NormalizeError> {
    info!("pass: add absolute paths");

    let roots = store
        .write(SET_ARTIFACT_ABSOLUTE_PATHS, serde_json::Value::Null)
        .await?;
    let contained = store
        .write(SET_CONTAINED_ABSOLUTE_PATHS, serde_json::Value::Null)
        .await?;

    info!(
        artifact_paths = roots.properties_set,
        contained_paths = contained.properties_set,
        "absolute paths set"
    );
    Ok(())
}

/// Labels `.java` / `.kt` files as `:SourceFile`. Relies on `absolute_path`
/// from the previous pass.
pub async fn label_source_files(store: &GraphStore) -> Result<(), NormalizeError> {
    info!("pass: label source files");
    let counters = store
        .write(LABEL_SOURCE_FILES, serde_json::Value::Null)
        .await?;
    info!(labels_added = counters.labels_added, "source files labeled");
    Ok(())
}
