//! Pass 4: relocate mis-placed directory artifacts.
//!
//! Validates every `Directory:Artifact` against the classes it contains.
//! Containers with no classes just lose the label. Where the true roots sit
//! deeper, the container is demoted and each discovered root promoted to an
//! artifact with an absolute `fileName`; descendant directories get their
//! `fqn` recomputed from the path below the new root, and every
//! descendant's `fileName` is rebased onto the new root so that
//! `absolute_path = artifact.fileName + fileName` keeps holding. The
//! rebase also makes a re-run resolve each promoted root to itself. The
//! resulting [`RelocationMap`] feeds the containment and requirement
//! rewrites.

use graph_store::GraphStore;
use serde_json::json;
use tracing::info;

use crate::errors::NormalizeError;
use crate::relocate::{Relocation, RelocationMap, discover_artifact_roots};
use crate::paths;

const SCANNED_DIRECTORY_ARTIFACTS: &str = "
MATCH (a:Directory:Artifact)
WHERE a.fileName IS NOT NULL
RETURN a.fileName AS fileName
";

const CONTAINED_CLASSES: &str = "
MATCH (a:Artifact:Directory {fileName: $fileName})-[:CONTAINS]->(c:Type:File)
WHERE c.fqn IS NOT NULL AND c.fileName IS NOT NULL
RETURN c.fqn AS fqn, c.fileName AS path
";

const REMOVE_ARTIFACT_LABEL: &str = "
MATCH (a:Directory {fileName: $fileName})
WHERE a:Artifact
REMOVE a:Artifact
";

const PROMOTE_ROOT: &str = "
MATCH (cont:Directory {fileName: $container})-[:CONTAINS]->(d:Directory {fileName: $root})
SET d:Artifact, d.fileName = d.absolute_path
";

const DIRECTORIES_UNDER_ROOT: &str = "
MATCH (cont:Directory {fileName: $container})-[:CONTAINS]->(d:Directory)
WHERE d.fileName STARTS WITH $root
RETURN d.fileName AS path
";

const SET_DIRECTORY_FQNS: &str = "
UNWIND $updates AS u
MATCH (cont:Directory {fileName: $container})-[:CONTAINS]->(d:Directory {fileName: u.path})
SET d.fqn = u.fqn
";

const REBASE_DESCENDANT_FILENAMES: &str = "
MATCH (cont:Directory {fileName: $container})-[:CONTAINS]->(n)
WHERE (n:File OR n:Directory)
  AND n.fileName STARTS WITH $rootSlash
SET n.fileName = substring(n.fileName, $rootLen)
";

/// Validates and relocates every scanned directory artifact.
pub async fn relocate_directory_artifacts(
    store: &GraphStore,
) -> Result<RelocationMap, NormalizeError> {
    info!("pass: relocate directory artifacts");

    let containers = store
        .read(SCANNED_DIRECTORY_ARTIFACTS, serde_json::Value::Null)
        .await?;
    let mut map = RelocationMap::default();

    for record in &containers {
        let Some(file_name) = record.string("fileName") else {
            continue;
        };
        let entry = process_container(store, &file_name).await?;
        map.push(entry);
    }

    info!(
        containers = map.entries.len(),
        demoted = map.demoted_roots().len(),
        promoted = map.promoted_artifacts().len(),
        "directory artifacts validated"
    );
    Ok(map)
}

async fn process_container(
    store: &GraphStore,
    container: &str,
) -> Result<Relocation, NormalizeError> {
    let rows = store
        .read(CONTAINED_CLASSES, json!({ "fileName": container }))
        .await?;
    let classes: Vec<(String, String)> = rows
        .iter()
        .filter_map(|r| Some((r.string("fqn")?, r.string("path")?)))
        .collect();

    if classes.is_empty() {
        info!(container, "no class files; dropping Artifact label");
        store
            .write(REMOVE_ARTIFACT_LABEL, json!({ "fileName": container }))
            .await?;
        return Ok(Relocation {
            original: container.to_string(),
            promoted: Vec::new(),
            demoted: true,
        });
    }

    let roots = discover_artifact_roots(&classes);

    // The scanned directory itself is the single true root: the label was
    // correct, only the descendant FQNs need fixing.
    if roots.len() == 1 && roots[0].is_empty() {
        info!(container, "artifact correctly labeled");
        correct_fqns_in_subtree(store, container, "").await?;
        return Ok(Relocation {
            original: container.to_string(),
            promoted: vec![container.to_string()],
            demoted: false,
        });
    }

    info!(container, roots = roots.len(), "relocating artifact label");
    store
        .write(REMOVE_ARTIFACT_LABEL, json!({ "fileName": container }))
        .await?;

    // Deepest roots first, so rebasing one root's subtree can never eat
    // into a root nested below it.
    let mut ordered: Vec<&String> = roots.iter().collect();
    ordered.sort_by_key(|r| std::cmp::Reverse(r.len()));

    let mut promoted = Vec::with_capacity(roots.len());
    for root in ordered {
        store
            .write(PROMOTE_ROOT, json!({ "container": container, "root": root }))
            .await?;
        promoted.push(format!("{container}{root}"));
        correct_fqns_in_subtree(store, container, root).await?;
        rebase_descendants(store, container, root).await?;
    }
    promoted.sort();

    Ok(Relocation {
        original: container.to_string(),
        promoted,
        demoted: true,
    })
}

/// Recomputes `fqn` for every directory strictly below `root`, as the
/// dot-form of its path relative to the root.
async fn correct_fqns_in_subtree(
    store: &GraphStore,
    container: &str,
    root: &str,
) -> Result<(), NormalizeError> {
    let rows = store
        .read(
            DIRECTORIES_UNDER_ROOT,
            json!({ "container": container, "root": root }),
        )
        .await?;

    let updates: Vec<serde_json::Value> = rows
        .iter()
        .filter_map(|r| r.string("path"))
        .filter(|path| paths::starts_with_plus_slash(path, root))
        .map(|path| {
            let fqn = paths::relpath_to_fqn(&path[root.len()..]);
            json!({ "path": path, "fqn": fqn })
        })
        .collect();

    if updates.is_empty() {
        return Ok(());
    }

    store
        .write(
            SET_DIRECTORY_FQNS,
            json!({ "container": container, "updates": updates }),
        )
        .await?;
    Ok(())
}

/// Strips the root prefix off every descendant's `fileName`, making the
/// paths relative to the promoted artifact. The promoted node itself
/// already carries its absolute path and is not matched.
async fn rebase_descendants(
    store: &GraphStore,
    container: &str,
    root: &str,
) -> Result<(), NormalizeError> {
    if root.is_empty() {
        return Ok(());
    }
    store
        .write(
            REBASE_DESCENDANT_FILENAMES,
            json!({
                "container": container,
                "rootSlash": format!("{root}/"),
                "rootLen": root.len(),
            }),
        )
        .await?;
    Ok(())
}
