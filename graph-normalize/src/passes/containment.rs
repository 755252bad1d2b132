//! Passes 5 and 6: rewrite containment and requirement edges.
//!
//! Promoted artifacts receive the direct `CONTAINS` fan-out to their whole
//! subtree that the scanner gave the original container; the demoted
//! container's stale fan-out (anything more than one segment below it) is
//! then deleted. `REQUIRES` edges move the same way: each promoted artifact
//! requires exactly the types one of its internal types depends on, and the
//! demoted roots drop theirs. Containers that kept their label are not
//! touched by either cleanup.

use graph_store::GraphStore;
use serde_json::json;
use tracing::info;

use crate::errors::NormalizeError;
use crate::relocate::RelocationMap;

const ADD_TRANSITIVE_CONTAINS: &str = "
UNWIND $promoted AS fileName
MATCH (newArtifact:Artifact {fileName: fileName})
MATCH (newArtifact)-[:CONTAINS*]->(descendant)
MERGE (newArtifact)-[:CONTAINS]->(descendant)
";

const DELETE_STALE_CONTAINS: &str = "
MATCH (demotedRoot {fileName: $fileName})-[r:CONTAINS]->(descendant)
WHERE demotedRoot.absolute_path IS NOT NULL AND descendant.absolute_path IS NOT NULL
  AND size(split(descendant.absolute_path, '/')) > size(split(demotedRoot.absolute_path, '/')) + 1
DELETE r
";

const REDIRECT_REQUIRES: &str = "
MATCH (demotedRoot {fileName: $demoted})
UNWIND $promoted AS newFileName
MATCH (newArtifact:Artifact:Directory {fileName: newFileName})
MATCH (newArtifact)-[:CONTAINS]->(internalType:Type)
MATCH (internalType)-[:DEPENDS_ON]->(requiredType:Type)
WHERE (demotedRoot)-[:REQUIRES]->(requiredType)
MERGE (newArtifact)-[:REQUIRES]->(requiredType)
";

const DELETE_DEMOTED_REQUIRES: &str = "
UNWIND $demotedRoots AS fileName
MATCH (demotedRoot {fileName: fileName})-[r:REQUIRES]->(:Type)
DELETE r
";

/// Rebuilds `CONTAINS` for promoted artifacts and prunes the demoted roots.
pub async fn rewrite_containment(
    store: &GraphStore,
    map: &RelocationMap,
) -> Result<(), NormalizeError> {
    info!("pass: rewrite containment");

    let promoted = map.promoted_artifacts();
    if promoted.is_empty() {
        info!("no artifacts were relocated; skipping containment rewrite");
        return Ok(());
    }

    let counters = store
        .write(ADD_TRANSITIVE_CONTAINS, json!({ "promoted": promoted }))
        .await?;
    info!(
        relationships_created = counters.relationships_created,
        "transitive containment added for promoted artifacts"
    );

    for entry in map.demoted_with_promotions() {
        let counters = store
            .write(DELETE_STALE_CONTAINS, json!({ "fileName": &entry.original }))
            .await?;
        info!(
            demoted = %entry.original,
            relationships_deleted = counters.relationships_deleted,
            "stale containment removed"
        );
    }
    Ok(())
}

/// Moves `REQUIRES` edges from demoted roots onto the promoted artifacts
/// whose internal types actually depend on the required types.
pub async fn rewrite_requirements(
    store: &GraphStore,
    map: &RelocationMap,
) -> Result<(), NormalizeError> {
    info!("pass: rewrite requirements");

    for entry in map.demoted_with_promotions() {
        store
            .write(
                REDIRECT_REQUIRES,
                json!({ "demoted": &entry.original, "promoted": &entry.promoted }),
            )
            .await?;
    }

    let demoted = map.demoted_roots();
    if demoted.is_empty() {
        info!("no demoted roots; skipping requirement cleanup");
        return Ok(());
    }

    let counters = store
        .write(DELETE_DEMOTED_REQUIRES, json!({ "demotedRoots": demoted }))
        .await?;
    info!(
        relationships_deleted = counters.relationships_deleted,
        "requirements dropped from demoted roots"
    );
    Ok(())
}
