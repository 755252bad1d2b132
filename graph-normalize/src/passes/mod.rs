//! Ordered graph-rewrite passes.
//!
//! The sequence is fixed: each pass establishes invariants the next relies
//! on (duplicate-free nodes → absolute paths → source labels → relocated
//! artifacts → rebuilt containment/requirements → class hierarchy →
//! package cleanup → project tree). Re-running the sequence on an already
//! normalized graph produces no new writes.

mod artifacts;
mod basic;
mod containment;
mod dedupe;
mod hierarchy;
mod tree;

use graph_store::GraphStore;
use tracing::info;

use crate::errors::NormalizeError;
use crate::relocate::RelocationMap;

/// Runs every normalization pass in the required order.
///
/// `project_name` / `project_path` seed the singleton project node; the
/// path must already be resolved to an absolute directory.
pub async fn run_all(
    store: &GraphStore,
    project_name: &str,
    project_path: &str,
) -> Result<RelocationMap, NormalizeError> {
    info!("--- normalization passes starting ---");

    dedupe::merge_duplicates(store).await?;
    basic::add_absolute_paths(store).await?;
    basic::label_source_files(store).await?;

    let relocations = artifacts::relocate_directory_artifacts(store).await?;
    containment::rewrite_containment(store, &relocations).await?;
    containment::rewrite_requirements(store, &relocations).await?;

    hierarchy::establish_class_hierarchy(store).await?;
    hierarchy::cleanup_package_semantics(store).await?;
    tree::build_project_tree(store, project_name, project_path).await?;

    info!("--- normalization passes complete ---");
    Ok(relocations)
}
