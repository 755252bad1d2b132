//! Source linker: `WITH_SOURCE` edges from types and members to files.
//!
//! Walks every `:SourceFile` known to the graph, extracts the declared
//! type FQNs from disk, and merges `Type -> SourceFile` edges (restricted
//! to Class/Interface/Enum, the kinds the scanner materializes from
//! bytecode). Member edges are then derived through the type edges.
//! Unreadable or unparsable files are logged and skipped; the pass never
//! fails on a single file.

use graph_store::GraphStore;
use serde_json::json;
use tracing::{info, warn};

use crate::errors::NormalizeError;
use crate::parsers::FileMetadata;
use crate::parsers::java::JavaSourceParser;
use crate::parsers::kotlin::KotlinSourceParser;

const LINK_BATCH_SIZE: usize = 1000;

const JAVA_SOURCE_FILES: &str = "
MATCH (f:SourceFile)
WHERE f.absolute_path ENDS WITH '.java'
RETURN f.absolute_path AS absolutePath
";

const KOTLIN_SOURCE_FILES: &str = "
MATCH (f:SourceFile)
WHERE f.absolute_path ENDS WITH '.kt'
RETURN f.absolute_path AS absolutePath
";

const LINK_TYPES_TO_SOURCE: &str = "
UNWIND $metadata AS fileData
MATCH (file:SourceFile {absolute_path: fileData.path})
UNWIND fileData.fqns AS typeFqn
MATCH (type:Type {fqn: typeFqn})
WHERE type:Class OR type:Interface OR type:Enum
MERGE (type)-[r:WITH_SOURCE]->(file)
";

const LINK_MEMBERS_TO_SOURCE: &str = "
MATCH (t:Type)-[:WITH_SOURCE]->(sf:SourceFile)
MATCH (t)-[:DECLARES]->(m:Member)
MERGE (m)-[:WITH_SOURCE]->(sf)
";

/// Runs the full linking pass. Returns the number of type edges created.
pub async fn link_sources(store: &GraphStore) -> Result<u64, NormalizeError> {
    info!("pass: source file linking");

    let mut metadata = Vec::new();
    metadata.extend(parse_java_files(store).await?);
    metadata.extend(parse_kotlin_files(store).await?);

    if metadata.is_empty() {
        warn!("no parsable source files found; skipping source linking");
        return Ok(0);
    }

    let mut type_edges = 0u64;
    for batch in metadata.chunks(LINK_BATCH_SIZE) {
        let rows: Vec<serde_json::Value> = batch
            .iter()
            .map(|m| json!({ "path": &m.path, "fqns": &m.fqns }))
            .collect();
        let counters = store
            .write(LINK_TYPES_TO_SOURCE, json!({ "metadata": rows }))
            .await?;
        type_edges += counters.relationships_created;
    }

    let counters = store
        .write(LINK_MEMBERS_TO_SOURCE, serde_json::Value::Null)
        .await?;
    info!(
        files = metadata.len(),
        type_edges,
        member_edges = counters.relationships_created,
        "source files linked"
    );
    Ok(type_edges)
}

async fn parse_java_files(store: &GraphStore) -> Result<Vec<FileMetadata>, NormalizeError> {
    let files = store
        .read(JAVA_SOURCE_FILES, serde_json::Value::Null)
        .await?;
    let mut parser = JavaSourceParser::new()?;

    let mut out = Vec::with_capacity(files.len());
    for record in &files {
        let Some(path) = record.string("absolutePath") else {
            continue;
        };
        match std::fs::read(&path) {
            Ok(content) => match parser.file_metadata(&path, &content) {
                Ok(meta) => out.push(meta),
                Err(e) => warn!(path, error = %e, "skipping unparsable Java file"),
            },
            Err(e) => warn!(path, error = %e, "skipping unreadable Java file"),
        }
    }
    info!(parsed = out.len(), total = files.len(), "Java files parsed");
    Ok(out)
}

async fn parse_kotlin_files(store: &GraphStore) -> Result<Vec<FileMetadata>, NormalizeError> {
    let files = store
        .read(KOTLIN_SOURCE_FILES, serde_json::Value::Null)
        .await?;
    if files.is_empty() {
        return Ok(Vec::new());
    }
    let mut parser = KotlinSourceParser::new()?;

    let mut out = Vec::with_capacity(files.len());
    for record in &files {
        let Some(path) = record.string("absolutePath") else {
            continue;
        };
        match std::fs::read(&path) {
            Ok(content) => match parser.file_metadata(&path, &content) {
                Ok(meta) => out.push(meta),
                Err(e) => warn!(path, error = %e, "skipping unparsable Kotlin file"),
            },
            Err(e) => warn!(path, error = %e, "skipping unreadable Kotlin file"),
        }
    }
    info!(parsed = out.len(), total = files.len(), "Kotlin files parsed");
    Ok(out)
}
