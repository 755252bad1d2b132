//! Wire types for the transactional query endpoint.
//!
//! One request carries exactly one parameterized statement and always asks
//! the server for update statistics. Responses come back as row-oriented
//! JSON plus an `errors` array that is non-empty on statement failure.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request body for `POST {uri}/db/{database}/tx/commit`.
#[derive(Debug, Serialize)]
pub(crate) struct TxRequest<'a> {
    pub statements: Vec<TxStatement<'a>>,
}

/// A single parameterized statement.
#[derive(Debug, Serialize)]
pub(crate) struct TxStatement<'a> {
    pub statement: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<&'a Value>,
    #[serde(rename = "includeStats")]
    pub include_stats: bool,
}

/// Response body for the commit endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct TxResponse {
    #[serde(default)]
    pub results: Vec<StatementResult>,
    #[serde(default)]
    pub errors: Vec<ServerError>,
}

/// Result block for one statement: column names, rows, and stats.
#[derive(Debug, Deserialize)]
pub(crate) struct StatementResult {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub data: Vec<RowEntry>,
    #[serde(default)]
    pub stats: Option<QueryCounters>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RowEntry {
    #[serde(default)]
    pub row: Vec<Value>,
}

/// Statement-level error reported by the server.
#[derive(Debug, Deserialize)]
pub(crate) struct ServerError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// Update counters reported by a write statement.
///
/// Field names follow the server's stats block; the server spells the
/// deleted-relationships counter in the singular.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
pub struct QueryCounters {
    #[serde(default)]
    pub contains_updates: bool,
    #[serde(default)]
    pub nodes_created: u64,
    #[serde(default)]
    pub nodes_deleted: u64,
    #[serde(default)]
    pub properties_set: u64,
    #[serde(default)]
    pub relationships_created: u64,
    #[serde(default, alias = "relationship_deleted")]
    pub relationships_deleted: u64,
    #[serde(default)]
    pub labels_added: u64,
    #[serde(default)]
    pub labels_removed: u64,
    #[serde(default)]
    pub indexes_added: u64,
    #[serde(default)]
    pub constraints_added: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_rows_and_stats() {
        let body = r#"{
            "results": [{
                "columns": ["fileName", "depth"],
                "data": [
                    {"row": ["/proj/src", 2]},
                    {"row": ["/proj/src/main", 3]}
                ],
                "stats": {
                    "contains_updates": true,
                    "nodes_created": 0,
                    "properties_set": 7,
                    "labels_added": 2,
                    "relationship_deleted": 3
                }
            }],
            "errors": []
        }"#;

        let parsed: TxResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.errors.is_empty());

        let result = &parsed.results[0];
        assert_eq!(result.columns, vec!["fileName", "depth"]);
        assert_eq!(result.data.len(), 2);
        assert_eq!(result.data[0].row[0], "/proj/src");

        let stats = result.stats.unwrap();
        assert_eq!(stats.properties_set, 7);
        assert_eq!(stats.labels_added, 2);
        assert_eq!(stats.relationships_deleted, 3);
        assert!(stats.contains_updates);
    }

    #[test]
    fn decodes_server_error() {
        let body = r#"{
            "results": [],
            "errors": [{
                "code": "Neo.ClientError.Statement.SyntaxError",
                "message": "Invalid input"
            }]
        }"#;

        let parsed: TxResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.errors.len(), 1);
        assert!(parsed.errors[0].code.ends_with("SyntaxError"));
    }
}
