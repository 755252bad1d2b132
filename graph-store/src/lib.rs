//! Narrow gateway to the labeled property graph database.
//!
//! The enrichment pipeline treats the graph store as an opaque collaborator:
//! every interaction is either a read returning rows or a write returning
//! update counters, always a compile-time constant statement plus
//! parameters. This crate speaks the store's transactional HTTP query
//! endpoint with basic auth and per-request statistics.
//!
//! The store handle is cheap to clone and safe to share across worker
//! tasks; the underlying HTTP client pools connections.

mod client;
mod errors;
mod record;

pub use client::QueryCounters;
pub use errors::GraphError;
pub use record::Record;

use serde_json::Value;
use tracing::{debug, info};

use crate::client::{TxRequest, TxResponse, TxStatement};

/// Connection settings for the graph database.
#[derive(Clone, Debug)]
pub struct GraphConfig {
    /// Base URI of the database server (e.g. `http://localhost:7474`).
    pub uri: String,
    pub user: String,
    pub password: String,
    /// Logical database name; the server default is `neo4j`.
    pub database: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl GraphConfig {
    /// Settings with the server defaults for database name and timeout.
    pub fn new(uri: impl Into<String>, user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            user: user.into(),
            password: password.into(),
            database: "neo4j".to_string(),
            timeout_secs: 120,
        }
    }
}

/// Handle to the graph database.
#[derive(Clone)]
pub struct GraphStore {
    http: reqwest::Client,
    cfg: GraphConfig,
    commit_url: String,
}

impl GraphStore {
    /// Builds the client and verifies connectivity with a trivial probe.
    ///
    /// # Errors
    /// - [`GraphError::Config`] if the URI is not an http(s) endpoint
    /// - [`GraphError::Unavailable`] if the probe fails
    pub async fn connect(cfg: GraphConfig) -> Result<Self, GraphError> {
        let endpoint = cfg.uri.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(GraphError::Config(format!(
                "graph URI must start with http:// or https://, got '{}'",
                cfg.uri
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(|e| GraphError::Unavailable(e.to_string()))?;

        let base = endpoint.trim_end_matches('/').to_string();
        let commit_url = format!("{}/db/{}/tx/commit", base, cfg.database);

        let store = Self { http, cfg, commit_url };
        store.read("RETURN 1 AS ok", Value::Null).await?;
        info!(uri = %store.cfg.uri, database = %store.cfg.database, "graph connection established");
        Ok(store)
    }

    /// Runs a read-only statement and returns its rows.
    ///
    /// # Errors
    /// [`GraphError::Unavailable`] on transport failure, [`GraphError::Query`]
    /// if the server rejects the statement, [`GraphError::Decode`] on a
    /// malformed response body.
    pub async fn read(&self, query: &'static str, params: Value) -> Result<Vec<Record>, GraphError> {
        let result = self.execute(query, params).await?;
        let columns = result.columns;
        let records = result
            .data
            .into_iter()
            .map(|entry| Record::new(&columns, entry.row))
            .collect::<Vec<_>>();
        debug!(rows = records.len(), "read query completed");
        Ok(records)
    }

    /// Runs a mutating statement and returns the server's update counters.
    ///
    /// Writes within one pass are issued sequentially by the pass itself;
    /// the gateway adds no ordering of its own.
    pub async fn write(
        &self,
        query: &'static str,
        params: Value,
    ) -> Result<QueryCounters, GraphError> {
        let result = self.execute(query, params).await?;
        let counters = result.stats.unwrap_or_default();
        debug!(
            properties_set = counters.properties_set,
            labels_added = counters.labels_added,
            relationships_created = counters.relationships_created,
            "write query completed"
        );
        Ok(counters)
    }

    async fn execute(
        &self,
        query: &'static str,
        params: Value,
    ) -> Result<client::StatementResult, GraphError> {
        let params = if params.is_null() { None } else { Some(&params) };
        let body = TxRequest {
            statements: vec![TxStatement {
                statement: query,
                parameters: params,
                include_stats: true,
            }],
        };

        let resp = self
            .http
            .post(&self.commit_url)
            .basic_auth(&self.cfg.user, Some(&self.cfg.password))
            .json(&body)
            .send()
            .await
            .map_err(|e| GraphError::Unavailable(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            let snippet = text.chars().take(240).collect::<String>();
            return Err(GraphError::Unavailable(format!(
                "unexpected HTTP status {status}: {snippet}"
            )));
        }

        let parsed: TxResponse = resp
            .json()
            .await
            .map_err(|e| GraphError::Decode(e.to_string()))?;

        if let Some(err) = parsed.errors.into_iter().next() {
            return Err(GraphError::Query {
                code: err.code,
                message: err.message,
            });
        }

        parsed
            .results
            .into_iter()
            .next()
            .ok_or_else(|| GraphError::Decode("response carried no result block".to_string()))
    }
}
