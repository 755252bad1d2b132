//! Error types for the graph gateway.

use thiserror::Error;

/// Errors surfaced by [`crate::GraphStore`].
///
/// Connection-level failures and query-level failures are kept apart so the
/// caller can map them to different exit codes.
#[derive(Error, Debug)]
pub enum GraphError {
    /// Invalid gateway configuration (bad URI, empty credentials).
    #[error("graph config error: {0}")]
    Config(String),

    /// The database could not be reached (connect, timeout, non-success status).
    #[error("graph unavailable: {0}")]
    Unavailable(String),

    /// The server rejected a statement (syntax or semantic error).
    #[error("graph query failed [{code}]: {message}")]
    Query {
        /// Server-side status code (e.g. `Neo.ClientError.Statement.SyntaxError`).
        code: String,
        /// Human-readable message from the server.
        message: String,
    },

    /// The response body could not be decoded.
    #[error("graph response decode failed: {0}")]
    Decode(String),
}
