//! Error type for the normalization phase.

use graph_store::GraphError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NormalizeError {
    /// Gateway failure; fatal to the running pass.
    #[error("normalization stopped: {0}")]
    Graph(#[from] GraphError),

    /// A source file could not be parsed; callers skip the file.
    #[error("parse error in {path}: {reason}")]
    Parse { path: String, reason: String },

    /// Grammar initialization failure (version mismatch at load time).
    #[error("grammar setup failed: {0}")]
    Grammar(String),
}
