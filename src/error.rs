//! Error types shared by the instance loader, the distance cache and solution checks.

use thiserror::Error;

/// Errors raised by the TTP solver library
#[derive(Debug, Error)]
pub enum TtpError {
    /// Two nodes with no connecting path; the graph must be connected
    #[error("no path between node {from} and node {to} (graph must be connected)")]
    Disconnected { from: usize, to: usize },

    /// Malformed problem instance
    #[error("invalid instance: {0}")]
    InvalidInstance(String),

    /// A step trace that breaks the output contract
    #[error("invalid solution: {0}")]
    InvalidSolution(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, TtpError>;
