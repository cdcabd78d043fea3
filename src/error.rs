//! Error types for Exam Insight

use thiserror::Error;

/// Errors that can occur at the snapshot/report boundary.
///
/// Analysis over an already-built snapshot never fails; degenerate inputs
/// produce documented degenerate results instead.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("Failed to parse snapshot: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}
