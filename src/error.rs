//! Error types for the job evaluation pipeline.
//!
//! Two of these categories are absorbed close to where they occur and never
//! reach the caller: capability errors (relevance falls back to `true`, skill
//! extraction to an empty result) and persistence errors inside the store node
//! (converted to an `error` run status). Source and graph errors propagate.

use std::time::Duration;

use crate::pipeline::graph::NodeId;

/// Top-level error type for the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Capability error: {0}")]
    Capability(#[from] CapabilityError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

/// Errors from the capability provider (completions and embeddings).
#[derive(Debug, thiserror::Error)]
pub enum CapabilityError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Provider returned empty content")]
    EmptyContent,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Posting store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Query failed: {0}")]
    Query(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Posting not found: {external_id}")]
    NotFound { external_id: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Streaming posting source errors. These propagate to the driver's caller.
///
/// The source's name lives in a field called `name`: thiserror treats a field
/// named `source` as the error's cause and requires `std::error::Error`.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Source {name} fetch failed: {reason}")]
    Fetch { name: String, reason: String },

    #[error("Source {name} timed out after {timeout:?}")]
    Timeout { name: String, timeout: Duration },

    #[error("Malformed posting payload: {0}")]
    Decode(String),
}

/// Task-graph construction and execution errors.
///
/// These indicate a miswired graph, not a bad posting, and are never absorbed.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Task graph has no node registered for {0}")]
    UnknownNode(NodeId),

    #[error("Invalid task graph: {0}")]
    Graph(String),
}

/// Result type alias for the pipeline.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_errors_render_the_source_name() {
        let fetch = SourceError::Fetch {
            name: "djinni".to_string(),
            reason: "connection reset".to_string(),
        };
        assert_eq!(
            fetch.to_string(),
            "Source djinni fetch failed: connection reset"
        );

        let timeout = SourceError::Timeout {
            name: "djinni".to_string(),
            timeout: Duration::from_secs(30),
        };
        assert!(timeout.to_string().starts_with("Source djinni timed out"));
    }

    #[test]
    fn subsystem_errors_convert_into_the_top_level_error() {
        let err: Error = SourceError::Decode("bad payload".to_string()).into();
        assert!(matches!(err, Error::Source(_)));

        let err: Error = StoreError::Query("down".to_string()).into();
        assert!(matches!(err, Error::Store(_)));
    }
}
