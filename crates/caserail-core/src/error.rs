//! Error types for caserail-core

use thiserror::Error;

/// Result type alias for caserail-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in caserail-core
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file could not be found
    #[error("configuration file not found: {path}")]
    ConfigNotFound {
        /// Path that was searched
        path: String,
    },

    /// Failed to parse YAML configuration
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    /// Invalid configuration value
    #[error("invalid configuration: {message}")]
    ConfigInvalid {
        /// Description of what's invalid
        message: String,
    },

    /// HTTP transport failure (connection, TLS, timeout)
    #[error("request to '{endpoint}' failed: {source}")]
    Transport {
        /// API endpoint that was being called
        endpoint: String,
        /// Underlying client error
        #[source]
        source: reqwest::Error,
    },

    /// Response body could not be decoded into the expected shape
    #[error("unexpected response from '{endpoint}': {source}")]
    Decode {
        /// API endpoint that produced the body
        endpoint: String,
        /// Decoding error
        #[source]
        source: serde_json::Error,
    },

    /// Case filtering matched nothing and the policy forbids including all cases
    #[error("no cases matched the configured filters for project {project_id}")]
    EmptyCaseFilter {
        /// Project the run would have been created in
        project_id: u64,
    },

    /// Malformed runner event input
    #[error("invalid runner event on line {line}: {message}")]
    InvalidEvent {
        /// 1-based line number in the input
        line: usize,
        /// Description of the problem
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
