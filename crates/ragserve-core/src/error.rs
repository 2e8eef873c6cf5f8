//! Error types for ragserve

use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Result type alias using RagError
pub type Result<T> = std::result::Result<T, RagError>;

/// Error type alias for convenience
pub type Error = RagError;

/// Exit codes for CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const NOT_FOUND: i32 = 2;
    pub const INVALID_INPUT: i32 = 3;
    pub const TIMEOUT: i32 = 4;
}

/// Query stage bounded by a timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Retrieval,
    Generation,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Retrieval => write!(f, "retrieval"),
            Stage::Generation => write!(f, "generation"),
        }
    }
}

/// Main error type for ragserve
#[derive(Debug, Error)]
pub enum RagError {
    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    #[error("Failed to build pipeline {key}: {reason}")]
    PipelineBuild { key: String, reason: String },

    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("{stage} stage timed out after {}ms", after.as_millis())]
    Timeout { stage: Stage, after: Duration },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Walk directory error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Caller-facing error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnknownCollection,
    PipelineBuild,
    Retrieval,
    Generation,
    Timeout,
    InvalidInput,
    Internal,
}

impl RagError {
    /// Classify this error for structured reporting
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownCollection(_) => ErrorKind::UnknownCollection,
            Self::PipelineBuild { .. } => ErrorKind::PipelineBuild,
            Self::Retrieval(_) => ErrorKind::Retrieval,
            Self::Generation(_) => ErrorKind::Generation,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::InvalidInput(_) | Self::Config(_) => ErrorKind::InvalidInput,
            _ => ErrorKind::Internal,
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::UnknownCollection => exit_codes::NOT_FOUND,
            ErrorKind::InvalidInput => exit_codes::INVALID_INPUT,
            ErrorKind::Timeout => exit_codes::TIMEOUT,
            _ => exit_codes::GENERAL_ERROR,
        }
    }

    /// Wrap a lower-layer failure as a retrieval error.
    ///
    /// Errors that already carry a pipeline-level kind pass through unchanged.
    pub fn into_retrieval(self) -> Self {
        match self {
            Self::UnknownCollection(_) | Self::Retrieval(_) | Self::Timeout { .. } => self,
            other => Self::Retrieval(other.to_string()),
        }
    }

    /// Wrap a lower-layer failure as a generation error.
    pub fn into_generation(self) -> Self {
        match self {
            Self::Generation(_) | Self::Timeout { .. } => self,
            other => Self::Generation(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            RagError::UnknownCollection("ghost".into()).exit_code(),
            exit_codes::NOT_FOUND
        );
        assert_eq!(
            RagError::InvalidInput("top_k".into()).exit_code(),
            exit_codes::INVALID_INPUT
        );
        let timeout = RagError::Timeout {
            stage: Stage::Generation,
            after: Duration::from_secs(1),
        };
        assert_eq!(timeout.exit_code(), exit_codes::TIMEOUT);
        assert_eq!(timeout.to_string(), "generation stage timed out after 1000ms");
    }

    #[test]
    fn test_wrapping_preserves_pipeline_kinds() {
        let err = RagError::UnknownCollection("docs".into()).into_retrieval();
        assert_eq!(err.kind(), ErrorKind::UnknownCollection);

        let err = RagError::Provider("connection refused".into()).into_retrieval();
        assert_eq!(err.kind(), ErrorKind::Retrieval);
        assert!(err.to_string().contains("connection refused"));

        let err = RagError::Provider("rate limited".into()).into_generation();
        assert_eq!(err.kind(), ErrorKind::Generation);
    }
}
