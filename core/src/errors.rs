//! Error types for CovGraph core operations

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for a load run
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Graph storage error: {0}")]
    Storage(#[from] GraphError),

    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors related to graph storage operations
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Query execution failed: {0}")]
    QueryFailed(String),

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Errors raised while reading the input files.
///
/// These abort the run. Problems confined to a single row are written to the
/// audit log instead and never surface here.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Input file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed table {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Required column '{column}' missing from {}", path.display())]
    MissingColumn { path: PathBuf, column: String },

    #[error("Audit log write failed: {0}")]
    Audit(String),
}

impl LoadError {
    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Result type alias for graph operations
pub type GraphResult<T> = Result<T, GraphError>;

/// Result type alias for input reading
pub type LoadResult<T> = Result<T, LoadError>;
