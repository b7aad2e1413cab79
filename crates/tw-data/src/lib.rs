//! Data access for the tabwalk table browser
//!
//! Provides the opaque query-engine abstraction, the SQLite-backed
//! concrete engine (with CSV/JSON ingestion), the query façade issuing a
//! fixed vocabulary of SQL shapes, and the windowed relation cache.

pub mod cache;
pub mod engine;
pub mod facade;

use std::path::PathBuf;

use arrow::error::ArrowError;
use thiserror::Error;

// Re-exports
pub use cache::{RelationCache, WindowKey};
pub use engine::{QueryEngine, Relation, SqliteEngine};
pub use facade::{FilterOp, QueryFacade};

/// Errors that can occur while browsing a tabular source
#[derive(Error, Debug)]
pub enum BrowseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("file not found: {0}")]
    Missing(PathBuf),

    #[error("unsupported file type: {0}")]
    UnsupportedFormat(PathBuf),

    /// The probe query produced zero columns: the file is unreadable
    /// as a table
    #[error("no columns found in {0}")]
    NoColumns(PathBuf),

    #[error("unknown column: {0}")]
    UnknownColumn(String),

    /// The engine rejected a query; carries the engine's message
    #[error("query failed: {0}")]
    Query(String),

    #[error("CSV parsing error: {0}")]
    Csv(String),

    #[error("JSON parsing error: {0}")]
    Json(String),

    #[error("Parquet error: {0}")]
    Parquet(String),

    #[error("Arrow error: {0}")]
    Arrow(ArrowError),

    #[error("no file loaded")]
    NotLoaded,

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<csv::Error> for BrowseError {
    fn from(error: csv::Error) -> Self {
        match error.kind() {
            csv::ErrorKind::Io(io_err) => {
                BrowseError::Io(std::io::Error::new(io_err.kind(), error.to_string()))
            }
            _ => BrowseError::Csv(error.to_string()),
        }
    }
}

impl From<serde_json::Error> for BrowseError {
    fn from(error: serde_json::Error) -> Self {
        BrowseError::Json(error.to_string())
    }
}

impl From<parquet::errors::ParquetError> for BrowseError {
    fn from(error: parquet::errors::ParquetError) -> Self {
        BrowseError::Parquet(error.to_string())
    }
}

impl From<ArrowError> for BrowseError {
    fn from(error: ArrowError) -> Self {
        BrowseError::Arrow(error)
    }
}

impl From<rusqlite::Error> for BrowseError {
    fn from(error: rusqlite::Error) -> Self {
        BrowseError::Query(error.to_string())
    }
}
