//! Query engine abstraction
//!
//! The browsing core never interprets file formats itself; it hands SQL
//! strings to an opaque engine and gets back lazy relations. The concrete
//! engine here is SQLite, with CSV/JSON/Parquet files ingested once into
//! a scratch database so every source answers the same query shapes.

mod ingest;
mod sqlite;

pub use sqlite::SqliteEngine;

use std::path::Path;
use std::sync::Arc;

use arrow::record_batch::RecordBatch;

use crate::BrowseError;

/// A lazy, named-column tabular query result.
///
/// A relation is identified by its SQL text and bound parameters; it holds
/// no rows until materialized and is cheap to discard and recreate.
pub trait Relation: Send + Sync {
    /// Ordered column names of the result set
    fn columns(&self) -> &[String];

    /// Execute the query and return the rows as a record batch.
    /// Row `i` of the batch corresponds to logical row `offset + i` of
    /// whatever window the SQL requested.
    fn materialize(&self) -> Result<RecordBatch, BrowseError>;
}

/// An opaque tabular query service over one source file.
///
/// Supports `SELECT` with `WHERE`/`LIMIT`/`OFFSET`, `COUNT`, and column
/// introspection via a prepared probe. Implementations must be shareable
/// across threads; the background aggregator queries concurrently with
/// the interactive path.
pub trait QueryEngine: Send + Sync {
    /// Path of the source file this engine serves
    fn source_path(&self) -> &Path;

    /// Name of the virtual table backing the source
    fn table(&self) -> &str;

    /// Prepare a relation for the given SQL and bound text parameters.
    /// Preparing resolves the column list without fetching any rows.
    fn relation(&self, sql: String, params: Vec<String>)
        -> Result<Arc<dyn Relation>, BrowseError>;

    /// Run a counting query and return the single scalar result
    fn count(&self, sql: &str, params: &[String]) -> Result<u64, BrowseError>;
}

/// Quote an identifier for inclusion in a SQL string
pub(crate) fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_are_quoted() {
        assert_eq!(quote_ident("plain"), "\"plain\"");
        assert_eq!(quote_ident("with space"), "\"with space\"");
        assert_eq!(quote_ident("tricky\"name"), "\"tricky\"\"name\"");
    }
}
