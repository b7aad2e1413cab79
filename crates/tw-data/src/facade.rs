//! Query façade
//!
//! Translates a small fixed vocabulary of browsing intents into SQL
//! shapes against the opaque engine: column probe, total count, windowed
//! scan, filtered scan, and single-column sample. Filter values travel as
//! bound parameters, never interpolated into the SQL text.

use std::path::PathBuf;
use std::sync::Arc;

use ahash::AHashMap;
use arrow::array::StringArray;
use tracing::debug;

use crate::engine::{quote_ident, QueryEngine, Relation};
use crate::BrowseError;

/// Predicate kinds supported by search.
///
/// `Exact` compares the text form of the column; the other three compile
/// to `LIKE` with `%` wildcards placed in the bound pattern. `%` and `_`
/// inside the needle keep their `LIKE` meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Exact,
    Contains,
    StartsWith,
    EndsWith,
}

impl FilterOp {
    /// The WHERE clause for this predicate over `column`, with the value
    /// as parameter 1
    fn clause(&self, column: &str) -> String {
        let column = quote_ident(column);
        match self {
            FilterOp::Exact => format!("CAST({} AS TEXT) = ?1", column),
            _ => format!("CAST({} AS TEXT) LIKE ?1", column),
        }
    }

    /// The bound pattern for this predicate
    fn pattern(&self, value: &str) -> String {
        match self {
            FilterOp::Exact => value.to_string(),
            FilterOp::Contains => format!("%{}%", value),
            FilterOp::StartsWith => format!("{}%", value),
            FilterOp::EndsWith => format!("%{}", value),
        }
    }
}

impl std::str::FromStr for FilterOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "exact" => Ok(FilterOp::Exact),
            "contains" => Ok(FilterOp::Contains),
            "starts-with" | "startswith" | "prefix" => Ok(FilterOp::StartsWith),
            "ends-with" | "endswith" | "suffix" => Ok(FilterOp::EndsWith),
            other => Err(format!("unknown filter operator '{}'", other)),
        }
    }
}

/// Issues the fixed set of query shapes and normalizes the results.
///
/// Holds the per-path row-count memo: `COUNT(*)` runs once per source
/// path and the file is immutable for the session.
pub struct QueryFacade {
    engine: Arc<dyn QueryEngine>,
    columns: Option<Vec<String>>,
    row_counts: AHashMap<PathBuf, u64>,
}

impl QueryFacade {
    pub fn new(engine: Arc<dyn QueryEngine>) -> Self {
        Self {
            engine,
            columns: None,
            row_counts: AHashMap::new(),
        }
    }

    pub fn engine(&self) -> &Arc<dyn QueryEngine> {
        &self.engine
    }

    /// Probe the source and return its ordered column names.
    ///
    /// A result set with zero columns means the file is unreadable as a
    /// table. The probe runs once; later calls answer from memory.
    pub fn column_names(&mut self) -> Result<Vec<String>, BrowseError> {
        if let Some(columns) = &self.columns {
            return Ok(columns.clone());
        }

        let sql = format!("SELECT * FROM {} LIMIT 1", self.quoted_table());
        let relation = self.engine.relation(sql, Vec::new())?;
        let columns = relation.columns().to_vec();
        if columns.is_empty() {
            return Err(BrowseError::NoColumns(self.engine.source_path().to_path_buf()));
        }

        self.columns = Some(columns.clone());
        Ok(columns)
    }

    /// Exact total row count, memoized per source path
    pub fn row_count(&mut self) -> Result<u64, BrowseError> {
        let path = self.engine.source_path().to_path_buf();
        if let Some(count) = self.row_counts.get(&path) {
            return Ok(*count);
        }

        let sql = format!("SELECT COUNT(*) FROM {}", self.quoted_table());
        let count = self.engine.count(&sql, &[])?;
        debug!(path = %path.display(), count, "total row count computed");
        self.row_counts.insert(path, count);
        Ok(count)
    }

    /// Bounded scan of rows `[offset, offset + size)`.
    ///
    /// Row `i` of the returned relation is logical row `offset + i`.
    pub fn window(&self, offset: u64, size: u64) -> Result<Arc<dyn Relation>, BrowseError> {
        let sql = format!(
            "SELECT * FROM {} LIMIT {} OFFSET {}",
            self.quoted_table(),
            size,
            offset
        );
        self.engine.relation(sql, Vec::new())
    }

    /// Filtered scan, windowed to `[offset, offset + size)`.
    pub fn filtered_window(
        &mut self,
        column: &str,
        op: FilterOp,
        value: &str,
        offset: u64,
        size: u64,
    ) -> Result<Arc<dyn Relation>, BrowseError> {
        self.check_column(column)?;
        let sql = format!(
            "SELECT * FROM {} WHERE {} LIMIT {} OFFSET {}",
            self.quoted_table(),
            op.clause(column),
            size,
            offset
        );
        self.engine.relation(sql, vec![op.pattern(value)])
    }

    /// Number of rows the filter matches in the whole source
    pub fn filtered_count(
        &mut self,
        column: &str,
        op: FilterOp,
        value: &str,
    ) -> Result<u64, BrowseError> {
        self.check_column(column)?;
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE {}",
            self.quoted_table(),
            op.clause(column)
        );
        self.engine.count(&sql, &[op.pattern(value)])
    }

    /// Up to `cap` non-null values of one column, text-normalized, for
    /// the overview aggregator
    pub fn column_sample(&mut self, column: &str, cap: u64) -> Result<Vec<String>, BrowseError> {
        self.check_column(column)?;
        let quoted = quote_ident(column);
        let sql = format!(
            "SELECT CAST({} AS TEXT) FROM {} WHERE {} IS NOT NULL LIMIT {}",
            quoted,
            self.quoted_table(),
            quoted,
            cap
        );
        let batch = self.engine.relation(sql, Vec::new())?.materialize()?;
        if batch.num_columns() == 0 {
            return Ok(Vec::new());
        }

        let values = batch
            .column(0)
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| BrowseError::Query("column sample is not text".to_string()))?;
        Ok(values.iter().flatten().map(str::to_string).collect())
    }

    /// Column names are interpolated into SQL, so they must come from the
    /// probed column list
    fn check_column(&mut self, column: &str) -> Result<(), BrowseError> {
        let columns = self.column_names()?;
        if columns.iter().any(|c| c == column) {
            Ok(())
        } else {
            Err(BrowseError::UnknownColumn(column.to_string()))
        }
    }

    fn quoted_table(&self) -> String {
        quote_ident(self.engine.table())
    }
}
