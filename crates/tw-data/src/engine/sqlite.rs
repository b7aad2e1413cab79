//! SQLite-backed query engine
//!
//! SQLite databases are served in place; CSV, JSON and Parquet files are
//! ingested once into a scratch database that lives as long as the engine. Every
//! query opens its own connection, so the engine can be shared freely
//! between the interactive path and the background aggregator.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{
    ArrayBuilder, ArrayRef, BooleanBuilder, Float64Builder, Int64Builder, StringBuilder,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use tempfile::TempPath;
use tracing::debug;

use super::{ingest, QueryEngine, Relation};
use crate::BrowseError;

/// Table name used for ingested CSV/JSON data
pub(crate) const INGEST_TABLE: &str = "data";

#[derive(Debug)]
pub struct SqliteEngine {
    source_path: PathBuf,
    db_path: PathBuf,
    table: String,
    /// Scratch database backing an ingested source; deleting it on drop
    /// is what ends the session for CSV/JSON files
    _scratch: Option<TempPath>,
}

impl SqliteEngine {
    /// Open an engine over a source file, dispatching on its extension.
    ///
    /// `.sqlite`/`.db` files are served directly (browsing their first
    /// user table); `.csv`, `.json` and `.parquet` files are ingested
    /// into a scratch database first.
    pub fn open(path: &Path) -> Result<Self, BrowseError> {
        if !path.exists() {
            return Err(BrowseError::Missing(path.to_path_buf()));
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "db" | "sqlite" | "sqlite3" => {
                let table = Self::first_user_table(path)?;
                debug!(path = %path.display(), table, "serving SQLite source in place");
                Ok(Self {
                    source_path: path.to_path_buf(),
                    db_path: path.to_path_buf(),
                    table,
                    _scratch: None,
                })
            }
            "csv" => {
                let scratch = ingest::csv_to_sqlite(path)?;
                Self::ingested(path, scratch)
            }
            "json" => {
                let scratch = ingest::json_to_sqlite(path)?;
                Self::ingested(path, scratch)
            }
            "parquet" => {
                let scratch = ingest::parquet_to_sqlite(path)?;
                Self::ingested(path, scratch)
            }
            _ => Err(BrowseError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    fn ingested(path: &Path, scratch: TempPath) -> Result<Self, BrowseError> {
        debug!(path = %path.display(), "source ingested into scratch database");
        Ok(Self {
            source_path: path.to_path_buf(),
            db_path: scratch.to_path_buf(),
            table: INGEST_TABLE.to_string(),
            _scratch: Some(scratch),
        })
    }

    /// Find the first user table in a SQLite database
    fn first_user_table(path: &Path) -> Result<String, BrowseError> {
        let conn = Connection::open(path)?;
        let mut stmt = conn.prepare(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
             ORDER BY name LIMIT 1",
        )?;
        let mut rows = stmt.query([])?;
        match rows.next()? {
            Some(row) => Ok(row.get(0)?),
            None => Err(BrowseError::NoColumns(path.to_path_buf())),
        }
    }
}

impl QueryEngine for SqliteEngine {
    fn source_path(&self) -> &Path {
        &self.source_path
    }

    fn table(&self) -> &str {
        &self.table
    }

    fn relation(
        &self,
        sql: String,
        params: Vec<String>,
    ) -> Result<Arc<dyn Relation>, BrowseError> {
        // Preparing resolves the column list without fetching rows
        let conn = Connection::open(&self.db_path)?;
        let stmt = conn.prepare(&sql)?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        drop(stmt);

        Ok(Arc::new(SqliteRelation {
            db_path: self.db_path.clone(),
            sql,
            params,
            columns,
        }))
    }

    fn count(&self, sql: &str, params: &[String]) -> Result<u64, BrowseError> {
        let conn = Connection::open(&self.db_path)?;
        let count: i64 = conn.query_row(sql, rusqlite::params_from_iter(params.iter()), |row| {
            row.get(0)
        })?;
        Ok(count.max(0) as u64)
    }
}

/// A prepared query against one SQLite database.
///
/// Holds only the SQL text, bound parameters and resolved column list;
/// `materialize` opens a fresh connection and runs the query.
struct SqliteRelation {
    db_path: PathBuf,
    sql: String,
    params: Vec<String>,
    columns: Vec<String>,
}

impl Relation for SqliteRelation {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn materialize(&self) -> Result<RecordBatch, BrowseError> {
        let conn = Connection::open(&self.db_path)?;
        let mut stmt = conn.prepare(&self.sql)?;

        // Declared types drive the arrow schema; expression columns with
        // no declaration fall back to text
        let decl_types: Vec<Option<String>> = stmt
            .columns()
            .iter()
            .map(|c| c.decl_type().map(|t| t.to_string()))
            .collect();
        let fields: Vec<Field> = self
            .columns
            .iter()
            .zip(&decl_types)
            .map(|(name, decl)| Field::new(name, arrow_type(decl.as_deref()), true))
            .collect();
        let schema = Arc::new(Schema::new(fields));

        let mut builders: Vec<Box<dyn ArrayBuilder>> = schema
            .fields()
            .iter()
            .map(|field| match field.data_type() {
                DataType::Int64 => Box::new(Int64Builder::new()) as Box<dyn ArrayBuilder>,
                DataType::Float64 => Box::new(Float64Builder::new()) as Box<dyn ArrayBuilder>,
                DataType::Boolean => Box::new(BooleanBuilder::new()) as Box<dyn ArrayBuilder>,
                _ => Box::new(StringBuilder::new()) as Box<dyn ArrayBuilder>,
            })
            .collect();

        let mut rows = stmt.query(rusqlite::params_from_iter(self.params.iter()))?;
        while let Some(row) = rows.next()? {
            for (col_idx, field) in schema.fields().iter().enumerate() {
                let value = row.get_ref(col_idx)?;
                append_value(field.data_type(), &mut builders[col_idx], value);
            }
        }

        let arrays: Vec<ArrayRef> = builders.into_iter().map(|mut b| b.finish()).collect();
        RecordBatch::try_new(schema, arrays).map_err(BrowseError::Arrow)
    }
}

/// Map a SQLite declared type to the arrow type used for materialization
fn arrow_type(decl: Option<&str>) -> DataType {
    match decl.map(|d| d.to_uppercase()) {
        Some(d) if d.contains("INT") => DataType::Int64,
        Some(d)
            if d.contains("REAL")
                || d.contains("FLOAT")
                || d.contains("DOUBLE")
                || d.contains("NUMERIC")
                || d.contains("DECIMAL") =>
        {
            DataType::Float64
        }
        Some(d) if d.contains("BOOL") => DataType::Boolean,
        _ => DataType::Utf8,
    }
}

/// Append one SQLite value to the matching arrow builder.
///
/// Values that do not fit the declared type become nulls, the same
/// lossy-but-total policy the display layer expects.
fn append_value(data_type: &DataType, builder: &mut Box<dyn ArrayBuilder>, value: ValueRef<'_>) {
    match data_type {
        DataType::Int64 => {
            let builder = builder
                .as_any_mut()
                .downcast_mut::<Int64Builder>()
                .expect("builder matches declared type");
            match value {
                ValueRef::Integer(i) => builder.append_value(i),
                _ => builder.append_null(),
            }
        }
        DataType::Float64 => {
            let builder = builder
                .as_any_mut()
                .downcast_mut::<Float64Builder>()
                .expect("builder matches declared type");
            match value {
                ValueRef::Real(f) => builder.append_value(f),
                ValueRef::Integer(i) => builder.append_value(i as f64),
                _ => builder.append_null(),
            }
        }
        DataType::Boolean => {
            let builder = builder
                .as_any_mut()
                .downcast_mut::<BooleanBuilder>()
                .expect("builder matches declared type");
            match value {
                ValueRef::Integer(i) => builder.append_value(i != 0),
                _ => builder.append_null(),
            }
        }
        _ => {
            let builder = builder
                .as_any_mut()
                .downcast_mut::<StringBuilder>()
                .expect("builder matches declared type");
            match value {
                ValueRef::Text(s) => builder.append_value(String::from_utf8_lossy(s)),
                ValueRef::Integer(i) => builder.append_value(i.to_string()),
                ValueRef::Real(f) => builder.append_value(f.to_string()),
                _ => builder.append_null(),
            }
        }
    }
}
