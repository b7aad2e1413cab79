//! One-shot ingestion of CSV/JSON/Parquet files into a scratch SQLite
//! database
//!
//! CSV and JSON column types are sniffed from a bounded sample of rows;
//! Parquet carries its own schema. Everything the sample cannot pin down
//! keeps TEXT affinity and SQLite's coercion rules do the rest.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{self as adt, DataType};
use arrow::util::display::array_value_to_string;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use rusqlite::types::Value;
use rusqlite::Connection;
use tempfile::TempPath;
use tracing::debug;

use super::quote_ident;
use super::sqlite::INGEST_TABLE;
use crate::BrowseError;

/// Rows examined for type detection
const MAX_SAMPLE_ROWS: usize = 5000;

/// Ingest a CSV file (with a header row) into a scratch database
pub(super) fn csv_to_sqlite(path: &Path) -> Result<TempPath, BrowseError> {
    // First pass: headers plus a bounded sample for type sniffing
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(BrowseError::NoColumns(path.to_path_buf()));
    }

    let mut sample: Vec<csv::StringRecord> = Vec::new();
    for result in reader.records() {
        sample.push(result?);
        if sample.len() >= MAX_SAMPLE_ROWS {
            break;
        }
    }
    let affinities: Vec<&'static str> = (0..headers.len())
        .map(|idx| detect_csv_affinity(&sample, idx))
        .collect();

    let scratch = scratch_db()?;
    let mut conn = Connection::open(&scratch)?;
    create_table(&conn, &headers, &affinities)?;

    // Second pass: stream every row into the scratch table
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(&insert_sql(headers.len()))?;
        for result in reader.records() {
            let record = result?;
            let values: Vec<Value> = (0..headers.len())
                .map(|idx| match record.get(idx) {
                    None | Some("") => Value::Null,
                    Some(text) => Value::Text(text.to_string()),
                })
                .collect();
            stmt.execute(rusqlite::params_from_iter(values))?;
        }
    }
    tx.commit()?;

    debug!(path = %path.display(), columns = headers.len(), "CSV ingested");
    Ok(scratch)
}

/// Ingest a JSON file holding a top-level array of objects
pub(super) fn json_to_sqlite(path: &Path) -> Result<TempPath, BrowseError> {
    let file = File::open(path)?;
    let value: serde_json::Value = serde_json::from_reader(BufReader::new(file))?;
    let rows = value
        .as_array()
        .ok_or_else(|| BrowseError::Json("expected a top-level array of objects".to_string()))?;

    // Column order follows first appearance across the sampled objects
    let mut columns: Vec<String> = Vec::new();
    for row in rows.iter().take(MAX_SAMPLE_ROWS) {
        let object = row
            .as_object()
            .ok_or_else(|| BrowseError::Json("expected every element to be an object".to_string()))?;
        for key in object.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }
    if columns.is_empty() {
        return Err(BrowseError::NoColumns(path.to_path_buf()));
    }

    let affinities: Vec<&'static str> = columns
        .iter()
        .map(|column| detect_json_affinity(rows, column))
        .collect();

    let scratch = scratch_db()?;
    let mut conn = Connection::open(&scratch)?;
    create_table(&conn, &columns, &affinities)?;

    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(&insert_sql(columns.len()))?;
        for row in rows {
            let object = row.as_object().ok_or_else(|| {
                BrowseError::Json("expected every element to be an object".to_string())
            })?;
            let values: Vec<Value> = columns
                .iter()
                .map(|column| json_to_sql_value(object.get(column)))
                .collect();
            stmt.execute(rusqlite::params_from_iter(values))?;
        }
    }
    tx.commit()?;

    debug!(path = %path.display(), columns = columns.len(), rows = rows.len(), "JSON ingested");
    Ok(scratch)
}

/// Ingest a Parquet file, batch by batch, preserving its typed schema
pub(super) fn parquet_to_sqlite(path: &Path) -> Result<TempPath, BrowseError> {
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let schema = builder.schema().clone();
    let columns: Vec<String> = schema.fields().iter().map(|f| f.name().clone()).collect();
    if columns.is_empty() {
        return Err(BrowseError::NoColumns(path.to_path_buf()));
    }
    let affinities: Vec<&'static str> = schema
        .fields()
        .iter()
        .map(|field| parquet_affinity(field.data_type()))
        .collect();
    let reader = builder.build()?;

    let scratch = scratch_db()?;
    let mut conn = Connection::open(&scratch)?;
    create_table(&conn, &columns, &affinities)?;

    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(&insert_sql(columns.len()))?;
        for batch in reader {
            let batch = batch?;
            for row in 0..batch.num_rows() {
                let values: Vec<Value> = batch
                    .columns()
                    .iter()
                    .map(|column| arrow_cell_to_sql(column, row))
                    .collect::<Result<_, _>>()?;
                stmt.execute(rusqlite::params_from_iter(values))?;
            }
        }
    }
    tx.commit()?;

    debug!(path = %path.display(), columns = columns.len(), "Parquet ingested");
    Ok(scratch)
}

/// Create the scratch database file; it is deleted when the returned
/// path guard drops
fn scratch_db() -> Result<TempPath, BrowseError> {
    let file = tempfile::Builder::new()
        .prefix("tabwalk-")
        .suffix(".sqlite")
        .tempfile()?;
    Ok(file.into_temp_path())
}

fn create_table(
    conn: &Connection,
    columns: &[String],
    affinities: &[&'static str],
) -> Result<(), BrowseError> {
    let definitions: Vec<String> = columns
        .iter()
        .zip(affinities)
        .map(|(name, affinity)| format!("{} {}", quote_ident(name), affinity))
        .collect();
    let sql = format!(
        "CREATE TABLE {} ({})",
        quote_ident(INGEST_TABLE),
        definitions.join(", ")
    );
    conn.execute(&sql, [])?;
    Ok(())
}

fn insert_sql(column_count: usize) -> String {
    let placeholders = vec!["?"; column_count].join(", ");
    format!(
        "INSERT INTO {} VALUES ({})",
        quote_ident(INGEST_TABLE),
        placeholders
    )
}

/// Decide a column's SQLite affinity from the sampled CSV values.
/// Empty strings count as missing and carry no type evidence.
fn detect_csv_affinity(sample: &[csv::StringRecord], column: usize) -> &'static str {
    let mut seen = false;
    let mut all_int = true;
    let mut all_float = true;

    for record in sample {
        let text = match record.get(column) {
            None | Some("") => continue,
            Some(text) => text,
        };
        seen = true;
        if text.parse::<i64>().is_err() {
            all_int = false;
        }
        if text.parse::<f64>().is_err() {
            all_float = false;
        }
    }

    match (seen, all_int, all_float) {
        (false, _, _) => "TEXT",
        (true, true, _) => "INTEGER",
        (true, false, true) => "REAL",
        _ => "TEXT",
    }
}

/// Decide a column's SQLite affinity from the sampled JSON values
fn detect_json_affinity(rows: &[serde_json::Value], column: &str) -> &'static str {
    let mut seen = false;
    let mut all_bool = true;
    let mut all_int = true;
    let mut all_number = true;

    for row in rows.iter().take(MAX_SAMPLE_ROWS) {
        let value = match row.get(column) {
            None | Some(serde_json::Value::Null) => continue,
            Some(value) => value,
        };
        seen = true;
        if !value.is_boolean() {
            all_bool = false;
        }
        if !value.is_i64() {
            all_int = false;
        }
        if !value.is_number() {
            all_number = false;
        }
    }

    match (seen, all_bool, all_int, all_number) {
        (false, ..) => "TEXT",
        (true, true, _, _) => "BOOLEAN",
        (true, _, true, _) => "INTEGER",
        (true, _, _, true) => "REAL",
        _ => "TEXT",
    }
}

/// Map an arrow type to the SQLite affinity a parquet column keeps
fn parquet_affinity(data_type: &DataType) -> &'static str {
    match data_type {
        DataType::Boolean => "BOOLEAN",
        d if d.is_integer() => "INTEGER",
        DataType::Float32 | DataType::Float64 => "REAL",
        _ => "TEXT",
    }
}

/// Convert one arrow cell into a SQLite value.
/// Anything beyond the primitive types keeps its display form as text.
fn arrow_cell_to_sql(array: &ArrayRef, row: usize) -> Result<Value, BrowseError> {
    if array.is_null(row) {
        return Ok(Value::Null);
    }
    let value = match array.data_type() {
        DataType::Boolean => Value::Integer(array.as_boolean().value(row) as i64),
        DataType::Int8 => Value::Integer(array.as_primitive::<adt::Int8Type>().value(row) as i64),
        DataType::Int16 => Value::Integer(array.as_primitive::<adt::Int16Type>().value(row) as i64),
        DataType::Int32 => Value::Integer(array.as_primitive::<adt::Int32Type>().value(row) as i64),
        DataType::Int64 => Value::Integer(array.as_primitive::<adt::Int64Type>().value(row)),
        DataType::UInt8 => Value::Integer(array.as_primitive::<adt::UInt8Type>().value(row) as i64),
        DataType::UInt16 => {
            Value::Integer(array.as_primitive::<adt::UInt16Type>().value(row) as i64)
        }
        DataType::UInt32 => {
            Value::Integer(array.as_primitive::<adt::UInt32Type>().value(row) as i64)
        }
        DataType::UInt64 => {
            Value::Integer(array.as_primitive::<adt::UInt64Type>().value(row) as i64)
        }
        DataType::Float32 => {
            Value::Real(array.as_primitive::<adt::Float32Type>().value(row) as f64)
        }
        DataType::Float64 => Value::Real(array.as_primitive::<adt::Float64Type>().value(row)),
        _ => Value::Text(array_value_to_string(array, row)?),
    };
    Ok(value)
}

fn json_to_sql_value(value: Option<&serde_json::Value>) -> Value {
    match value {
        None | Some(serde_json::Value::Null) => Value::Null,
        Some(serde_json::Value::Bool(b)) => Value::Integer(*b as i64),
        Some(serde_json::Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else {
                Value::Real(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Some(serde_json::Value::String(s)) => Value::Text(s.clone()),
        // nested structures keep their serialized form
        Some(other) => Value::Text(other.to_string()),
    }
}
