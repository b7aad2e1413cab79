//! End-to-end tests for the SQLite engine over real fixture files

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use arrow::array::{Int64Array, StringArray};
use tempfile::TempDir;

use tw_data::{BrowseError, FilterOp, QueryEngine, QueryFacade, SqliteEngine};

fn write_fixture(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

fn people_csv(dir: &TempDir) -> PathBuf {
    write_fixture(
        dir,
        "people.csv",
        "id,name,score\n\
         1,alice,9.5\n\
         2,bob,7.25\n\
         3,carol,\n\
         4,dave,4.0\n\
         5,erin,8.75\n",
    )
}

fn facade_for(path: &std::path::Path) -> QueryFacade {
    let engine = Arc::new(SqliteEngine::open(path).unwrap());
    QueryFacade::new(engine as Arc<dyn QueryEngine>)
}

#[test]
fn csv_probe_count_and_window() {
    let dir = TempDir::new().unwrap();
    let path = people_csv(&dir);
    let mut facade = facade_for(&path);

    assert_eq!(facade.column_names().unwrap(), vec!["id", "name", "score"]);
    assert_eq!(facade.row_count().unwrap(), 5);

    let batch = facade.window(1, 2).unwrap().materialize().unwrap();
    assert_eq!(batch.num_rows(), 2);

    // sniffed INTEGER affinity comes back as Int64
    let ids = batch
        .column(0)
        .as_any()
        .downcast_ref::<Int64Array>()
        .expect("id column is Int64");
    assert_eq!(ids.value(0), 2);
    assert_eq!(ids.value(1), 3);

    let names = batch
        .column(1)
        .as_any()
        .downcast_ref::<StringArray>()
        .expect("name column is Utf8");
    assert_eq!(names.value(0), "bob");
}

#[test]
fn window_is_bounded_by_the_dataset() {
    let dir = TempDir::new().unwrap();
    let path = people_csv(&dir);
    let facade = facade_for(&path);

    let batch = facade.window(4, 100).unwrap().materialize().unwrap();
    assert_eq!(batch.num_rows(), 1);

    let batch = facade.window(100, 100).unwrap().materialize().unwrap();
    assert_eq!(batch.num_rows(), 0);
}

#[test]
fn filters_run_against_the_engine() {
    let dir = TempDir::new().unwrap();
    let path = people_csv(&dir);
    let mut facade = facade_for(&path);

    assert_eq!(facade.filtered_count("name", FilterOp::Exact, "bob").unwrap(), 1);
    assert_eq!(facade.filtered_count("name", FilterOp::Contains, "a").unwrap(), 3);
    assert_eq!(facade.filtered_count("name", FilterOp::StartsWith, "da").unwrap(), 1);
    assert_eq!(facade.filtered_count("name", FilterOp::EndsWith, "e").unwrap(), 2);
    assert_eq!(facade.filtered_count("name", FilterOp::Exact, "nobody").unwrap(), 0);

    // Exact matches against the text form of a numeric column
    assert_eq!(facade.filtered_count("id", FilterOp::Exact, "3").unwrap(), 1);

    let batch = facade
        .filtered_window("name", FilterOp::Contains, "a", 0, 10)
        .unwrap()
        .materialize()
        .unwrap();
    assert_eq!(batch.num_rows(), 3);
}

#[test]
fn column_sample_skips_nulls() {
    let dir = TempDir::new().unwrap();
    let path = people_csv(&dir);
    let mut facade = facade_for(&path);

    // carol's empty score ingested as NULL
    let sample = facade.column_sample("score", 100).unwrap();
    assert_eq!(sample.len(), 4);

    let capped = facade.column_sample("score", 2).unwrap();
    assert_eq!(capped.len(), 2);
}

#[test]
fn json_array_of_objects_ingests() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(
        &dir,
        "orders.json",
        r#"[
            {"id": 1, "item": "anvil", "paid": true},
            {"id": 2, "item": "rocket", "paid": false},
            {"id": 3, "item": null, "paid": true}
        ]"#,
    );
    let mut facade = facade_for(&path);

    assert_eq!(facade.column_names().unwrap(), vec!["id", "item", "paid"]);
    assert_eq!(facade.row_count().unwrap(), 3);
    assert_eq!(facade.filtered_count("item", FilterOp::Exact, "anvil").unwrap(), 1);
    assert_eq!(facade.column_sample("item", 100).unwrap().len(), 2);
}

#[test]
fn parquet_files_ingest_with_their_schema() {
    use arrow::array::{ArrayRef, BooleanArray, Float64Array, RecordBatch};
    use parquet::arrow::ArrowWriter;

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("metrics.parquet");

    let ids: ArrayRef = Arc::new(Int64Array::from(vec![Some(1), Some(2), Some(3)]));
    let names: ArrayRef = Arc::new(StringArray::from(vec![Some("cpu"), Some("mem"), None]));
    let loads: ArrayRef = Arc::new(Float64Array::from(vec![Some(0.5), None, Some(0.75)]));
    let hot: ArrayRef = Arc::new(BooleanArray::from(vec![Some(true), Some(false), Some(true)]));
    let batch = RecordBatch::try_from_iter(vec![
        ("id", ids),
        ("name", names),
        ("load", loads),
        ("hot", hot),
    ])
    .unwrap();
    {
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
    }

    let mut facade = facade_for(&path);
    assert_eq!(
        facade.column_names().unwrap(),
        vec!["id", "name", "load", "hot"]
    );
    assert_eq!(facade.row_count().unwrap(), 3);

    let window = facade.window(0, 10).unwrap().materialize().unwrap();
    assert_eq!(window.num_rows(), 3);
    let ids = window
        .column(0)
        .as_any()
        .downcast_ref::<Int64Array>()
        .expect("id column is Int64");
    assert_eq!(ids.value(2), 3);

    // nulls survive the round trip
    assert_eq!(facade.column_sample("name", 100).unwrap(), vec!["cpu", "mem"]);
    assert_eq!(
        facade.filtered_count("hot", FilterOp::Exact, "1").unwrap(),
        2
    );
}

#[test]
fn sqlite_files_are_served_in_place() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("events.sqlite");
    {
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.execute("CREATE TABLE events (id INTEGER, kind TEXT)", [])
            .unwrap();
        conn.execute(
            "INSERT INTO events VALUES (1, 'start'), (2, 'stop'), (3, NULL)",
            [],
        )
        .unwrap();
    }

    let engine = SqliteEngine::open(&path).unwrap();
    assert_eq!(engine.table(), "events");

    let mut facade = QueryFacade::new(Arc::new(engine) as Arc<dyn QueryEngine>);
    assert_eq!(facade.column_names().unwrap(), vec!["id", "kind"]);
    assert_eq!(facade.row_count().unwrap(), 3);
    assert_eq!(facade.column_sample("kind", 100).unwrap(), vec!["start", "stop"]);
}

#[test]
fn missing_file_is_reported_before_any_query() {
    let err = SqliteEngine::open(std::path::Path::new("/no/such/file.csv")).unwrap_err();
    assert!(matches!(err, BrowseError::Missing(_)));
}

#[test]
fn unknown_extension_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(&dir, "notes.txt", "hello");
    let err = SqliteEngine::open(&path).unwrap_err();
    assert!(matches!(err, BrowseError::UnsupportedFormat(_)));
}

#[test]
fn empty_sqlite_database_has_no_columns() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.sqlite");
    {
        rusqlite::Connection::open(&path).unwrap();
    }
    let err = SqliteEngine::open(&path).unwrap_err();
    assert!(matches!(err, BrowseError::NoColumns(_)));
}

#[test]
fn quoted_search_values_cannot_break_the_query() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(
        &dir,
        "notes.csv",
        "id,note\n1,it's fine\n2,\"a \"\"quoted\"\" word\"\n",
    );
    let mut facade = facade_for(&path);

    assert_eq!(
        facade.filtered_count("note", FilterOp::Contains, "it's").unwrap(),
        1
    );
    assert_eq!(
        facade.filtered_count("note", FilterOp::Contains, "\"quoted\"").unwrap(),
        1
    );
    assert_eq!(
        facade
            .filtered_count("note", FilterOp::Exact, "'; DROP TABLE data; --")
            .unwrap(),
        0
    );
    // the table is still there
    assert_eq!(facade.row_count().unwrap(), 2);
}
