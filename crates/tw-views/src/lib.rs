//! Browsing views over tabular sources.
//!
//! `TableBrowser` is the paging front end: it loads a file through
//! `tw-data`, keeps the current window rendered as strings, and answers
//! page and search requests. `overview` runs the per-column statistics
//! pass on its own thread.

pub mod browser;
pub mod config;
pub mod overview;
pub mod summary;
pub mod viewer;

pub use browser::{RenderedWindow, SearchOutcome, TableBrowser};
pub use config::{BrowserConfig, RetryPolicy};
pub use overview::{ColumnOutcome, ColumnReport};
pub use summary::{human_bytes, human_rows, FileSummary};
pub use viewer::TableViewer;
