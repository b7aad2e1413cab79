//! File-level summary shown when a table loads.

use std::fs;
use std::path::{Path, PathBuf};

/// Snapshot of a loaded file: identity, size on disk, and shape.
#[derive(Debug, Clone)]
pub struct FileSummary {
    pub path: PathBuf,
    pub byte_size: u64,
    pub total_rows: u64,
    pub columns: Vec<String>,
}

impl FileSummary {
    pub fn collect(path: &Path, total_rows: u64, columns: Vec<String>) -> Self {
        let byte_size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        Self {
            path: path.to_path_buf(),
            byte_size,
            total_rows,
            columns,
        }
    }

    /// Multi-line description suitable for an info pane.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("File: {}\n", self.path.display()));
        out.push_str(&format!("Total Rows: {}\n", human_rows(self.total_rows)));
        out.push_str(&format!("Total Columns: {}\n", self.columns.len()));
        out.push_str(&format!("Byte size: {}\n", human_bytes(self.byte_size)));
        out.push_str("\nColumn names\n============\n");
        for (i, name) in self.columns.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", i + 1, name));
        }
        out
    }
}

/// Row counts as compact text: plain below a thousand, then one-decimal
/// K/M/B with a trailing ".0" dropped.
pub fn human_rows(rows: u64) -> String {
    const THOUSAND: f64 = 1_000.0;
    const MILLION: f64 = 1_000_000.0;
    const BILLION: f64 = 1_000_000_000.0;

    let value = rows as f64;
    let (scaled, suffix) = if value < THOUSAND {
        return rows.to_string();
    } else if value < MILLION {
        (value / THOUSAND, "K")
    } else if value < BILLION {
        (value / MILLION, "M")
    } else {
        (value / BILLION, "B")
    };
    let mut text = format!("{scaled:.1}");
    if text.ends_with(".0") {
        text.truncate(text.len() - 2);
    }
    text.push_str(suffix);
    text
}

/// Byte counts as text: exact below 1 KB, then two-decimal KB/MB/GB.
pub fn human_bytes(size: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let value = size as f64;
    if value < KB {
        format!("{size} B")
    } else if value < MB {
        format!("{:.2} KB", value / KB)
    } else if value < GB {
        format!("{:.2} MB", value / MB)
    } else {
        format!("{:.2} GB", value / GB)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_row_counts_stay_plain() {
        assert_eq!(human_rows(0), "0");
        assert_eq!(human_rows(42), "42");
        assert_eq!(human_rows(999), "999");
    }

    #[test]
    fn row_counts_scale_with_suffixes() {
        assert_eq!(human_rows(1_000), "1K");
        assert_eq!(human_rows(1_500), "1.5K");
        assert_eq!(human_rows(2_000_000), "2M");
        assert_eq!(human_rows(2_340_000), "2.3M");
        assert_eq!(human_rows(7_000_000_000), "7B");
    }

    #[test]
    fn whole_multiples_drop_the_decimal() {
        assert_eq!(human_rows(10_000), "10K");
        assert_eq!(human_rows(1_000_000), "1M");
    }

    #[test]
    fn byte_sizes_scale() {
        assert_eq!(human_bytes(512), "512 B");
        assert_eq!(human_bytes(1536), "1.50 KB");
        assert_eq!(human_bytes(5 * 1024 * 1024), "5.00 MB");
        assert_eq!(human_bytes(3 * 1024 * 1024 * 1024), "3.00 GB");
    }

    #[test]
    fn describe_lists_columns_in_order() {
        let summary = FileSummary {
            path: PathBuf::from("data.csv"),
            byte_size: 2048,
            total_rows: 1_500,
            columns: vec!["id".into(), "name".into()],
        };
        let text = summary.describe();
        assert!(text.contains("Total Rows: 1.5K"));
        assert!(text.contains("Total Columns: 2"));
        assert!(text.contains("Byte size: 2.00 KB"));
        assert!(text.contains("1. id\n2. name\n"));
    }
}
