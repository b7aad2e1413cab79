//! Background per-column statistics.
//!
//! The overview pass samples every column of the loaded table on a
//! dedicated thread and streams one [`ColumnReport`] per column back
//! over an mpsc channel, so callers can render rows as they arrive
//! instead of waiting for the whole table.

use std::collections::HashSet;
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};
use tw_data::{QueryEngine, QueryFacade};

use crate::config::RetryPolicy;

/// Result of sampling a single column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnOutcome {
    /// No non-null values in the sampled range.
    NoData,
    /// Every sampled value was distinct.
    FullyUnique { coverage: f64 },
    /// Mixed column: fraction non-null and fraction distinct.
    Measured { coverage: f64, uniqueness: f64 },
    /// All query attempts failed.
    Unavailable { attempts: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnReport {
    pub column: String,
    pub outcome: ColumnOutcome,
}

/// Spawns the overview thread and returns the report stream.
///
/// The thread opens its own facade over the shared engine, so it never
/// contends with the foreground browser. Dropping the receiver stops
/// the pass after the in-flight column.
pub(crate) fn spawn(
    engine: Arc<dyn QueryEngine>,
    columns: Vec<String>,
    total_rows: u64,
    sample_cap: u64,
    retry: RetryPolicy,
) -> Receiver<ColumnReport> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut facade = QueryFacade::new(engine);
        let rows_to_check = total_rows.min(sample_cap);
        for column in columns {
            let report = measure(&mut facade, &column, rows_to_check, retry);
            if tx.send(report).is_err() {
                debug!("overview receiver dropped; stopping early");
                break;
            }
        }
    });
    rx
}

fn measure(
    facade: &mut QueryFacade,
    column: &str,
    rows_to_check: u64,
    retry: RetryPolicy,
) -> ColumnReport {
    let attempts = retry.attempts.max(1);
    let mut delay = Duration::from_millis(retry.base_delay_ms);
    for attempt in 1..=attempts {
        match facade.column_sample(column, rows_to_check) {
            Ok(sample) => {
                return ColumnReport {
                    column: column.to_string(),
                    outcome: outcome_from_sample(&sample, rows_to_check),
                };
            }
            Err(err) => {
                warn!(column, attempt, error = %err, "column sample failed");
                if attempt < attempts {
                    thread::sleep(delay);
                    delay *= 2;
                }
            }
        }
    }
    ColumnReport {
        column: column.to_string(),
        outcome: ColumnOutcome::Unavailable { attempts },
    }
}

fn outcome_from_sample(sample: &[String], rows_to_check: u64) -> ColumnOutcome {
    if rows_to_check == 0 || sample.is_empty() {
        return ColumnOutcome::NoData;
    }
    let distinct = sample.iter().collect::<HashSet<_>>().len() as u64;
    let coverage = sample.len() as f64 / rows_to_check as f64;
    if distinct == rows_to_check {
        ColumnOutcome::FullyUnique { coverage }
    } else {
        ColumnOutcome::Measured {
            coverage,
            uniqueness: distinct as f64 / rows_to_check as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sample_reports_no_data() {
        assert_eq!(outcome_from_sample(&[], 10), ColumnOutcome::NoData);
    }

    #[test]
    fn zero_rows_reports_no_data_even_with_values() {
        assert_eq!(
            outcome_from_sample(&["x".to_string()], 0),
            ColumnOutcome::NoData
        );
    }

    #[test]
    fn all_distinct_values_are_fully_unique() {
        let sample: Vec<String> = (0..4).map(|i| i.to_string()).collect();
        assert_eq!(
            outcome_from_sample(&sample, 4),
            ColumnOutcome::FullyUnique { coverage: 1.0 }
        );
    }

    #[test]
    fn repeated_values_report_coverage_and_uniqueness() {
        let sample: Vec<String> = ["a", "a", "b"].iter().map(|s| s.to_string()).collect();
        match outcome_from_sample(&sample, 4) {
            ColumnOutcome::Measured {
                coverage,
                uniqueness,
            } => {
                assert_eq!(coverage, 0.75);
                assert_eq!(uniqueness, 0.5);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn nulls_keep_a_distinct_column_out_of_fully_unique() {
        // Three distinct values over four rows: distinct != rows_to_check.
        let sample: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        match outcome_from_sample(&sample, 4) {
            ColumnOutcome::Measured { uniqueness, .. } => assert_eq!(uniqueness, 0.75),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
