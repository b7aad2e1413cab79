//! tabwalk - browse tabular files a window at a time.
//!
//! A line-oriented shell over the table viewer: open a file, page
//! through it, search a column, and pull per-column statistics.

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tw_core::{HostContext, StatusSink, ViewerRegistry};
use tw_data::FilterOp;
use tw_views::{
    BrowserConfig, ColumnOutcome, RenderedWindow, SearchOutcome, TableBrowser, TableViewer,
};

/// Cells wider than this are clipped in the grid printout.
const MAX_CELL_WIDTH: usize = 24;

/// Routes viewer progress messages to stderr so they never interleave
/// with the grid on stdout.
struct StderrStatus;

impl StatusSink for StderrStatus {
    fn status(&self, message: &str) {
        eprintln!("* {message}");
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let browser = Arc::new(Mutex::new(TableBrowser::new(BrowserConfig::default())));

    let mut registry = ViewerRegistry::new();
    let handle = Arc::clone(&browser);
    registry.register("table", move || {
        Box::new(TableViewer::with_browser(Arc::clone(&handle)))
    });

    let host = HostContext::new(Arc::new(StderrStatus));
    let active = registry.activate("table", &host)?;
    info!(viewer = active.name(), "shell ready");

    if let Some(path) = std::env::args().nth(1) {
        run_command(&browser, &format!("open {path}"));
    } else {
        println!("tabwalk - type 'help' for commands");
    }

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" || line == "exit" {
            break;
        }
        run_command(&browser, line);
    }

    drop(active);
    Ok(())
}

fn run_command(browser: &Arc<Mutex<TableBrowser>>, line: &str) {
    if let Err(e) = dispatch(browser, line) {
        eprintln!("error: {e}");
    }
}

fn dispatch(browser: &Arc<Mutex<TableBrowser>>, line: &str) -> Result<()> {
    let mut parts = line.split_whitespace();
    let command = parts.next().unwrap_or_default();

    match command {
        "help" => print_help(),
        "open" => {
            let path = parts
                .next()
                .ok_or_else(|| anyhow::anyhow!("usage: open <path>"))?;
            let mut browser = browser.lock();
            browser.load(Path::new(path))?;
            if let Some(summary) = browser.summary() {
                println!("{}", summary.describe());
            }
            if let Some(window) = browser.current_window() {
                print_window(window);
            }
        }
        "first" | "prev" | "previous" | "next" | "last" => {
            let request = command.parse().map_err(anyhow::Error::msg)?;
            let window = browser.lock().page(request)?;
            print_window(&window);
        }
        "search" => {
            let column = parts
                .next()
                .ok_or_else(|| anyhow::anyhow!("usage: search <column> <op> <value>"))?;
            let op: FilterOp = parts
                .next()
                .ok_or_else(|| anyhow::anyhow!("usage: search <column> <op> <value>"))?
                .parse()
                .map_err(anyhow::Error::msg)?;
            let value = parts.collect::<Vec<_>>().join(" ");
            if value.is_empty() {
                anyhow::bail!("usage: search <column> <op> <value>");
            }
            match browser.lock().search(column, op, &value)? {
                SearchOutcome::Window(window) => print_window(&window),
                SearchOutcome::NoResults => println!("no results found"),
            }
        }
        "info" => {
            let browser = browser.lock();
            let summary = browser
                .summary()
                .ok_or_else(|| anyhow::anyhow!("no file loaded"))?;
            println!("{}", summary.describe());
        }
        "stats" => {
            // reports stream in as the background pass finishes each column
            let receiver = browser.lock().column_overview()?;
            println!("{:<24} {:>10} {:>12}", "column", "coverage", "uniqueness");
            for report in receiver {
                match report.outcome {
                    ColumnOutcome::NoData => {
                        println!("{:<24} {:>10} {:>12}", report.column, "-", "no data");
                    }
                    ColumnOutcome::FullyUnique { coverage } => {
                        println!(
                            "{:<24} {:>9.1}% {:>12}",
                            report.column,
                            coverage * 100.0,
                            "unique"
                        );
                    }
                    ColumnOutcome::Measured {
                        coverage,
                        uniqueness,
                    } => {
                        println!(
                            "{:<24} {:>9.1}% {:>11.1}%",
                            report.column,
                            coverage * 100.0,
                            uniqueness * 100.0
                        );
                    }
                    ColumnOutcome::Unavailable { attempts } => {
                        println!(
                            "{:<24} {:>10} failed after {attempts} attempts",
                            report.column, "-"
                        );
                    }
                }
            }
        }
        "show" => {
            let browser = browser.lock();
            let window = browser
                .current_window()
                .ok_or_else(|| anyhow::anyhow!("no file loaded"))?;
            print_window(window);
        }
        other => anyhow::bail!("unknown command '{other}' (try 'help')"),
    }
    Ok(())
}

fn print_help() {
    println!("commands:");
    println!("  open <path>                 load a csv, json, parquet, or sqlite file");
    println!("  first | prev | next | last  page through the table");
    println!("  search <column> <op> <val>  filter; op is exact, contains, prefix, or suffix");
    println!("  show                        reprint the current window");
    println!("  info                        file summary");
    println!("  stats                       per-column coverage and uniqueness");
    println!("  quit                        leave");
}

fn print_window(window: &RenderedWindow) {
    let mut widths: Vec<usize> = window.columns.iter().map(|c| c.len()).collect();
    for row in &window.rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.len()).min(MAX_CELL_WIDTH);
        }
    }
    let label_width = window
        .row_labels
        .last()
        .map(|label| label.to_string().len())
        .unwrap_or(1);

    print!("{:>label_width$} ", "#");
    for (name, width) in window.columns.iter().zip(&widths) {
        print!(" {:<width$}", clip(name), width = width);
    }
    println!();

    for (label, row) in window.row_labels.iter().zip(&window.rows) {
        print!("{label:>label_width$} ");
        for (cell, width) in row.iter().zip(&widths) {
            print!(" {:<width$}", clip(cell), width = width);
        }
        println!();
    }

    let c = window.controls;
    let nav: Vec<&str> = [
        ("first", c.first),
        ("prev", c.prev),
        ("next", c.next),
        ("last", c.last),
    ]
    .iter()
    .filter(|(_, enabled)| *enabled)
    .map(|(name, _)| *name)
    .collect();
    let mode = if window.filtered { " (filtered)" } else { "" };
    println!(
        "rows {}..{}{mode}  nav: {}",
        window.offset + 1,
        window.offset + window.rows.len() as u64,
        nav.join(" ")
    );
}

fn clip(text: &str) -> String {
    if text.chars().count() <= MAX_CELL_WIDTH {
        text.to_string()
    } else {
        let head: String = text.chars().take(MAX_CELL_WIDTH - 1).collect();
        format!("{head}\u{2026}")
    }
}
