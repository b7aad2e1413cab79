//! The table browser: load, page, search.

use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;
use std::sync::Arc;

use arrow::array::RecordBatch;
use arrow::util::display::array_value_to_string;
use tracing::{debug, info};
use tw_core::{
    Affordances, NullStatusSink, PageOutcome, PagePhase, PageRequest, Pager, StatusSink,
};
use tw_data::{
    BrowseError, FilterOp, QueryEngine, QueryFacade, RelationCache, SqliteEngine, WindowKey,
};

use crate::config::BrowserConfig;
use crate::overview::{self, ColumnReport};
use crate::summary::FileSummary;

/// One page of the table, rendered to strings.
#[derive(Debug, Clone)]
pub struct RenderedWindow {
    pub columns: Vec<String>,
    /// Row-major cell text; nulls render as the empty string.
    pub rows: Vec<Vec<String>>,
    /// 1-based absolute row numbers, `offset + i + 1`.
    pub row_labels: Vec<u64>,
    pub offset: u64,
    pub controls: Affordances,
    /// True when this window came from a search rather than plain paging.
    pub filtered: bool,
}

/// What a search produced.
#[derive(Debug, Clone)]
pub enum SearchOutcome {
    /// First window of the matching rows.
    Window(RenderedWindow),
    /// Nothing matched; the previous grid is untouched.
    NoResults,
}

struct Session {
    path: PathBuf,
    facade: QueryFacade,
    cache: RelationCache,
    pager: Pager,
    columns: Vec<String>,
    total_rows: u64,
    summary: FileSummary,
    current: RenderedWindow,
}

/// Paging front end over a single tabular file.
///
/// Starts empty; `load` swaps in a session for one file at a time.
/// All state is owned here, so independent browsers never share
/// counters or caches.
pub struct TableBrowser {
    config: BrowserConfig,
    status: Arc<dyn StatusSink>,
    session: Option<Session>,
}

impl TableBrowser {
    pub fn new(config: BrowserConfig) -> Self {
        Self {
            config,
            status: Arc::new(NullStatusSink),
            session: None,
        }
    }

    pub fn set_status(&mut self, status: Arc<dyn StatusSink>) {
        self.status = status;
    }

    pub fn is_loaded(&self) -> bool {
        self.session.is_some()
    }

    pub fn summary(&self) -> Option<&FileSummary> {
        self.session.as_ref().map(|s| &s.summary)
    }

    pub fn columns(&self) -> Option<&[String]> {
        self.session.as_ref().map(|s| s.columns.as_slice())
    }

    pub fn current_window(&self) -> Option<&RenderedWindow> {
        self.session.as_ref().map(|s| &s.current)
    }

    pub fn phase(&self) -> Option<PagePhase> {
        self.session.as_ref().map(|s| s.pager.phase())
    }

    /// Opens `path` and renders its first window. The previous session,
    /// if any, is replaced only after the new file loads successfully.
    pub fn load(&mut self, path: &Path) -> Result<Vec<String>, BrowseError> {
        let engine = SqliteEngine::open(path)?;
        self.attach(Arc::new(engine))
    }

    /// Same as [`load`](Self::load), over an already-open engine.
    pub fn attach(&mut self, engine: Arc<dyn QueryEngine>) -> Result<Vec<String>, BrowseError> {
        self.config.validate()?;
        self.status.status("Begin loading file");

        let path = engine.source_path().to_path_buf();
        let mut facade = QueryFacade::new(engine);
        let columns = facade.column_names()?;
        let total_rows = facade.row_count()?;

        let pager = Pager::new(self.config.window_size, self.config.last_page);
        pager.reset(total_rows);
        let mut cache = match self.config.cache_entries {
            Some(max) => RelationCache::bounded(max),
            None => RelationCache::new(),
        };
        let current = render_window(&facade, &mut cache, &path, &pager, 0)?;
        let summary = FileSummary::collect(&path, total_rows, columns.clone());

        info!(
            path = %path.display(),
            total_rows,
            columns = columns.len(),
            "file loaded"
        );
        self.session = Some(Session {
            path,
            facade,
            cache,
            pager,
            columns: columns.clone(),
            total_rows,
            summary,
            current,
        });
        self.status.status("Ready");
        Ok(columns)
    }

    /// Discards the current session, if any.
    pub fn unload(&mut self) {
        if self.session.take().is_some() {
            debug!("browser session discarded");
        }
    }

    /// Handles a navigation request and returns the resulting window.
    ///
    /// A rejected request returns the current window unchanged. A
    /// successful move always re-renders from the unfiltered table, so
    /// paging away from a search result restores the plain view.
    pub fn page(&mut self, request: PageRequest) -> Result<RenderedWindow, BrowseError> {
        let session = self.session.as_mut().ok_or(BrowseError::NotLoaded)?;
        match session.pager.request(request) {
            PageOutcome::Moved(offset) => {
                self.status.status("Loading data");
                session.current = render_window(
                    &session.facade,
                    &mut session.cache,
                    &session.path,
                    &session.pager,
                    offset,
                )?;
                self.status.status("Ready");
            }
            PageOutcome::Rejected => {
                debug!(?request, "navigation rejected");
            }
        }
        Ok(session.current.clone())
    }

    /// Filters the table and shows the first window of matches.
    ///
    /// Filtered windows never touch the relation cache. A search with
    /// zero matches leaves the grid exactly as it was.
    pub fn search(
        &mut self,
        column: &str,
        op: FilterOp,
        value: &str,
    ) -> Result<SearchOutcome, BrowseError> {
        let session = self.session.as_mut().ok_or(BrowseError::NotLoaded)?;
        self.status.status("Searching");

        let matches = session.facade.filtered_count(column, op, value)?;
        if matches == 0 {
            info!(column, ?op, "search matched no rows");
            self.status.status("No results found");
            return Ok(SearchOutcome::NoResults);
        }

        let relation =
            session
                .facade
                .filtered_window(column, op, value, 0, session.pager.window_size())?;
        let batch = relation.materialize()?;
        // A search always lands on the first page.
        session.pager.request(PageRequest::First);
        let window = window_from_batch(&batch, 0, session.pager.controls(), true)?;
        session.current = window.clone();

        info!(column, ?op, matches, "search applied");
        self.status.status("Ready");
        Ok(SearchOutcome::Window(window))
    }

    /// Starts the background column overview and returns its report
    /// stream. See [`crate::overview`].
    pub fn column_overview(&self) -> Result<Receiver<ColumnReport>, BrowseError> {
        let session = self.session.as_ref().ok_or(BrowseError::NotLoaded)?;
        Ok(overview::spawn(
            Arc::clone(session.facade.engine()),
            session.columns.clone(),
            session.total_rows,
            self.config.sample_cap,
            self.config.retry,
        ))
    }
}

fn render_window(
    facade: &QueryFacade,
    cache: &mut RelationCache,
    path: &Path,
    pager: &Pager,
    offset: u64,
) -> Result<RenderedWindow, BrowseError> {
    let size = pager.window_size();
    let key = WindowKey::new(path, size, offset);
    let relation = cache.get_or_create(key, || facade.window(offset, size))?;
    let batch = relation.materialize()?;
    window_from_batch(&batch, offset, pager.controls(), false)
}

fn window_from_batch(
    batch: &RecordBatch,
    offset: u64,
    controls: Affordances,
    filtered: bool,
) -> Result<RenderedWindow, BrowseError> {
    let columns: Vec<String> = batch
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();

    let mut rows = Vec::with_capacity(batch.num_rows());
    let mut row_labels = Vec::with_capacity(batch.num_rows());
    for i in 0..batch.num_rows() {
        let mut cells = Vec::with_capacity(batch.num_columns());
        for array in batch.columns() {
            if array.is_null(i) {
                cells.push(String::new());
            } else {
                cells.push(array_value_to_string(array, i)?);
            }
        }
        rows.push(cells);
        row_labels.push(offset + i as u64 + 1);
    }

    Ok(RenderedWindow {
        columns,
        rows,
        row_labels,
        offset,
        controls,
        filtered,
    })
}
