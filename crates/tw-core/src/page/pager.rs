//! Pagination controller

use parking_lot::RwLock;
use tracing::debug;

use super::{Affordances, LastPage, PageOutcome, PagePhase, PageRequest};

#[derive(Debug, Clone)]
struct PagerState {
    offset: u64,
    total_rows: u64,
    controls: Affordances,
}

/// Owns the current window offset and enforces navigation bounds.
///
/// Each browser session owns its own pager; window size and total row
/// count are fixed for the lifetime of a session and only the pager
/// mutates the offset. Rejected requests are logged and change nothing.
pub struct Pager {
    state: RwLock<PagerState>,
    window_size: u64,
    last_page: LastPage,
}

impl Pager {
    /// Create a pager for the given window size with all affordances
    /// disabled (no data loaded yet).
    ///
    /// `window_size` must be positive; a zero size is clamped to 1.
    pub fn new(window_size: u64, last_page: LastPage) -> Self {
        let state = PagerState {
            offset: 0,
            total_rows: 0,
            controls: Affordances::default(),
        };

        Self {
            state: RwLock::new(state),
            window_size: window_size.max(1),
            last_page,
        }
    }

    /// Reset for a freshly loaded source: offset back to 0, the new total
    /// row count installed, and every affordance enabled.
    pub fn reset(&self, total_rows: u64) {
        let mut state = self.state.write();
        state.offset = 0;
        state.total_rows = total_rows;
        state.controls = Affordances::all_enabled();
    }

    /// Enable all four affordances
    pub fn activate(&self) {
        self.state.write().controls = Affordances::all_enabled();
    }

    /// Disable all four affordances (no source, or one being replaced)
    pub fn deactivate(&self) {
        self.state.write().controls = Affordances::default();
    }

    /// Apply a navigation request.
    ///
    /// Successful transitions return the new offset so the caller can
    /// reload the window. Requests whose precondition fails are rejected
    /// without any state change.
    pub fn request(&self, request: PageRequest) -> PageOutcome {
        let mut state = self.state.write();
        match request {
            PageRequest::First => {
                state.offset = 0;
                state.controls.first = false;
                state.controls.prev = false;
                let single_page = state.total_rows <= self.window_size;
                state.controls.next = !single_page;
                state.controls.last = !single_page;
                PageOutcome::Moved(0)
            }
            PageRequest::Prev => {
                if state.offset < self.window_size {
                    debug!(offset = state.offset, "cannot go back any further");
                    return PageOutcome::Rejected;
                }
                state.offset -= self.window_size;
                state.controls.next = true;
                state.controls.last = true;
                PageOutcome::Moved(state.offset)
            }
            PageRequest::Next => {
                if state.offset + self.window_size >= state.total_rows {
                    debug!(offset = state.offset, "cannot go forward any further");
                    return PageOutcome::Rejected;
                }
                state.offset += self.window_size;
                state.controls.first = true;
                state.controls.prev = true;
                PageOutcome::Moved(state.offset)
            }
            PageRequest::Last => {
                if state.total_rows < self.window_size {
                    debug!(
                        total_rows = state.total_rows,
                        "cannot go to last page"
                    );
                    state.controls.next = false;
                    state.controls.last = false;
                    return PageOutcome::Rejected;
                }
                state.offset = match self.last_page {
                    LastPage::FullWindow => state.total_rows - self.window_size,
                    LastPage::Partial => {
                        (state.total_rows - 1) / self.window_size * self.window_size
                    }
                };
                state.controls.first = true;
                state.controls.prev = true;
                state.controls.next = false;
                state.controls.last = false;
                PageOutcome::Moved(state.offset)
            }
        }
    }

    /// Current window offset
    pub fn offset(&self) -> u64 {
        self.state.read().offset
    }

    pub fn window_size(&self) -> u64 {
        self.window_size
    }

    pub fn total_rows(&self) -> u64 {
        self.state.read().total_rows
    }

    /// Current affordance enablement
    pub fn controls(&self) -> Affordances {
        self.state.read().controls
    }

    /// Derive the phase from the current offset and bounds
    pub fn phase(&self) -> PagePhase {
        let state = self.state.read();
        if state.total_rows <= self.window_size {
            PagePhase::SinglePage
        } else if state.offset == 0 {
            PagePhase::AtFirst
        } else if state.offset + self.window_size >= state.total_rows {
            PagePhase::AtLast
        } else {
            PagePhase::Middle
        }
    }
}
