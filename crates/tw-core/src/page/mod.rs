use serde::{Deserialize, Serialize};

mod pager;

pub use pager::Pager;

/// The four navigation actions a window can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageRequest {
    /// Jump to the first window
    First,
    /// Step back by exactly one window
    Prev,
    /// Step forward by exactly one window
    Next,
    /// Jump to the final window
    Last,
}

impl std::str::FromStr for PageRequest {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "first" => Ok(PageRequest::First),
            "prev" | "previous" => Ok(PageRequest::Prev),
            "next" => Ok(PageRequest::Next),
            "last" => Ok(PageRequest::Last),
            other => Err(format!("unknown page request '{}'", other)),
        }
    }
}

/// How the final window is aligned when the row count is not a multiple
/// of the window size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LastPage {
    /// Always show a full window: `offset = total_rows - window_size`.
    /// The final window may overlap rows already seen on the prior page.
    #[default]
    FullWindow,
    /// Align to the window grid and show a partial final page:
    /// `offset = (total_rows - 1) / window_size * window_size`.
    Partial,
}

/// Enablement flags for the four navigation affordances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Affordances {
    pub first: bool,
    pub prev: bool,
    pub next: bool,
    pub last: bool,
}

impl Affordances {
    /// All four affordances enabled
    pub fn all_enabled() -> Self {
        Self { first: true, prev: true, next: true, last: true }
    }
}

/// Where the current offset sits relative to the dataset.
///
/// Derived from `(offset, window_size, total_rows)` on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagePhase {
    /// The whole dataset fits in one window
    SinglePage,
    AtFirst,
    Middle,
    AtLast,
}

/// Result of a navigation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// The transition succeeded; the new offset should be reloaded
    Moved(u64),
    /// The precondition failed; nothing changed
    Rejected,
}

impl PageOutcome {
    pub fn moved(&self) -> Option<u64> {
        match self {
            PageOutcome::Moved(offset) => Some(*offset),
            PageOutcome::Rejected => None,
        }
    }
}
