//! Core functionality for the tabwalk table browser
//!
//! This crate provides the pagination state machine and the viewer
//! capability interface that the host shell composes.

pub mod page;
pub mod viewer;

// Re-export commonly used types
pub use page::{Affordances, LastPage, PageOutcome, PagePhase, PageRequest, Pager};
pub use viewer::{
    ActiveViewer, HostContext, NullStatusSink, StatusSink, Viewer, ViewerRegistry,
};
