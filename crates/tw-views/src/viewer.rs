//! Registry adapter for the table browser.

use std::sync::Arc;

use parking_lot::Mutex;
use tw_core::{HostContext, Viewer};

use crate::browser::TableBrowser;
use crate::config::BrowserConfig;

/// Wraps a [`TableBrowser`] as a registrable [`Viewer`].
///
/// The browser sits behind an `Arc<Mutex<..>>` so the shell can keep a
/// handle for routing commands while the registry owns the viewer.
pub struct TableViewer {
    browser: Arc<Mutex<TableBrowser>>,
}

impl TableViewer {
    pub fn new(config: BrowserConfig) -> Self {
        Self::with_browser(Arc::new(Mutex::new(TableBrowser::new(config))))
    }

    pub fn with_browser(browser: Arc<Mutex<TableBrowser>>) -> Self {
        Self { browser }
    }

    pub fn browser(&self) -> Arc<Mutex<TableBrowser>> {
        Arc::clone(&self.browser)
    }
}

impl Viewer for TableViewer {
    fn name(&self) -> &str {
        "Table Viewer"
    }

    fn start(&mut self, host: &HostContext) -> anyhow::Result<()> {
        self.browser.lock().set_status(Arc::clone(&host.status));
        host.status.status("Table Viewer ready");
        Ok(())
    }

    fn stop(&mut self) -> anyhow::Result<()> {
        self.browser.lock().unload();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_discards_the_session() {
        let browser = Arc::new(Mutex::new(TableBrowser::new(BrowserConfig::default())));
        let mut viewer = TableViewer::with_browser(Arc::clone(&browser));
        viewer.start(&HostContext::default()).unwrap();
        viewer.stop().unwrap();
        assert!(!browser.lock().is_loaded());
    }
}
