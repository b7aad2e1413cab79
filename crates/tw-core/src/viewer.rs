//! Viewer capability interface and registry
//!
//! The shell hosts pluggable viewer panels. Rather than scanning a
//! directory and instantiating anything that looks like a plugin, viewers
//! are registered explicitly at startup as typed factory closures and
//! activated by name. Only one viewer session runs at a time.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use tracing::{debug, warn};

/// Sink for transient progress messages (the shell's status bar)
pub trait StatusSink: Send + Sync {
    fn status(&self, message: &str);
}

/// Status sink that discards every message
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStatusSink;

impl StatusSink for NullStatusSink {
    fn status(&self, _message: &str) {}
}

/// Services the shell provides to a running viewer
#[derive(Clone)]
pub struct HostContext {
    pub status: Arc<dyn StatusSink>,
}

impl HostContext {
    pub fn new(status: Arc<dyn StatusSink>) -> Self {
        Self { status }
    }
}

impl Default for HostContext {
    fn default() -> Self {
        Self { status: Arc::new(NullStatusSink) }
    }
}

/// Capability interface every viewer panel implements
pub trait Viewer: Send {
    /// Human-readable viewer name
    fn name(&self) -> &str;

    /// Called when the shell mounts the viewer
    fn start(&mut self, host: &HostContext) -> anyhow::Result<()>;

    /// Called when the shell unmounts the viewer; must release the
    /// session state the viewer holds
    fn stop(&mut self) -> anyhow::Result<()>;
}

type ViewerFactory = Box<dyn Fn() -> Box<dyn Viewer> + Send + Sync>;

/// Explicit registry of viewer factories, populated at startup.
///
/// Activation is mutually exclusive: a second `activate` call fails until
/// the previously returned [`ActiveViewer`] guard is dropped.
pub struct ViewerRegistry {
    factories: IndexMap<String, ViewerFactory>,
    active: Arc<Mutex<Option<String>>>,
}

impl ViewerRegistry {
    pub fn new() -> Self {
        Self {
            factories: IndexMap::new(),
            active: Arc::new(Mutex::new(None)),
        }
    }

    /// Register a viewer factory under a unique key
    pub fn register<F>(&mut self, key: &str, factory: F)
    where
        F: Fn() -> Box<dyn Viewer> + Send + Sync + 'static,
    {
        if self.factories.insert(key.to_string(), Box::new(factory)).is_some() {
            warn!(key, "viewer factory replaced an existing registration");
        }
    }

    /// Registered viewer keys, in registration order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Instantiate and start the named viewer.
    ///
    /// Fails if the key is unknown, another viewer is already active, or
    /// the viewer's `start` fails. The returned guard stops the viewer
    /// and releases the activation slot on drop.
    pub fn activate(&self, key: &str, host: &HostContext) -> anyhow::Result<ActiveViewer> {
        let factory = self
            .factories
            .get(key)
            .ok_or_else(|| anyhow::anyhow!("no viewer registered under '{}'", key))?;

        {
            let mut active = self.active.lock();
            if let Some(running) = active.as_deref() {
                anyhow::bail!("viewer '{}' is already active", running);
            }
            *active = Some(key.to_string());
        }

        let mut viewer = factory();
        if let Err(e) = viewer.start(host) {
            *self.active.lock() = None;
            return Err(e);
        }
        debug!(key, name = viewer.name(), "viewer activated");

        Ok(ActiveViewer {
            viewer,
            slot: Arc::clone(&self.active),
        })
    }
}

impl Default for ViewerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard over the single running viewer session
pub struct ActiveViewer {
    viewer: Box<dyn Viewer>,
    slot: Arc<Mutex<Option<String>>>,
}

impl ActiveViewer {
    pub fn name(&self) -> &str {
        self.viewer.name()
    }
}

impl std::fmt::Debug for ActiveViewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveViewer")
            .field("name", &self.viewer.name())
            .finish_non_exhaustive()
    }
}

impl Drop for ActiveViewer {
    fn drop(&mut self) {
        if let Err(e) = self.viewer.stop() {
            warn!(error = %e, name = self.viewer.name(), "viewer failed to stop cleanly");
        }
        *self.slot.lock() = None;
    }
}
