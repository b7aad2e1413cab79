//! Windowed relation cache
//!
//! Memoizes prepared relations keyed by (source path, window size,
//! offset) so revisiting a window never re-issues the query. Unbounded by
//! default (the cache lives for one file session and is reset on load),
//! with an optional LRU bound for long-running sessions.

use std::path::PathBuf;
use std::sync::Arc;

use ahash::AHashMap;
use tracing::trace;

use crate::engine::Relation;
use crate::BrowseError;

/// Cache key for one visited window
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WindowKey {
    pub path: PathBuf,
    pub window_size: u64,
    pub offset: u64,
}

impl WindowKey {
    pub fn new(path: impl Into<PathBuf>, window_size: u64, offset: u64) -> Self {
        Self { path: path.into(), window_size, offset }
    }
}

pub struct RelationCache {
    entries: AHashMap<WindowKey, Arc<dyn Relation>>,
    /// LRU tracking, least recent first; only maintained when bounded
    access_order: Vec<WindowKey>,
    max_entries: Option<usize>,
}

impl RelationCache {
    /// Unbounded cache (grows with distinct windows visited)
    pub fn new() -> Self {
        Self::with_bound(None)
    }

    /// Cache evicting the least recently used entry beyond `max_entries`
    pub fn bounded(max_entries: usize) -> Self {
        Self::with_bound(Some(max_entries.max(1)))
    }

    fn with_bound(max_entries: Option<usize>) -> Self {
        Self {
            entries: AHashMap::new(),
            access_order: Vec::new(),
            max_entries,
        }
    }

    /// Return the cached relation for `key`, or invoke `factory` exactly
    /// once, store its result, and return it. A factory error is
    /// propagated and nothing is stored.
    pub fn get_or_create<F>(
        &mut self,
        key: WindowKey,
        factory: F,
    ) -> Result<Arc<dyn Relation>, BrowseError>
    where
        F: FnOnce() -> Result<Arc<dyn Relation>, BrowseError>,
    {
        if let Some(relation) = self.entries.get(&key) {
            trace!(?key, "relation cache hit");
            let relation = Arc::clone(relation);
            self.touch(&key);
            return Ok(relation);
        }

        trace!(?key, "relation cache miss");
        let relation = factory()?;

        if let Some(max) = self.max_entries {
            while self.entries.len() >= max {
                let oldest = self.access_order.remove(0);
                self.entries.remove(&oldest);
            }
        }

        self.entries.insert(key.clone(), Arc::clone(&relation));
        self.access_order.push(key);
        Ok(relation)
    }

    fn touch(&mut self, key: &WindowKey) {
        if self.max_entries.is_some() {
            if let Some(pos) = self.access_order.iter().position(|k| k == key) {
                let key = self.access_order.remove(pos);
                self.access_order.push(key);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry (new file loaded)
    pub fn clear(&mut self) {
        self.entries.clear();
        self.access_order.clear();
    }
}

impl Default for RelationCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::record_batch::RecordBatch;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubRelation {
        columns: Vec<String>,
    }

    impl Relation for StubRelation {
        fn columns(&self) -> &[String] {
            &self.columns
        }

        fn materialize(&self) -> Result<RecordBatch, BrowseError> {
            Err(BrowseError::Query("stub".to_string()))
        }
    }

    fn stub() -> Arc<dyn Relation> {
        Arc::new(StubRelation { columns: vec!["a".to_string()] })
    }

    fn key(offset: u64) -> WindowKey {
        WindowKey::new("/tmp/file.csv", 100, offset)
    }

    #[test]
    fn factory_runs_exactly_once_per_key() {
        let calls = AtomicUsize::new(0);
        let mut cache = RelationCache::new();

        for _ in 0..2 {
            cache
                .get_or_create(key(0), || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(stub())
                })
                .unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn distinct_keys_get_distinct_entries() {
        let mut cache = RelationCache::new();
        cache.get_or_create(key(0), || Ok(stub())).unwrap();
        cache.get_or_create(key(100), || Ok(stub())).unwrap();
        let other_size = WindowKey::new("/tmp/file.csv", 50, 0);
        cache.get_or_create(other_size, || Ok(stub())).unwrap();
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn factory_error_is_not_cached() {
        let mut cache = RelationCache::new();
        let result = cache.get_or_create(key(0), || Err(BrowseError::Query("down".to_string())));
        assert!(result.is_err());
        assert!(cache.is_empty());

        // a later attempt for the same key runs the factory again
        cache.get_or_create(key(0), || Ok(stub())).unwrap();
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn bounded_cache_evicts_least_recently_used() {
        let mut cache = RelationCache::bounded(2);
        cache.get_or_create(key(0), || Ok(stub())).unwrap();
        cache.get_or_create(key(100), || Ok(stub())).unwrap();

        // refresh key(0) so key(100) becomes the eviction candidate
        cache.get_or_create(key(0), || panic!("cached")).unwrap();
        cache.get_or_create(key(200), || Ok(stub())).unwrap();

        assert_eq!(cache.len(), 2);
        let miss = AtomicUsize::new(0);
        cache
            .get_or_create(key(100), || {
                miss.fetch_add(1, Ordering::SeqCst);
                Ok(stub())
            })
            .unwrap();
        assert_eq!(miss.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn clear_resets_the_session() {
        let mut cache = RelationCache::new();
        cache.get_or_create(key(0), || Ok(stub())).unwrap();
        cache.clear();
        assert!(cache.is_empty());
    }
}
