//! In-memory adjacency cache for offline runs and tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::AdjacencyCache;
use crate::error::CacheError;
use crate::types::CacheEntry;

/// Append-only map from page to cached entry, with lookup/store counters.
#[derive(Debug, Default)]
pub struct MemoryLinkCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    lookups: AtomicUsize,
    stores: AtomicUsize,
}

impl MemoryLinkCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate the cache from `(page, links)` pairs, timestamped 0.
    pub fn with_entries<I, P, L>(entries: I) -> Self
    where
        I: IntoIterator<Item = (P, L)>,
        P: Into<String>,
        L: IntoIterator,
        L::Item: Into<String>,
    {
        let map = entries
            .into_iter()
            .map(|(page, links)| {
                let page = page.into();
                let entry = CacheEntry {
                    page: page.clone(),
                    links: links.into_iter().map(Into::into).collect(),
                    timestamp: 0,
                };
                (page, entry)
            })
            .collect();
        Self {
            entries: Mutex::new(map),
            ..Self::default()
        }
    }

    /// Number of `lookup` calls so far.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }

    /// Number of `store` calls so far.
    pub fn store_count(&self) -> usize {
        self.stores.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, page: &str) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(page)
    }
}

impl AdjacencyCache for MemoryLinkCache {
    fn lookup(&self, page: &str) -> Result<Option<CacheEntry>, CacheError> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(page).cloned())
    }

    fn store(&self, page: &str, links: &[String], timestamp: i64) -> Result<(), CacheError> {
        self.stores.fetch_add(1, Ordering::Relaxed);
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.entry(page.to_string()).or_insert_with(|| CacheEntry {
            page: page.to_string(),
            links: links.to_vec(),
            timestamp,
        });
        Ok(())
    }
}
