//! In-memory edge sources: a fixed adjacency map, and one that refuses to
//! fetch anything (cache-only replays).

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::EdgeSource;
use crate::error::FetchError;
use crate::graph::cancel::CancelToken;
use crate::types::FetchedEdges;

// ---------------------------------------------------------------------------
// StaticEdgeSource
// ---------------------------------------------------------------------------

/// Serves edge sets from a fixed map and counts every fetch per page.
///
/// Pages absent from the map answer [`FetchedEdges::missing_page`]; pages
/// registered with [`StaticEdgeSource::fail`] fail with the given error.
#[derive(Debug, Default)]
pub struct StaticEdgeSource {
    graph: HashMap<String, Result<FetchedEdges, FetchError>>,
    calls: Mutex<HashMap<String, usize>>,
    total: AtomicUsize,
}

impl StaticEdgeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(page, links)` pairs.
    pub fn from_edges<I, P, L>(edges: I) -> Self
    where
        I: IntoIterator<Item = (P, L)>,
        P: Into<String>,
        L: IntoIterator,
        L::Item: Into<String>,
    {
        let mut source = Self::new();
        for (page, links) in edges {
            source = source.with_page(page, links);
        }
        source
    }

    pub fn with_page<P, L>(mut self, page: P, links: L) -> Self
    where
        P: Into<String>,
        L: IntoIterator,
        L::Item: Into<String>,
    {
        let links = links.into_iter().map(Into::into).collect();
        self.graph.insert(page.into(), Ok(FetchedEdges::new(links)));
        self
    }

    /// Make every fetch of `page` fail with `error`.
    pub fn fail(mut self, page: impl Into<String>, error: FetchError) -> Self {
        self.graph.insert(page.into(), Err(error));
        self
    }

    /// Replace the answer for `page` wholesale.
    pub fn with_response(mut self, page: impl Into<String>, response: FetchedEdges) -> Self {
        self.graph.insert(page.into(), Ok(response));
        self
    }

    /// How many times `page` was fetched.
    pub fn calls_for(&self, page: &str) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(page)
            .copied()
            .unwrap_or(0)
    }

    /// Total fetches across all pages.
    pub fn total_calls(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }
}

impl EdgeSource for StaticEdgeSource {
    fn fetch(&self, page: &str, cancel: &CancelToken) -> Result<FetchedEdges, FetchError> {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        self.total.fetch_add(1, Ordering::Relaxed);
        *self
            .calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(page.to_string())
            .or_insert(0) += 1;
        self.graph
            .get(page)
            .cloned()
            .unwrap_or_else(|| Ok(FetchedEdges::missing_page()))
    }
}

// ---------------------------------------------------------------------------
// OfflineEdgeSource
// ---------------------------------------------------------------------------

/// Edge source for cache-only runs: every fetch fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineEdgeSource;

impl EdgeSource for OfflineEdgeSource {
    fn fetch(&self, page: &str, _cancel: &CancelToken) -> Result<FetchedEdges, FetchError> {
        Err(FetchError::Transport(format!(
            "offline mode: {page} is not in the cache"
        )))
    }

    fn is_remote(&self) -> bool {
        false
    }
}
