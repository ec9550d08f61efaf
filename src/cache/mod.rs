//! Adjacency cache: remembers a page's out-links across runs.
//!
//! The traversal engine only ever calls [`AdjacencyCache::lookup`] and
//! [`AdjacencyCache::store`]. Whether an entry is stale, and what happens to
//! an existing row on a second store, is up to the implementation.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryLinkCache;
pub use sqlite::{CacheStats, SqliteLinkCache};

use crate::error::CacheError;
use crate::types::CacheEntry;

/// Persistent mapping from page title to (out-links, fetch timestamp).
///
/// Implementations must be shareable across worker threads.
pub trait AdjacencyCache: Send + Sync {
    /// Return the cached entry for `page`, or `None` if it was never fetched
    /// (or the implementation considers it stale).
    fn lookup(&self, page: &str) -> Result<Option<CacheEntry>, CacheError>;

    /// Record `links` as the out-links of `page`, fetched at `timestamp`.
    fn store(&self, page: &str, links: &[String], timestamp: i64) -> Result<(), CacheError>;
}
