//! Edge sources: where a page's out-links come from on a cache miss.

pub mod memory;
pub mod wiki;

pub use memory::{OfflineEdgeSource, StaticEdgeSource};
pub use wiki::{WikiEdgeSource, WikiSourceConfig};

use crate::error::FetchError;
use crate::graph::cancel::CancelToken;
use crate::types::FetchedEdges;

/// Fetches the out-links of a single page.
///
/// The engine treats every `Err` the same way: an empty edge set for that
/// page plus a diagnostic. `FetchError::Cancelled` is the one exception and
/// stops the run instead.
pub trait EdgeSource: Send + Sync {
    fn fetch(&self, page: &str, cancel: &CancelToken) -> Result<FetchedEdges, FetchError>;

    /// Whether a fetch goes to the wiki. Non-remote fetches skip the rate
    /// limiter and are not counted in `RunStats::fetches`.
    fn is_remote(&self) -> bool {
        true
    }
}
