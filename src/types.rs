//! Core domain types shared by the engine, the cache and the reporters.

use serde::{Deserialize, Serialize};

/// Out-edges of one page, in the order the source returned them.
///
/// Duplicates are kept; the engine never relies on uniqueness.
pub type EdgeSet = Vec<String>;

// ---------------------------------------------------------------------------
// CacheEntry
// ---------------------------------------------------------------------------

/// A page's cached out-edges together with the time they were fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub page: String,
    pub links: EdgeSet,
    /// Unix epoch seconds.
    pub timestamp: i64,
}

// ---------------------------------------------------------------------------
// FetchedEdges
// ---------------------------------------------------------------------------

/// Successful answer from an edge source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedEdges {
    pub links: EdgeSet,
    /// The source signalled more links than fit in one response.
    pub has_more: bool,
    /// The page exists but the response carried no `links` field.
    pub links_missing: bool,
    /// The page does not exist. `links` is empty and is cached like any
    /// other answer.
    pub page_missing: bool,
}

impl FetchedEdges {
    pub fn new(links: EdgeSet) -> Self {
        Self {
            links,
            has_more: false,
            links_missing: false,
            page_missing: false,
        }
    }

    /// Answer for a page the wiki does not have.
    pub fn missing_page() -> Self {
        Self {
            page_missing: true,
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// TraversalParams
// ---------------------------------------------------------------------------

/// What to search for: start page, page to find links back to, and how deep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraversalParams {
    pub root: String,
    pub target: String,
    pub max_depth: u32,
}

impl TraversalParams {
    /// Search for routes leading back to `root` itself.
    pub fn returning_to_root(root: impl Into<String>, max_depth: u32) -> Self {
        let root = root.into();
        Self {
            target: root.clone(),
            root,
            max_depth,
        }
    }

    pub fn new(root: impl Into<String>, target: impl Into<String>, max_depth: u32) -> Self {
        Self {
            root: root.into(),
            target: target.into(),
            max_depth,
        }
    }
}

// ---------------------------------------------------------------------------
// FoundRoute
// ---------------------------------------------------------------------------

/// A route whose last page links to the target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FoundRoute {
    /// Pages from the root (index 0) to the page that links to the target.
    pub route: Vec<String>,
    /// Hops from the root to the last page of `route`.
    pub depth: usize,
    /// Depth budget that was left when the route was found.
    pub remaining: u32,
}

impl FoundRoute {
    /// The page whose out-edges contain the target.
    pub fn last(&self) -> Option<&str> {
        self.route.last().map(String::as_str)
    }
}

impl std::fmt::Display for FoundRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[depth {}] {}", self.depth, self.route.join(" -> "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returning_to_root_sets_target() {
        let params = TraversalParams::returning_to_root("Python (programming language)", 2);
        assert_eq!(params.root, params.target);
        assert_eq!(params.max_depth, 2);
    }

    #[test]
    fn found_route_display_joins_titles() {
        let found = FoundRoute {
            route: vec!["A".into(), "B".into()],
            depth: 1,
            remaining: 1,
        };
        assert_eq!(found.to_string(), "[depth 1] A -> B");
        assert_eq!(found.last(), Some("B"));
    }

    #[test]
    fn found_route_json_shape() {
        let found = FoundRoute {
            route: vec!["X".into()],
            depth: 0,
            remaining: 0,
        };
        let json = serde_json::to_value(&found).unwrap();
        assert_eq!(json["route"][0], "X");
        assert_eq!(json["depth"], 0);
    }
}
