//! depthcharge: depth-bounded wiki link traversal.
//!
//! Starting from a root page, explores every page within a fixed number of
//! link hops and reports each route whose last page links to a target
//! (by default the root itself). Link lists come from a MediaWiki API and
//! are cached in SQLite so repeated runs stay off the network.

pub mod cache;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod graph;
pub mod observability;
pub mod report;
pub mod source;
pub mod types;
