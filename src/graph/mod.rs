//! Graph layer: depth-bounded traversal and the per-run state it relies on.

pub mod cancel;
pub mod exhaustion;
pub mod rate_limit;
pub mod route;
pub mod traversal;

pub use cancel::CancelToken;
pub use exhaustion::ExhaustionTracker;
pub use rate_limit::RateLimiter;
pub use route::Route;
pub use traversal::{TraversalEngine, TraversalOptions, TraversalOutcome, TraversalRun};
