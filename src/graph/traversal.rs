//! Depth-bounded route search over a link graph.
//!
//! Starting from a root page, every page within `max_depth` hops is expanded
//! and each route whose last page links to the target is reported. An
//! [`ExhaustionTracker`] remembers the largest depth budget each page has
//! been fully expanded with, so a page reached again with a smaller budget
//! is skipped without touching the cache or the edge source.
//!
//! Two drivers share the per-page logic in [`TraversalRun`]:
//! - [`TraversalRun::explore`] - sequential, an explicit stack of
//!   enter/exit frames in place of recursion.
//! - [`TraversalRun::explore_parallel`] - siblings fanned out over the
//!   current rayon pool. The exhaustion check and update may race here; the
//!   worst case is a page explored twice.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use rayon::prelude::*;

use super::cancel::CancelToken;
use super::exhaustion::ExhaustionTracker;
use super::rate_limit::RateLimiter;
use super::route::Route;
use crate::cache::AdjacencyCache;
use crate::error::{DepthChargeError, FetchError, Result};
use crate::observability::{RunCounters, RunStats};
use crate::report::{Diagnostic, DiagnosticKind, DiagnosticLog, RouteReporter};
use crate::source::EdgeSource;
use crate::types::{EdgeSet, FoundRoute, TraversalParams};

// ---------------------------------------------------------------------------
// Options and outcome
// ---------------------------------------------------------------------------

/// Engine tuning that does not change what is searched for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversalOptions {
    /// Minimum spacing between remote edge source calls, across all workers.
    pub delay: Duration,
    /// 1 runs the sequential driver; more runs the parallel one on a pool
    /// of this many threads.
    pub workers: usize,
    /// Edge sets longer than this are reported as oversized.
    pub oversize_threshold: usize,
}

impl Default for TraversalOptions {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(300),
            workers: 1,
            oversize_threshold: 5000,
        }
    }
}

/// Everything a finished (or cancelled) run produced besides its routes.
#[derive(Debug, Clone)]
pub struct TraversalOutcome {
    pub stats: RunStats,
    pub diagnostics: Vec<Diagnostic>,
    /// The run stopped early; routes reported before that are still valid.
    pub cancelled: bool,
    /// Pages with an exhaustion record when the run ended.
    pub exhausted_pages: usize,
}

// ---------------------------------------------------------------------------
// TraversalEngine
// ---------------------------------------------------------------------------

/// Long-lived traversal setup: where edges come from and where routes go.
///
/// Per-run state lives in [`TraversalRun`], created fresh by
/// [`TraversalEngine::begin`] or [`TraversalEngine::run`].
pub struct TraversalEngine<'a> {
    cache: &'a dyn AdjacencyCache,
    source: &'a dyn EdgeSource,
    reporter: &'a dyn RouteReporter,
    limiter: RateLimiter,
    options: TraversalOptions,
}

impl std::fmt::Debug for TraversalEngine<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraversalEngine")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<'a> TraversalEngine<'a> {
    pub fn new(
        cache: &'a dyn AdjacencyCache,
        source: &'a dyn EdgeSource,
        reporter: &'a dyn RouteReporter,
        options: TraversalOptions,
    ) -> Self {
        Self {
            cache,
            source,
            reporter,
            limiter: RateLimiter::new(options.delay),
            options,
        }
    }

    pub fn options(&self) -> &TraversalOptions {
        &self.options
    }

    /// Start a run with a fresh exhaustion tracker.
    pub fn begin<'r>(
        &'r self,
        params: &'r TraversalParams,
        cancel: &'r CancelToken,
    ) -> TraversalRun<'r, 'a> {
        TraversalRun {
            engine: self,
            target: &params.target,
            cancel,
            tracker: ExhaustionTracker::new(),
            diagnostics: DiagnosticLog::new(),
            counters: RunCounters::default(),
            cancelled: AtomicBool::new(false),
        }
    }

    /// Search from `params.root` and report every route back to
    /// `params.target`.
    ///
    /// Only a storage failure or a worker pool that cannot be built is an
    /// error; fetch problems end up in [`TraversalOutcome::diagnostics`].
    pub fn run(&self, params: &TraversalParams, cancel: &CancelToken) -> Result<TraversalOutcome> {
        let started = Instant::now();
        tracing::info!(
            root = %params.root,
            target = %params.target,
            max_depth = params.max_depth,
            workers = self.options.workers,
            "starting traversal"
        );

        let run = self.begin(params, cancel);
        let root = Route::start(&params.root);
        if self.options.workers > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.options.workers)
                .thread_name(|i| format!("depthcharge-{i}"))
                .build()
                .map_err(|e| DepthChargeError::ThreadPool(e.to_string()))?;
            pool.install(|| run.explore_parallel(params.max_depth, &params.root, root))?;
        } else {
            run.explore(params.max_depth, &params.root, root)?;
        }

        let outcome = run.finish(started.elapsed());
        tracing::info!(
            routes = outcome.stats.routes_found,
            expanded = outcome.stats.nodes_expanded,
            fetches = outcome.stats.fetches,
            pruned = outcome.stats.pruned,
            diagnostics = outcome.diagnostics.len(),
            cancelled = outcome.cancelled,
            elapsed_ms = outcome.stats.elapsed_ms,
            "traversal finished"
        );
        Ok(outcome)
    }
}

// ---------------------------------------------------------------------------
// TraversalRun
// ---------------------------------------------------------------------------

enum Frame {
    Enter {
        budget: u32,
        route: Route,
        /// Budget of the page that listed this one; `None` for the start.
        parent_budget: Option<u32>,
    },
    Exit {
        page: String,
        budget: u32,
    },
}

/// State scoped to a single traversal: exhaustion records, diagnostics and
/// counters.
pub struct TraversalRun<'r, 'a> {
    engine: &'r TraversalEngine<'a>,
    target: &'r str,
    cancel: &'r CancelToken,
    tracker: ExhaustionTracker,
    diagnostics: DiagnosticLog,
    counters: RunCounters,
    cancelled: AtomicBool,
}

impl TraversalRun<'_, '_> {
    /// Expand `node` (the last page of `route`) with `depth_budget` hops
    /// left, and everything below it, sequentially.
    ///
    /// `node` itself is expanded unconditionally; neighbors are subject to
    /// the root and exhaustion checks.
    pub fn explore(&self, depth_budget: u32, node: &str, route: Route) -> Result<()> {
        debug_assert_eq!(route.last(), node);
        let mut stack = vec![Frame::Enter {
            budget: depth_budget,
            route,
            parent_budget: None,
        }];

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Exit { page, budget } => {
                    self.tracker.record(&page, budget);
                }
                Frame::Enter {
                    budget,
                    route,
                    parent_budget,
                } => {
                    if let Some(parent_budget) = parent_budget {
                        if !self.tracker.should_expand(route.last(), parent_budget) {
                            RunCounters::bump(&self.counters.pruned);
                            continue;
                        }
                    }
                    let Some(links) = self.expand(budget, &route)? else {
                        return Ok(());
                    };

                    // Exit sits below the children, so it runs once they
                    // have all finished.
                    stack.push(Frame::Exit {
                        page: route.last().to_string(),
                        budget,
                    });
                    if budget > 0 {
                        for neighbor in links.iter().rev() {
                            if neighbor == route.root() {
                                continue;
                            }
                            stack.push(Frame::Enter {
                                budget: budget - 1,
                                route: route.extend(neighbor),
                                parent_budget: Some(budget),
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Like [`TraversalRun::explore`], but siblings run concurrently on the
    /// rayon pool this is called from.
    pub fn explore_parallel(&self, depth_budget: u32, node: &str, route: Route) -> Result<()> {
        debug_assert_eq!(route.last(), node);
        let Some(links) = self.expand(depth_budget, &route)? else {
            return Ok(());
        };

        if depth_budget > 0 {
            links
                .par_iter()
                .filter(|neighbor| neighbor.as_str() != route.root())
                .try_for_each(|neighbor| {
                    if !self.tracker.should_expand(neighbor, depth_budget) {
                        RunCounters::bump(&self.counters.pruned);
                        return Ok(());
                    }
                    self.explore_parallel(depth_budget - 1, neighbor, route.extend(neighbor))
                })?;
        }

        // An interrupted subtree is not exhausted.
        if !self.was_cancelled() {
            self.tracker.record(node, depth_budget);
        }
        Ok(())
    }

    pub fn tracker(&self) -> &ExhaustionTracker {
        &self.tracker
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.snapshot()
    }

    pub fn stats(&self) -> RunStats {
        self.counters.snapshot(0)
    }

    pub fn was_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn finish(self, elapsed: Duration) -> TraversalOutcome {
        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        TraversalOutcome {
            stats: self.counters.snapshot(elapsed_ms),
            cancelled: self.cancelled.load(Ordering::SeqCst),
            exhausted_pages: self.tracker.len(),
            diagnostics: self.diagnostics.into_entries(),
        }
    }

    // -------------------------------------------------------------------
    // Per-page work shared by both drivers
    // -------------------------------------------------------------------

    /// Get the page's edge set and report the route if it links to the
    /// target. `None` means the run was cancelled.
    fn expand(&self, budget: u32, route: &Route) -> Result<Option<EdgeSet>> {
        if self.cancel.is_cancelled() {
            self.cancelled.store(true, Ordering::SeqCst);
            return Ok(None);
        }
        tracing::debug!(route = ?route.to_vec(), budget, "traversing route");

        let Some(links) = self.edge_set(route.last())? else {
            self.cancelled.store(true, Ordering::SeqCst);
            return Ok(None);
        };
        RunCounters::bump(&self.counters.nodes_expanded);

        if links.iter().any(|link| link == self.target) {
            let found = FoundRoute {
                route: route.to_vec(),
                depth: route.depth(),
                remaining: budget,
            };
            RunCounters::bump(&self.counters.routes_found);
            self.engine.reporter.report(&found);
        }
        Ok(Some(links))
    }

    /// Cache first; on a miss wait for the rate limiter (remote sources
    /// only), fetch, and write back. Fetch failures come back as an empty edge set.
    fn edge_set(&self, page: &str) -> Result<Option<EdgeSet>> {
        match self.engine.cache.lookup(page) {
            Ok(Some(entry)) => {
                RunCounters::bump(&self.counters.cache_hits);
                return Ok(Some(entry.links));
            }
            Ok(None) => RunCounters::bump(&self.counters.cache_misses),
            Err(e) => {
                tracing::error!(page = %page, "cache lookup failed: {e}");
                return Err(DepthChargeError::Storage(e));
            }
        }

        if self.engine.source.is_remote() {
            if !self.engine.limiter.acquire(self.cancel) {
                return Ok(None);
            }
            RunCounters::bump(&self.counters.fetches);
        } else if self.cancel.is_cancelled() {
            return Ok(None);
        }

        match self.engine.source.fetch(page, self.cancel) {
            Ok(fetched) => {
                let count = fetched.links.len();
                if fetched.has_more || count > self.engine.options.oversize_threshold {
                    self.diagnostics.record(
                        page,
                        DiagnosticKind::OversizedEdgeSet {
                            count,
                            has_more: fetched.has_more,
                        },
                    );
                }
                if fetched.page_missing {
                    self.diagnostics.record(page, DiagnosticKind::MissingPage);
                } else if fetched.links_missing {
                    self.diagnostics.record(page, DiagnosticKind::NoLinks);
                }
                self.store_with_retry(page, &fetched.links);
                Ok(Some(fetched.links))
            }
            Err(FetchError::Cancelled) => Ok(None),
            Err(FetchError::Malformed(reason)) => {
                RunCounters::bump(&self.counters.fetch_failures);
                self.diagnostics
                    .record(page, DiagnosticKind::MalformedResponse { reason });
                Ok(Some(Vec::new()))
            }
            Err(e) => {
                RunCounters::bump(&self.counters.fetch_failures);
                self.diagnostics.record(
                    page,
                    DiagnosticKind::FetchFailure {
                        reason: e.to_string(),
                    },
                );
                Ok(Some(Vec::new()))
            }
        }
    }

    /// One retry, then give up and carry on with the uncached edges.
    fn store_with_retry(&self, page: &str, links: &[String]) {
        let timestamp = chrono::Utc::now().timestamp();
        let Err(first) = self.engine.cache.store(page, links, timestamp) else {
            return;
        };
        tracing::debug!(page = %page, "cache write failed, retrying: {first}");
        if let Err(second) = self.engine.cache.store(page, links, timestamp) {
            self.diagnostics.record(
                page,
                DiagnosticKind::CacheWriteFailure {
                    reason: second.to_string(),
                },
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
