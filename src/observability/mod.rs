//! Structured logging and run statistics.
//!
//! This module provides:
//! - [`init_logging`] - One-time structured logging setup with `RUST_LOG` support
//! - [`RunCounters`] - Lock-free counters updated by traversal workers
//! - [`RunStats`] - Serializable snapshot of those counters for one run

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::error::Result;

/// Initialize structured logging with `RUST_LOG` environment variable support.
///
/// Defaults to `depthcharge=info` when `RUST_LOG` is not set. Logs go to
/// stderr, or are appended to `log_file` when one is given. Call once at
/// program startup; subsequent calls are silently ignored by
/// `tracing_subscriber`.
pub fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("depthcharge=info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    // try_init so double-init in tests doesn't panic
    match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let _ = builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
        None => {
            let _ = builder.with_writer(std::io::stderr).try_init();
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// RunCounters
// ---------------------------------------------------------------------------

/// Counters shared by every worker of one traversal run.
#[derive(Debug, Default)]
pub struct RunCounters {
    pub nodes_expanded: AtomicU64,
    pub cache_hits: AtomicU64,
    pub cache_misses: AtomicU64,
    pub fetches: AtomicU64,
    pub fetch_failures: AtomicU64,
    pub pruned: AtomicU64,
    pub routes_found: AtomicU64,
}

impl RunCounters {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, elapsed_ms: u64) -> RunStats {
        RunStats {
            nodes_expanded: self.nodes_expanded.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            pruned: self.pruned.load(Ordering::Relaxed),
            routes_found: self.routes_found.load(Ordering::Relaxed),
            elapsed_ms,
        }
    }
}

// ---------------------------------------------------------------------------
// RunStats
// ---------------------------------------------------------------------------

/// What one traversal run did. Serializable to JSON via [`RunStats::to_json`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Pages whose edge sets were obtained and examined.
    pub nodes_expanded: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    /// Edge source calls, successful or not.
    pub fetches: u64,
    pub fetch_failures: u64,
    /// Neighbors skipped by the exhaustion check.
    pub pruned: u64,
    pub routes_found: u64,
    pub elapsed_ms: u64,
}

impl RunStats {
    /// Fraction of lookups answered from the cache.
    pub fn cache_hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "nodes_expanded": self.nodes_expanded,
            "cache_hits": self.cache_hits,
            "cache_misses": self.cache_misses,
            "cache_hit_rate": self.cache_hit_rate(),
            "fetches": self.fetches,
            "fetch_failures": self.fetch_failures,
            "pruned": self.pruned,
            "routes_found": self.routes_found,
            "elapsed_ms": self.elapsed_ms,
        })
    }
}
