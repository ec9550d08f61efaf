//! Route reporting and run diagnostics.
//!
//! The engine hands every found route to a [`RouteReporter`] as soon as it
//! is discovered, so a cancelled or failed run still keeps what it emitted.
//! Non-fatal problems (failed fetches, cache write failures, oversized link
//! lists) are collected in a [`DiagnosticLog`].

use std::io::Write;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::types::FoundRoute;

// ---------------------------------------------------------------------------
// RouteReporter
// ---------------------------------------------------------------------------

/// Receives routes as the engine finds them. Must tolerate concurrent calls.
pub trait RouteReporter: Send + Sync {
    fn report(&self, found: &FoundRoute);
}

/// Keeps every reported route in memory, in arrival order.
#[derive(Debug, Default)]
pub struct RouteCollector {
    routes: Mutex<Vec<FoundRoute>>,
}

impl RouteCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the routes reported so far.
    pub fn snapshot(&self) -> Vec<FoundRoute> {
        self.routes.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn into_routes(self) -> Vec<FoundRoute> {
        self.routes.into_inner().unwrap_or_else(|e| e.into_inner())
    }

    pub fn len(&self) -> usize {
        self.routes.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RouteReporter for RouteCollector {
    fn report(&self, found: &FoundRoute) {
        self.routes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(found.clone());
    }
}

/// Line format used by [`StreamReporter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `[depth N] A -> B -> C`
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl OutputFormat {
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "text" | "txt" | "plain" => Some(Self::Text),
            "json" | "jsonl" | "ndjson" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Writes each route as one line to a writer. The route is also logged at
/// debug level so info-level logs do not repeat the output.
#[derive(Debug)]
pub struct StreamReporter<W: Write + Send> {
    out: Mutex<W>,
    format: OutputFormat,
}

impl<W: Write + Send> StreamReporter<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self {
            out: Mutex::new(out),
            format,
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

impl<W: Write + Send> RouteReporter for StreamReporter<W> {
    fn report(&self, found: &FoundRoute) {
        tracing::debug!(depth = found.depth, route = ?found.route, "return route found");
        let line = match self.format {
            OutputFormat::Text => found.to_string(),
            OutputFormat::Json => match serde_json::to_string(found) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("cannot serialize route: {e}");
                    return;
                }
            },
        };
        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = writeln!(out, "{line}").and_then(|_| out.flush()) {
            tracing::error!("cannot write route: {e}");
        }
    }
}

/// Forwards each route to several reporters.
pub struct FanOut<'a> {
    reporters: Vec<&'a dyn RouteReporter>,
}

impl<'a> FanOut<'a> {
    pub fn new(reporters: Vec<&'a dyn RouteReporter>) -> Self {
        Self { reporters }
    }
}

impl RouteReporter for FanOut<'_> {
    fn report(&self, found: &FoundRoute) {
        for reporter in &self.reporters {
            reporter.report(found);
        }
    }
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// A non-fatal problem met while expanding one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Network, HTTP or API failure.
    FetchFailure { reason: String },
    /// The response body did not have the expected shape.
    MalformedResponse { reason: String },
    /// The cache rejected the write twice; the page was used uncached.
    CacheWriteFailure { reason: String },
    /// More links than one response holds; only the first page was used.
    OversizedEdgeSet { count: usize, has_more: bool },
    /// The page exists but has no article links.
    NoLinks,
    /// The page does not exist; it is cached with no links.
    MissingPage,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FetchFailure { .. } => "fetch_failure",
            Self::MalformedResponse { .. } => "malformed_response",
            Self::CacheWriteFailure { .. } => "cache_write_failure",
            Self::OversizedEdgeSet { .. } => "oversized_edge_set",
            Self::NoLinks => "no_links",
            Self::MissingPage => "missing_page",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub page: String,
    #[serde(flatten)]
    pub kind: DiagnosticKind,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            DiagnosticKind::FetchFailure { reason } => {
                write!(f, "fetch failed for {}: {reason}", self.page)
            }
            DiagnosticKind::MalformedResponse { reason } => {
                write!(f, "malformed response for {}: {reason}", self.page)
            }
            DiagnosticKind::CacheWriteFailure { reason } => {
                write!(f, "cache write failed for {}: {reason}", self.page)
            }
            DiagnosticKind::OversizedEdgeSet { count, has_more } => write!(
                f,
                "{} has {count} links{}; pagination is not supported",
                self.page,
                if *has_more { " and more available" } else { "" }
            ),
            DiagnosticKind::NoLinks => write!(f, "{} has no article links", self.page),
            DiagnosticKind::MissingPage => write!(f, "{} does not exist", self.page),
        }
    }
}

/// Append-only, thread-safe list of diagnostics for one run.
#[derive(Debug, Default)]
pub struct DiagnosticLog {
    entries: Mutex<Vec<Diagnostic>>,
}

impl DiagnosticLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record and log a diagnostic.
    pub fn record(&self, page: &str, kind: DiagnosticKind) {
        let diagnostic = Diagnostic {
            page: page.to_string(),
            kind,
        };
        match diagnostic.kind {
            DiagnosticKind::NoLinks | DiagnosticKind::MissingPage => {
                tracing::debug!(kind = diagnostic.kind.as_str(), "{diagnostic}")
            }
            _ => tracing::warn!(kind = diagnostic.kind.as_str(), "{diagnostic}"),
        }
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(diagnostic);
    }

    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn into_entries(self) -> Vec<Diagnostic> {
        self.entries.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
