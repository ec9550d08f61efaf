//! MediaWiki edge source.
//!
//! Issues `action=query&prop=links` against a wiki's `api.php` and keeps the
//! article-namespace (`ns == 0`) link titles. Pagination (`plcontinue`) is
//! not followed: a `continue` marker is surfaced as
//! [`FetchedEdges::has_more`] so the engine can report an oversized edge set.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use super::EdgeSource;
use crate::error::{DepthChargeError, FetchError, Result};
use crate::graph::cancel::CancelToken;
use crate::types::FetchedEdges;

/// Namespace of ordinary articles.
const ARTICLE_NAMESPACE: i64 = 0;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Connection settings for [`WikiEdgeSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiSourceConfig {
    /// Full URL of the wiki's `api.php`.
    pub api_url: String,
    pub user_agent: String,
    /// Value sent as `pllimit`.
    pub page_limit: u32,
    pub timeout: Duration,
}

impl Default for WikiSourceConfig {
    fn default() -> Self {
        Self {
            api_url: "https://en.wikipedia.org/w/api.php".to_string(),
            user_agent: concat!("depthcharge/", env!("CARGO_PKG_VERSION")).to_string(),
            page_limit: 5000,
            timeout: Duration::from_secs(30),
        }
    }
}

// ---------------------------------------------------------------------------
// Response shape
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ApiResponse {
    query: Option<QueryBody>,
    error: Option<ApiErrorBody>,
    #[serde(rename = "continue")]
    continuation: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    info: String,
}

#[derive(Debug, Deserialize)]
struct QueryBody {
    #[serde(default)]
    pages: BTreeMap<String, PageBody>,
}

#[derive(Debug, Deserialize)]
struct PageBody {
    title: Option<String>,
    missing: Option<serde_json::Value>,
    invalid: Option<serde_json::Value>,
    links: Option<Vec<LinkBody>>,
}

#[derive(Debug, Deserialize)]
struct LinkBody {
    ns: i64,
    title: String,
}

/// Turn a `prop=links` JSON body into an edge set.
///
/// `page` is only used for log context.
pub fn parse_links_response(page: &str, body: &str) -> std::result::Result<FetchedEdges, FetchError> {
    let response: ApiResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Malformed(e.to_string()))?;

    if let Some(err) = response.error {
        return Err(FetchError::Api {
            code: err.code,
            info: err.info,
        });
    }

    let query = response
        .query
        .ok_or_else(|| FetchError::Malformed("response has no `query` object".into()))?;
    if query.pages.is_empty() {
        return Err(FetchError::Malformed("response has no pages".into()));
    }
    if query.pages.len() > 1 {
        tracing::warn!(
            page = %page,
            pages = query.pages.len(),
            "more than one page returned for a single-title query"
        );
    }

    let mut links = Vec::new();
    let mut found_page = false;
    let mut saw_links_field = false;
    for body in query.pages.into_values() {
        if body.missing.is_some() || body.invalid.is_some() {
            tracing::debug!(page = %page, title = ?body.title, "page missing or invalid");
            continue;
        }
        found_page = true;
        if let Some(page_links) = body.links {
            saw_links_field = true;
            links.extend(
                page_links
                    .into_iter()
                    .filter(|l| l.ns == ARTICLE_NAMESPACE)
                    .map(|l| l.title),
            );
        }
    }

    if !found_page {
        return Ok(FetchedEdges::missing_page());
    }

    Ok(FetchedEdges {
        links,
        has_more: response.continuation.is_some(),
        links_missing: !saw_links_field,
        page_missing: false,
    })
}

// ---------------------------------------------------------------------------
// WikiEdgeSource
// ---------------------------------------------------------------------------

/// Blocking HTTP client for one wiki's API.
#[derive(Debug, Clone)]
pub struct WikiEdgeSource {
    http: reqwest::blocking::Client,
    config: WikiSourceConfig,
}

impl WikiEdgeSource {
    pub fn new(config: WikiSourceConfig) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()
            .map_err(|e| DepthChargeError::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &WikiSourceConfig {
        &self.config
    }

    /// Query-string parameters for one page.
    fn query_params(&self, page: &str) -> [(&'static str, String); 5] {
        [
            ("action", "query".to_string()),
            ("format", "json".to_string()),
            ("prop", "links".to_string()),
            ("titles", page.to_string()),
            ("pllimit", self.config.page_limit.to_string()),
        ]
    }
}

impl EdgeSource for WikiEdgeSource {
    fn fetch(&self, page: &str, cancel: &CancelToken) -> std::result::Result<FetchedEdges, FetchError> {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        let timeout = match cancel.remaining() {
            Some(left) => left.min(self.config.timeout),
            None => self.config.timeout,
        };

        let response = self
            .http
            .get(&self.config.api_url)
            .query(&self.query_params(page))
            .timeout(timeout)
            .send()
            .map_err(|e| {
                if e.is_timeout() && cancel.is_cancelled() {
                    FetchError::Cancelled
                } else {
                    FetchError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let body = response
            .text()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        parse_links_response(page, &body)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
