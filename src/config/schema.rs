//! Configuration data structures for depthcharge.
//!
//! Defines the YAML config format: traversal limits, the wiki edge source,
//! and the on-disk adjacency cache. Every field has a default so a partial
//! file (or none at all) is valid.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DepthChargeError, Result};
use crate::graph::TraversalOptions;
use crate::source::WikiSourceConfig;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration for depthcharge.
///
/// Loaded from YAML, then overridden by `DEPTHCHARGE_*` environment
/// variables and CLI flags; see [`super::loader`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DepthChargeConfig {
    #[serde(default)]
    pub traversal: TraversalConfig,

    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    /// Append logs here instead of writing them to stderr.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl DepthChargeConfig {
    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        let t = &self.traversal;
        if t.workers == 0 {
            return Err(DepthChargeError::Config("workers must be at least 1".into()));
        }
        if !t.delay_secs.is_finite() || t.delay_secs < 0.0 {
            return Err(DepthChargeError::Config(format!(
                "delay_secs must be a non-negative number, got {}",
                t.delay_secs
            )));
        }
        if let Some(secs) = t.max_runtime_secs {
            if !secs.is_finite() || secs <= 0.0 {
                return Err(DepthChargeError::Config(format!(
                    "max_runtime_secs must be positive, got {secs}"
                )));
            }
        }
        if self.source.page_limit == 0 {
            return Err(DepthChargeError::Config("page_limit must be at least 1".into()));
        }
        if self.source.api_url.trim().is_empty() {
            return Err(DepthChargeError::Config("api_url must not be empty".into()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TraversalConfig
// ---------------------------------------------------------------------------

/// Search limits and engine tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TraversalConfig {
    /// Hops below the root to explore.
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Seconds between edge source calls.
    #[serde(default = "default_delay_secs")]
    pub delay_secs: f64,

    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Link lists longer than this get an oversized diagnostic.
    #[serde(default = "default_oversize_threshold")]
    pub oversize_threshold: usize,

    /// Cancel the run after this many seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_runtime_secs: Option<f64>,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            delay_secs: default_delay_secs(),
            workers: default_workers(),
            oversize_threshold: default_oversize_threshold(),
            max_runtime_secs: None,
        }
    }
}

impl TraversalConfig {
    /// Engine options; call [`DepthChargeConfig::validate`] first.
    pub fn engine_options(&self) -> TraversalOptions {
        TraversalOptions {
            delay: Duration::try_from_secs_f64(self.delay_secs).unwrap_or(Duration::ZERO),
            workers: self.workers.max(1),
            oversize_threshold: self.oversize_threshold,
        }
    }

    pub fn max_runtime(&self) -> Option<Duration> {
        self.max_runtime_secs
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }
}

// ---------------------------------------------------------------------------
// SourceConfig
// ---------------------------------------------------------------------------

/// Where and how link lists are fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_page_limit")]
    pub page_limit: u32,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            user_agent: default_user_agent(),
            page_limit: default_page_limit(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl SourceConfig {
    pub fn wiki_config(&self) -> WikiSourceConfig {
        WikiSourceConfig {
            api_url: self.api_url.clone(),
            user_agent: self.user_agent.clone(),
            page_limit: self.page_limit,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

// ---------------------------------------------------------------------------
// CacheConfig
// ---------------------------------------------------------------------------

/// The SQLite adjacency cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Database file. When unset the loader picks the platform data dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Overwrite existing rows on store, and honour `max_age_secs`.
    #[serde(default)]
    pub refresh: bool,

    /// In refresh mode, rows older than this are ignored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age_secs: Option<u64>,
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_max_depth() -> u32 {
    2
}

fn default_delay_secs() -> f64 {
    0.3
}

fn default_workers() -> usize {
    1
}

fn default_oversize_threshold() -> usize {
    5000
}

fn default_api_url() -> String {
    WikiSourceConfig::default().api_url
}

fn default_user_agent() -> String {
    WikiSourceConfig::default().user_agent
}

fn default_page_limit() -> u32 {
    5000
}

fn default_timeout_secs() -> u64 {
    30
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq as pa_eq;

    #[test]
    fn test_default_config() {
        let config = DepthChargeConfig::default();
        pa_eq!(config.traversal.max_depth, 2);
        pa_eq!(config.traversal.delay_secs, 0.3);
        pa_eq!(config.traversal.workers, 1);
        pa_eq!(config.traversal.oversize_threshold, 5000);
        pa_eq!(config.source.api_url, "https://en.wikipedia.org/w/api.php");
        pa_eq!(config.source.page_limit, 5000);
        assert!(!config.cache.refresh);
        assert!(config.cache.path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let config: DepthChargeConfig = serde_yaml::from_str("{}").unwrap();
        pa_eq!(config, DepthChargeConfig::default());
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = r#"
traversal:
  max_depth: 3
  workers: 4
cache:
  path: /tmp/links.sqlite
  refresh: true
  max_age_secs: 86400
"#;
        let config: DepthChargeConfig = serde_yaml::from_str(yaml).unwrap();
        pa_eq!(config.traversal.max_depth, 3);
        pa_eq!(config.traversal.workers, 4);
        pa_eq!(config.traversal.delay_secs, 0.3);
        pa_eq!(config.cache.path, Some(PathBuf::from("/tmp/links.sqlite")));
        pa_eq!(config.cache.max_age_secs, Some(86400));
        pa_eq!(config.source, SourceConfig::default());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = "traversal:\n  max_dept: 3\n";
        let result: std::result::Result<DepthChargeConfig, _> = serde_yaml::from_str(yaml);
        assert!(result.is_err());
    }

    #[test]
    fn test_serde_yaml_roundtrip() {
        let mut config = DepthChargeConfig::default();
        config.traversal.max_runtime_secs = Some(60.0);
        config.log_file = Some(PathBuf::from("debug.log"));
        let yaml = serde_yaml::to_string(&config).unwrap();
        let back: DepthChargeConfig = serde_yaml::from_str(&yaml).unwrap();
        pa_eq!(back, config);
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let mut config = DepthChargeConfig::default();
        config.traversal.workers = 0;
        assert!(matches!(config.validate(), Err(DepthChargeError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_delay() {
        for delay in [-0.1, f64::NAN, f64::INFINITY] {
            let mut config = DepthChargeConfig::default();
            config.traversal.delay_secs = delay;
            assert!(config.validate().is_err(), "accepted delay {delay}");
        }
    }

    #[test]
    fn test_validate_rejects_zero_page_limit() {
        let mut config = DepthChargeConfig::default();
        config.source.page_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_engine_options() {
        let traversal = TraversalConfig {
            delay_secs: 1.5,
            workers: 3,
            ..Default::default()
        };
        let options = traversal.engine_options();
        pa_eq!(options.delay, Duration::from_millis(1500));
        pa_eq!(options.workers, 3);
        pa_eq!(options.oversize_threshold, 5000);
    }

    #[test]
    fn test_wiki_config() {
        let source = SourceConfig {
            timeout_secs: 5,
            ..Default::default()
        };
        let wiki = source.wiki_config();
        pa_eq!(wiki.timeout, Duration::from_secs(5));
        pa_eq!(wiki.page_limit, 5000);
    }
}
