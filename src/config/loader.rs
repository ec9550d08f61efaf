//! Layered config loading: defaults, YAML file, environment, CLI flags.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::schema::DepthChargeConfig;
use crate::error::{DepthChargeError, Result};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Looked up in the working directory when no `--config` is given.
pub const CONFIG_FILE_NAME: &str = ".depthcharge.yaml";

/// Cache file name inside the platform data dir.
pub const CACHE_FILE_NAME: &str = "links.sqlite";

const ENV_PREFIX: &str = "DEPTHCHARGE_";

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Defaults, then the YAML file, then `DEPTHCHARGE_*` variables.
///
/// An explicit `config_path` must exist; the implicit
/// `<cwd>/.depthcharge.yaml` is optional. The result is not validated, so
/// CLI overrides can still be applied before [`DepthChargeConfig::validate`].
pub fn load_config(config_path: Option<&Path>, cwd: &Path) -> Result<DepthChargeConfig> {
    let mut config = match config_file_path(config_path, cwd) {
        Some(path) => read_config_file(&path)?,
        None => DepthChargeConfig::default(),
    };
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    Ok(config)
}

/// The YAML file [`load_config`] reads, if any: `config_path` when given,
/// else `<cwd>/.depthcharge.yaml` when it exists.
///
/// Logging is set up from the loaded config, so callers log this path
/// themselves once it is.
pub fn config_file_path(config_path: Option<&Path>, cwd: &Path) -> Option<PathBuf> {
    match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let implicit = cwd.join(CONFIG_FILE_NAME);
            implicit.is_file().then_some(implicit)
        }
    }
}

/// Parse one YAML config file.
pub fn read_config_file(path: &Path) -> Result<DepthChargeConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        DepthChargeError::Config(format!("cannot read {}: {e}", path.display()))
    })?;
    let config = serde_yaml::from_str(&contents).map_err(|e| {
        DepthChargeError::Config(format!("cannot parse {}: {e}", path.display()))
    })?;
    Ok(config)
}

/// Apply `DEPTHCHARGE_*` overrides read through `lookup`.
pub fn apply_env_overrides<F>(config: &mut DepthChargeConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(&format!("{ENV_PREFIX}{name}")).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("MAX_DEPTH") {
        config.traversal.max_depth = parse_env("MAX_DEPTH", &v)?;
    }
    if let Some(v) = get("DELAY_SECS") {
        config.traversal.delay_secs = parse_env("DELAY_SECS", &v)?;
    }
    if let Some(v) = get("WORKERS") {
        config.traversal.workers = parse_env("WORKERS", &v)?;
    }
    if let Some(v) = get("MAX_RUNTIME_SECS") {
        config.traversal.max_runtime_secs = Some(parse_env("MAX_RUNTIME_SECS", &v)?);
    }
    if let Some(v) = get("API_URL") {
        config.source.api_url = v;
    }
    if let Some(v) = get("USER_AGENT") {
        config.source.user_agent = v;
    }
    if let Some(v) = get("DB") {
        config.cache.path = Some(PathBuf::from(v));
    }
    if let Some(v) = get("REFRESH") {
        config.cache.refresh = parse_bool("REFRESH", &v)?;
    }
    if let Some(v) = get("MAX_AGE_SECS") {
        config.cache.max_age_secs = Some(parse_env("MAX_AGE_SECS", &v)?);
    }
    if let Some(v) = get("LOG_FILE") {
        config.log_file = Some(PathBuf::from(v));
    }
    Ok(())
}

fn parse_env<T: FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e| {
        DepthChargeError::Config(format!("{ENV_PREFIX}{name}={value:?}: {e}"))
    })
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(DepthChargeError::Config(format!(
            "{ENV_PREFIX}{name}={value:?}: expected a boolean"
        ))),
    }
}

// ---------------------------------------------------------------------------
// CLI overrides
// ---------------------------------------------------------------------------

/// Values given on the command line; `None` leaves the config untouched.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub max_depth: Option<u32>,
    pub delay_secs: Option<f64>,
    pub workers: Option<usize>,
    pub max_runtime_secs: Option<f64>,
    pub cache_path: Option<PathBuf>,
    pub refresh: bool,
}

impl ConfigOverrides {
    pub fn apply(&self, config: &mut DepthChargeConfig) {
        if let Some(depth) = self.max_depth {
            config.traversal.max_depth = depth;
        }
        if let Some(delay) = self.delay_secs {
            config.traversal.delay_secs = delay;
        }
        if let Some(workers) = self.workers {
            config.traversal.workers = workers;
        }
        if let Some(secs) = self.max_runtime_secs {
            config.traversal.max_runtime_secs = Some(secs);
        }
        if let Some(path) = &self.cache_path {
            config.cache.path = Some(path.clone());
        }
        if self.refresh {
            config.cache.refresh = true;
        }
    }
}

// ---------------------------------------------------------------------------
// Cache location
// ---------------------------------------------------------------------------

/// `<data dir>/links.sqlite`, or `./links.sqlite` when the platform has no
/// home directory.
pub fn default_cache_path() -> PathBuf {
    directories::ProjectDirs::from("org", "depthcharge", "depthcharge")
        .map(|dirs| dirs.data_dir().join(CACHE_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(CACHE_FILE_NAME))
}

/// The configured cache path, or the default one.
pub fn resolve_cache_path(config: &DepthChargeConfig) -> PathBuf {
    config.cache.path.clone().unwrap_or_else(default_cache_path)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
