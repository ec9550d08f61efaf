//! Configuration: YAML schema and layered loading.

pub mod loader;
pub mod schema;

pub use loader::{config_file_path, load_config, resolve_cache_path, ConfigOverrides};
pub use schema::{CacheConfig, DepthChargeConfig, SourceConfig, TraversalConfig};
