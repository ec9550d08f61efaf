//! Command-line interface.
//!
//! - `depthcharge run --root <title>` searches for routes back to the root
//!   (or to `--target`) and prints each one as it is found.
//! - `depthcharge cache show <title>` and `depthcharge cache stats` inspect
//!   the adjacency cache.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use crate::cache::{AdjacencyCache, SqliteLinkCache};
use crate::config::{
    config_file_path, load_config, resolve_cache_path, ConfigOverrides, DepthChargeConfig,
};
use crate::error::Result;
use crate::graph::{CancelToken, TraversalEngine};
use crate::observability::init_logging;
use crate::report::{OutputFormat, StreamReporter};
use crate::source::{EdgeSource, OfflineEdgeSource, WikiEdgeSource};
use crate::types::TraversalParams;

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

#[derive(Debug, Parser)]
#[command(name = "depthcharge", version)]
#[command(about = "Find every wiki link route that leads back to a page")]
pub struct Cli {
    /// YAML config file (default: ./.depthcharge.yaml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// SQLite cache file
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Search for routes from a root page
    Run(RunArgs),
    /// Inspect the adjacency cache
    Cache {
        #[command(subcommand)]
        action: CacheCommand,
    },
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Page to start from
    #[arg(long)]
    pub root: String,

    /// Page the routes must link to (default: the root)
    #[arg(long)]
    pub target: Option<String>,

    /// Maximum hops below the root
    #[arg(long)]
    pub depth: Option<u32>,

    /// Seconds between uncached fetches
    #[arg(long)]
    pub delay: Option<f64>,

    /// Worker threads (1 = sequential)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Route output format: text or json
    #[arg(long, default_value = "text", value_parser = parse_format)]
    pub format: OutputFormat,

    /// Overwrite cached link lists with fresh ones
    #[arg(long)]
    pub refresh: bool,

    /// Use only the cache; never contact the wiki
    #[arg(long)]
    pub offline: bool,

    /// Stop after this many seconds, keeping routes found so far
    #[arg(long)]
    pub max_runtime_secs: Option<f64>,

    /// Print run statistics as JSON on stderr
    #[arg(long)]
    pub stats: bool,
}

#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// Print the cached links of one page
    Show { title: String },
    /// Print entry count and age range
    Stats,
}

fn parse_format(s: &str) -> std::result::Result<OutputFormat, String> {
    OutputFormat::from_str_loose(s).ok_or_else(|| format!("unknown format {s:?} (text, json)"))
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Resolve configuration, set up logging and run the chosen command.
pub fn run(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let config_file = config_file_path(cli.config.as_deref(), &cwd);
    let mut config = load_config(cli.config.as_deref(), &cwd)?;

    let mut overrides = ConfigOverrides {
        cache_path: cli.db.clone(),
        ..Default::default()
    };
    if let Command::Run(args) = &cli.command {
        overrides.max_depth = args.depth;
        overrides.delay_secs = args.delay;
        overrides.workers = args.workers;
        overrides.max_runtime_secs = args.max_runtime_secs;
        overrides.refresh = args.refresh;
    }
    overrides.apply(&mut config);
    config.validate()?;

    init_logging(config.log_file.as_deref())?;
    match &config_file {
        Some(path) => tracing::debug!(path = %path.display(), "loaded config file"),
        None => tracing::debug!("no config file, using defaults and environment"),
    }

    match cli.command {
        Command::Run(args) => cmd_run(&args, &config),
        Command::Cache { action } => match action {
            CacheCommand::Show { title } => cmd_cache_show(&title, &config),
            CacheCommand::Stats => cmd_cache_stats(&config),
        },
    }
}

/// Open the configured cache, creating its directory when needed.
fn open_cache(config: &DepthChargeConfig) -> Result<SqliteLinkCache> {
    let path = resolve_cache_path(config);
    ensure_parent_dir(&path)?;
    let cache = SqliteLinkCache::open(&path.to_string_lossy())?;
    tracing::debug!(path = %path.display(), refresh = config.cache.refresh, "opened cache");
    if config.cache.refresh {
        Ok(cache.with_refresh(config.cache.max_age_secs))
    } else {
        Ok(cache)
    }
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent)?;
            Ok(())
        }
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_run(args: &RunArgs, config: &DepthChargeConfig) -> Result<()> {
    let cache = open_cache(config)?;
    let source: Box<dyn EdgeSource> = if args.offline {
        Box::new(OfflineEdgeSource)
    } else {
        Box::new(WikiEdgeSource::new(config.source.wiki_config())?)
    };
    let reporter = StreamReporter::new(std::io::stdout(), args.format);

    let params = TraversalParams::new(
        args.root.clone(),
        args.target.clone().unwrap_or_else(|| args.root.clone()),
        config.traversal.max_depth,
    );
    let cancel = match config.traversal.max_runtime() {
        Some(limit) => CancelToken::with_timeout(limit),
        None => CancelToken::new(),
    };

    let engine = TraversalEngine::new(
        &cache,
        source.as_ref(),
        &reporter,
        config.traversal.engine_options(),
    );
    let outcome = engine.run(&params, &cancel)?;

    if outcome.cancelled {
        tracing::warn!("run stopped early; routes above are partial");
    }
    if !outcome.diagnostics.is_empty() {
        eprintln!("{} page(s) had problems:", outcome.diagnostics.len());
        for diagnostic in &outcome.diagnostics {
            eprintln!("  {diagnostic}");
        }
    }
    if args.stats {
        eprintln!("{}", serde_json::to_string_pretty(&outcome.stats.to_json())?);
    }
    Ok(())
}

fn cmd_cache_show(title: &str, config: &DepthChargeConfig) -> Result<()> {
    let cache = open_cache(config)?;
    match cache.lookup(title)? {
        Some(entry) => {
            println!(
                "{} ({} links, fetched {})",
                entry.page,
                entry.links.len(),
                format_timestamp(entry.timestamp)
            );
            for link in &entry.links {
                println!("  {link}");
            }
            Ok(())
        }
        None => {
            println!("{title} is not cached");
            Ok(())
        }
    }
}

fn cmd_cache_stats(config: &DepthChargeConfig) -> Result<()> {
    let cache = open_cache(config)?;
    let stats = cache.stats()?;
    println!("path:    {}", resolve_cache_path(config).display());
    println!("entries: {}", stats.entries);
    if let (Some(oldest), Some(newest)) = (stats.oldest, stats.newest) {
        println!("oldest:  {}", format_timestamp(oldest));
        println!("newest:  {}", format_timestamp(newest));
    }
    Ok(())
}

fn format_timestamp(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| ts.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
