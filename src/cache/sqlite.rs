//! SQLite-backed adjacency cache.
//!
//! Uses `rusqlite` with `prepare_cached` so each statement is compiled once
//! per connection. The connection sits behind a mutex because
//! [`rusqlite::Connection`] is `Send` but not `Sync`, and the cache is shared
//! by every traversal worker.

use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use super::AdjacencyCache;
use crate::db::schema::{initialize_database, MAX_LINKS_LEN, MAX_PAGE_LEN};
use crate::error::CacheError;
use crate::types::CacheEntry;

// ---------------------------------------------------------------------------
// SQL constants
// ---------------------------------------------------------------------------

const SELECT_ENTRY_SQL: &str = "SELECT page, links, timestamp FROM links WHERE page = ?1";

const INSERT_ENTRY_SQL: &str = "\
INSERT INTO links (page, links, timestamp)
VALUES (?1, ?2, ?3)
ON CONFLICT(page) DO NOTHING";

const UPSERT_ENTRY_SQL: &str = "\
INSERT INTO links (page, links, timestamp)
VALUES (?1, ?2, ?3)
ON CONFLICT(page) DO UPDATE SET
  links = excluded.links,
  timestamp = excluded.timestamp";

const STATS_SQL: &str = "SELECT COUNT(*), MIN(timestamp), MAX(timestamp) FROM links";

// ---------------------------------------------------------------------------
// CacheStats
// ---------------------------------------------------------------------------

/// Summary of what the cache currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub oldest: Option<i64>,
    pub newest: Option<i64>,
}

// ---------------------------------------------------------------------------
// SqliteLinkCache
// ---------------------------------------------------------------------------

/// Adjacency cache stored in the `links` table.
///
/// By default rows are append-only: a second `store` for the same page is
/// ignored and entries never expire. [`SqliteLinkCache::with_refresh`] turns
/// on update-on-store and an optional maximum entry age.
pub struct SqliteLinkCache {
    conn: Mutex<Connection>,
    refresh: bool,
    max_age_secs: Option<i64>,
}

impl std::fmt::Debug for SqliteLinkCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteLinkCache")
            .field("refresh", &self.refresh)
            .field("max_age_secs", &self.max_age_secs)
            .finish_non_exhaustive()
    }
}

impl SqliteLinkCache {
    /// Open (or create) the cache at `db_path` and apply the schema.
    pub fn open(db_path: &str) -> Result<Self, CacheError> {
        let conn = initialize_database(db_path)?;
        Ok(Self::from_connection(conn))
    }

    /// Wrap a connection that already has the schema applied.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            refresh: false,
            max_age_secs: None,
        }
    }

    /// Overwrite rows on store, and treat rows older than `max_age_secs`
    /// (when given) as absent on lookup.
    pub fn with_refresh(mut self, max_age_secs: Option<u64>) -> Self {
        self.refresh = true;
        self.max_age_secs = max_age_secs.map(|s| i64::try_from(s).unwrap_or(i64::MAX));
        self
    }

    /// Entry count and timestamp range.
    pub fn stats(&self) -> Result<CacheStats, CacheError> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let (entries, oldest, newest) = conn.query_row(STATS_SQL, [], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, Option<i64>>(1)?,
                row.get::<_, Option<i64>>(2)?,
            ))
        })?;
        Ok(CacheStats {
            entries: entries as usize,
            oldest,
            newest,
        })
    }

    fn is_stale(&self, timestamp: i64) -> bool {
        match self.max_age_secs {
            Some(max_age) => chrono::Utc::now().timestamp().saturating_sub(timestamp) > max_age,
            None => false,
        }
    }
}

impl AdjacencyCache for SqliteLinkCache {
    fn lookup(&self, page: &str) -> Result<Option<CacheEntry>, CacheError> {
        let row = {
            let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
            let mut stmt = conn.prepare_cached(SELECT_ENTRY_SQL)?;
            let row = stmt
                .query_row(params![page], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                })
                .optional()?;
            row
        };

        let Some((page, raw_links, timestamp)) = row else {
            return Ok(None);
        };
        if self.is_stale(timestamp) {
            tracing::debug!(page = %page, timestamp, "cache entry is stale");
            return Ok(None);
        }
        let links: Vec<String> =
            serde_json::from_str(&raw_links).map_err(|e| CacheError::Corrupt {
                page: page.clone(),
                reason: e.to_string(),
            })?;
        Ok(Some(CacheEntry {
            page,
            links,
            timestamp,
        }))
    }

    fn store(&self, page: &str, links: &[String], timestamp: i64) -> Result<(), CacheError> {
        let page_len = page.chars().count();
        if page_len > MAX_PAGE_LEN {
            return Err(CacheError::TooLong {
                page: page.to_string(),
                field: "page",
                len: page_len,
                max: MAX_PAGE_LEN,
            });
        }
        let raw_links = serde_json::to_string(links).map_err(|e| CacheError::Corrupt {
            page: page.to_string(),
            reason: e.to_string(),
        })?;
        let links_len = raw_links.chars().count();
        if links_len > MAX_LINKS_LEN {
            return Err(CacheError::TooLong {
                page: page.to_string(),
                field: "links",
                len: links_len,
                max: MAX_LINKS_LEN,
            });
        }

        let sql = if self.refresh {
            UPSERT_ENTRY_SQL
        } else {
            INSERT_ENTRY_SQL
        };
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let mut stmt = conn.prepare_cached(sql)?;
        stmt.execute(params![page, raw_links, timestamp])?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
