//! SQLite schema initialization for the adjacency cache.
//!
//! One row per page: the page title, its out-links serialized as a JSON
//! array, and the unix time they were fetched.

use rusqlite::Connection;

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// MediaWiki titles are capped at 256 bytes; we cap at 256 characters.
pub const MAX_PAGE_LEN: usize = 256;

/// Longest serialized link list accepted: 5000 titles of maximum length.
pub const MAX_LINKS_LEN: usize = MAX_PAGE_LEN * 5000;

// ---------------------------------------------------------------------------
// DDL
// ---------------------------------------------------------------------------

const CREATE_LINKS: &str = "\
CREATE TABLE IF NOT EXISTS links (
  id INTEGER PRIMARY KEY,
  page TEXT NOT NULL UNIQUE,
  links TEXT NOT NULL,
  timestamp INTEGER NOT NULL
)";

const CREATE_INDEXES: &[&str] =
    &["CREATE INDEX IF NOT EXISTS idx_links_timestamp ON links(timestamp)"];

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Open (or create) the cache database at `db_path` and apply the schema.
///
/// Pass `":memory:"` for a throwaway database.
pub fn initialize_database(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;

    // In-memory databases silently keep journal_mode=memory.
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;

    conn.execute_batch(CREATE_LINKS)?;
    for ddl in CREATE_INDEXES {
        conn.execute_batch(ddl)?;
    }

    Ok(conn)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Connection {
        initialize_database(":memory:").expect("schema creation should succeed on :memory:")
    }

    fn object_exists(conn: &Connection, obj_type: &str, obj_name: &str) -> bool {
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = ?1 AND name = ?2",
                rusqlite::params![obj_type, obj_name],
                |row| row.get(0),
            )
            .unwrap();
        count > 0
    }

    #[test]
    fn links_table_exists() {
        let conn = setup();
        assert!(object_exists(&conn, "table", "links"));
        assert!(object_exists(&conn, "index", "idx_links_timestamp"));
    }

    #[test]
    fn links_table_has_expected_columns() {
        let conn = setup();
        let mut stmt = conn.prepare("PRAGMA table_info(links)").unwrap();
        let cols: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .unwrap()
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(cols, vec!["id", "page", "links", "timestamp"]);
    }

    #[test]
    fn page_is_unique() {
        let conn = setup();
        conn.execute(
            "INSERT INTO links (page, links, timestamp) VALUES ('A', '[]', 1)",
            [],
        )
        .unwrap();
        let dup = conn.execute(
            "INSERT INTO links (page, links, timestamp) VALUES ('A', '[]', 2)",
            [],
        );
        assert!(dup.is_err());
    }

    #[test]
    fn schema_is_idempotent_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("links.sqlite");
        let path = path.to_str().unwrap();
        drop(initialize_database(path).unwrap());
        let conn = initialize_database(path).unwrap();
        assert!(object_exists(&conn, "table", "links"));
    }
}
