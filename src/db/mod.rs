//! Database layer: SQLite schema for the adjacency cache.

pub mod schema;
