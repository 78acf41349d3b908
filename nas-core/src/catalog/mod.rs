//! Embedded relational + full-text catalog store (spec.md §4.4).
//!
//! Backed by `rusqlite` with the FTS5 extension, pooled with `r2d2` so
//! Phase 2's enrichment workers each borrow their own connection instead of
//! contending over one. All methods here are synchronous; callers on the
//! async side wrap them in `tokio::task::spawn_blocking`.

mod dashboard;
pub(crate) mod files;
mod metadata;
mod scan_log;
mod schema;
mod tags;

use std::path::Path;

use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use crate::error::Result;

pub use dashboard::{CategoryCount, DashboardStats, DuplicateGroup};
pub use files::{FileFilter, NewFileRow};

pub type Pool = r2d2::Pool<SqliteConnectionManager>;
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Handle to the catalog database. Cheap to clone (wraps a pool handle).
#[derive(Clone)]
pub struct Catalog {
    pool: Pool,
}

impl Catalog {
    /// Opens (and if needed creates) the catalog database at `path`,
    /// applying pragmas and the schema to every new connection.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.execute_batch(schema::PRAGMAS)?;
            conn.execute_batch(schema::SCHEMA)?;
            Ok(())
        });
        let pool = r2d2::Pool::builder().max_size(16).build(manager)?;
        Ok(Self { pool })
    }

    /// In-memory catalog, used by tests.
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let manager = SqliteConnectionManager::memory().with_init(|conn| {
            conn.execute_batch(schema::PRAGMAS)?;
            conn.execute_batch(schema::SCHEMA)?;
            Ok(())
        });
        // A single-connection pool: in-memory SQLite databases are private
        // to the connection that created them, so pooling more than one
        // would hand out empty databases to later borrowers.
        let pool = r2d2::Pool::builder().max_size(1).build(manager)?;
        Ok(Self { pool })
    }

    pub fn conn(&self) -> Result<PooledConnection> {
        Ok(self.pool.get()?)
    }
}

pub(crate) fn with_conn<T>(
    conn: &Connection,
    f: impl FnOnce(&Connection) -> rusqlite::Result<T>,
) -> Result<T> {
    Ok(f(conn)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_and_initializes_schema() {
        let catalog = Catalog::open_in_memory().unwrap();
        let conn = catalog.conn().unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type='table' AND name='files'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn schema_init_is_idempotent() {
        let catalog = Catalog::open_in_memory().unwrap();
        let conn = catalog.conn().unwrap();
        conn.execute_batch(schema::SCHEMA).unwrap();
    }
}
