//! SQLite database management with migrations
//!
//! Backs the default durable session store: one row per fixed key, always
//! replaced whole.

use crate::error::{CareseekError, Result};
use crate::storage::SessionStore;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension};
use std::path::{Path, PathBuf};

/// Database connection pool
pub type DbPool = Pool<SqliteConnectionManager>;

/// Database manager with migration support
pub struct Database {
    pool: DbPool,
    path: PathBuf,
}

impl Database {
    /// Open (or create) the database at `db_path` and run migrations
    pub fn new(db_path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CareseekError::Io {
                source: e,
                context: format!("Failed to create database directory: {:?}", parent),
            })?;
        }

        let manager = SqliteConnectionManager::file(db_path);

        // One view owns the store; a small pool is plenty
        let pool = Pool::builder()
            .max_size(4)
            .build(manager)
            .map_err(|e| CareseekError::Storage(format!("Failed to create connection pool: {}", e)))?;

        {
            let conn = pool
                .get()
                .map_err(|e| CareseekError::Storage(format!("Failed to get connection: {}", e)))?;

            conn.execute_batch(
                "
                PRAGMA journal_mode = WAL;
                PRAGMA synchronous = NORMAL;
                PRAGMA busy_timeout = 5000;
                ",
            )?;
        }

        let db = Self {
            pool,
            path: db_path.to_path_buf(),
        };

        db.migrate()?;

        Ok(db)
    }

    /// Get a connection from the pool
    pub fn get_conn(&self) -> Result<r2d2::PooledConnection<SqliteConnectionManager>> {
        self.pool
            .get()
            .map_err(|e| CareseekError::Storage(format!("Failed to get connection: {}", e)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run database migrations
    fn migrate(&self) -> Result<()> {
        let conn = self.get_conn()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
            [],
        )?;

        let current_version: i32 = conn
            .query_row(
                "SELECT COALESCE(MAX(version), 0) FROM _migrations",
                [],
                |row| row.get(0),
            )
            .unwrap_or(0);

        for (version, migration) in MIGRATIONS.iter().enumerate() {
            let version = version as i32 + 1;

            if version > current_version {
                tracing::info!("Applying migration {}", version);

                conn.execute_batch(migration)?;

                conn.execute(
                    "INSERT INTO _migrations (version, applied_at) VALUES (?1, datetime('now'))",
                    params![version],
                )?;
            }
        }

        Ok(())
    }
}

/// Database migrations (each string is one migration)
const MIGRATIONS: &[&str] = &[
    // Migration 1: key/value session state
    r#"
    CREATE TABLE session_state (
        key TEXT PRIMARY KEY,
        payload TEXT NOT NULL,
        saved_at TEXT NOT NULL
    );
    "#,
];

/// Durable session store on SQLite
pub struct SqliteSessionStore {
    database: Database,
}

impl SqliteSessionStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        Ok(Self {
            database: Database::new(db_path)?,
        })
    }

    pub fn database(&self) -> &Database {
        &self.database
    }
}

impl SessionStore for SqliteSessionStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let conn = self.database.get_conn()?;
        let payload = conn
            .query_row(
                "SELECT payload FROM session_state WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(payload)
    }

    fn save(&self, key: &str, payload: &str) -> Result<()> {
        let conn = self.database.get_conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO session_state (key, payload, saved_at)
             VALUES (?1, ?2, datetime('now'))",
            params![key, payload],
        )?;
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<()> {
        let conn = self.database.get_conn()?;
        conn.execute("DELETE FROM session_state WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("sqlite:{}", self.database.path().display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_database_creation() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("test.db");

        let _db = Database::new(&db_path).unwrap();
        assert!(db_path.exists());
    }

    #[test]
    fn test_migrations() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let db = Database::new(&db_path).unwrap();
        let conn = db.get_conn().unwrap();
        let version: i32 = conn
            .query_row("SELECT MAX(version) FROM _migrations", [], |row| row.get(0))
            .unwrap();

        assert_eq!(version, MIGRATIONS.len() as i32);
    }

    #[test]
    fn test_reopen_does_not_reapply_migrations() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        drop(Database::new(&db_path).unwrap());
        let db = Database::new(&db_path).unwrap();

        let conn = db.get_conn().unwrap();
        let rows: i32 = conn
            .query_row("SELECT COUNT(*) FROM _migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, MIGRATIONS.len() as i32);
    }

    #[test]
    fn test_save_overwrites_previous_value() {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteSessionStore::open(&temp_dir.path().join("test.db")).unwrap();

        assert!(store.load("k").unwrap().is_none());

        store.save("k", "first").unwrap();
        store.save("k", "second").unwrap();
        assert_eq!(store.load("k").unwrap().as_deref(), Some("second"));

        let conn = store.database().get_conn().unwrap();
        let rows: i32 = conn
            .query_row("SELECT COUNT(*) FROM session_state", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_clear() {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteSessionStore::open(&temp_dir.path().join("test.db")).unwrap();

        store.save("k", "value").unwrap();
        store.clear("k").unwrap();
        assert!(store.load("k").unwrap().is_none());

        // Clearing a missing key is fine
        store.clear("k").unwrap();
    }
}
