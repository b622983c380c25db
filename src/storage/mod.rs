//! Durable storage for persisted result sessions
//!
//! A session store is a tiny key/value contract: whole payloads in, whole
//! payloads out, never patched in place.

pub mod database;
mod file;
mod memory;

pub use database::{Database, DbPool, SqliteSessionStore};
pub use file::JsonFileSessionStore;
pub use memory::MemorySessionStore;

use crate::config::{StorageBackend, StorageConfig};
use crate::error::Result;
use std::path::Path;
use std::sync::Arc;

/// Key/value store holding serialized sessions
pub trait SessionStore: Send + Sync {
    /// Read the payload stored under `key`
    fn load(&self, key: &str) -> Result<Option<String>>;

    /// Replace the payload stored under `key`
    fn save(&self, key: &str, payload: &str) -> Result<()>;

    /// Remove `key`; removing a missing key is not an error
    fn clear(&self, key: &str) -> Result<()>;

    /// Short description for status output
    fn describe(&self) -> String;
}

/// Open the store selected by configuration under `data_dir`
pub fn open_store(config: &StorageConfig, data_dir: &Path) -> Result<Arc<dyn SessionStore>> {
    let store: Arc<dyn SessionStore> = match config.backend {
        StorageBackend::Sqlite => {
            Arc::new(SqliteSessionStore::open(&data_dir.join("careseek.sqlite"))?)
        }
        StorageBackend::Json => Arc::new(JsonFileSessionStore::new(data_dir.join("sessions"))?),
    };

    tracing::debug!("Opened session store {}", store.describe());
    Ok(store)
}
