//! JSON file session store
//!
//! Each key is one file under the store directory. Writes go to a sibling
//! temp file that is renamed over the target, so a reader sees either the
//! old payload or the new one.

use crate::error::{CareseekError, Result};
use crate::storage::SessionStore;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct JsonFileSessionStore {
    dir: PathBuf,
}

impl JsonFileSessionStore {
    pub fn new(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir).map_err(|e| CareseekError::Io {
            source: e,
            context: format!("Failed to create session directory: {}", dir.display()),
        })?;
        Ok(Self { dir })
    }

    /// Path of the file holding `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", file_name))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SessionStore for JsonFileSessionStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path).map_err(|e| CareseekError::Io {
            source: e,
            context: format!("Failed to read session file: {}", path.display()),
        })?;
        Ok(Some(content))
    }

    fn save(&self, key: &str, payload: &str) -> Result<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");

        std::fs::write(&tmp, payload).map_err(|e| CareseekError::Io {
            source: e,
            context: format!("Failed to write session file: {}", tmp.display()),
        })?;
        std::fs::rename(&tmp, &path).map_err(|e| CareseekError::Io {
            source: e,
            context: format!("Failed to replace session file: {}", path.display()),
        })?;

        Ok(())
    }

    fn clear(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        if path.exists() {
            std::fs::remove_file(&path).map_err(|e| CareseekError::Io {
                source: e,
                context: format!("Failed to delete session file: {}", path.display()),
            })?;
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("json:{}", self.dir.display())
    }
}
