//! JSON file backed read-state store

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{RealtimeError, Result};
use crate::types::ReadStateMap;
use crate::types::options::READ_STATE_STORAGE_KEY;

use super::ReadStateStore;

/// Stores the read-state mapping as one JSON document named after its key
#[derive(Debug, Clone)]
pub struct FileReadStateStore {
    path: PathBuf,
}

impl FileReadStateStore {
    /// Store under `dir` using the default storage key
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self::with_key(dir, READ_STATE_STORAGE_KEY)
    }

    /// Store under `dir` using a custom storage key
    pub fn with_key(dir: impl AsRef<Path>, key: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{key}.json")),
        }
    }

    /// Location of the backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<ReadStateMap> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(ReadStateMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ReadStateMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, state: &ReadStateMap) -> Result<()> {
        let dir = self
            .path
            .parent()
            .ok_or_else(|| RealtimeError::storage("read-state path has no parent directory"))?;
        fs::create_dir_all(dir)?;

        let body = serde_json::to_vec(state)?;
        let tmp = self.path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&body)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl ReadStateStore for FileReadStateStore {
    fn get(&self) -> ReadStateMap {
        self.read().unwrap_or_else(|e| {
            log::warn!(
                "Failed to load read state from {}: {e}",
                self.path.display()
            );
            ReadStateMap::new()
        })
    }

    fn set(&self, state: &ReadStateMap) {
        if let Err(e) = self.write(state) {
            log::warn!("Failed to save read state to {}: {e}", self.path.display());
        }
    }
}
