//! File-backed key-value store: one `<key>.json` file per record.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use localchat_core::{KeyValueStore, StorageError};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            StorageError::Backend(format!("cannot create {}: {}", dir.display(), e))
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Backend(format!(
                "cannot read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        // Write to a sibling temp file, then rename over the record.
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, value)
            .and_then(|()| fs::rename(&temp_path, &path))
            .map_err(|e| {
                StorageError::Backend(format!("cannot write {}: {}", path.display(), e))
            })?;
        debug!(key, bytes = value.len(), "Saved record");
        Ok(())
    }
}
