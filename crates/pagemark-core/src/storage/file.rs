//! File-based storage implementation for native platforms.

use std::fs;
use std::path::{Path, PathBuf};

use super::{AnnotationSet, BoxFuture, Storage, StorageError, StorageResult};

/// Stores each annotation set as a JSON file in a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a file storage rooted at `base_path`, creating the directory if needed.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path)
                .map_err(|e| StorageError::Io(format!("Failed to create storage directory: {e}")))?;
        }
        Ok(Self { base_path })
    }

    /// Create file storage in the default location.
    ///
    /// On Unix: `~/.local/share/pagemark/annotations/`
    /// On Windows: `%LOCALAPPDATA%\pagemark\annotations\`
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;
        Self::new(base.join("pagemark").join("annotations"))
    }

    /// File path for a key. Characters unsafe in file names become `_`.
    fn set_path(&self, key: &str) -> PathBuf {
        let safe_key: String = key
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.base_path.join(format!("{safe_key}.json"))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

impl Storage for FileStorage {
    fn save(&self, key: &str, set: &AnnotationSet) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.set_path(key);
        let json = set.to_json();
        Box::pin(async move {
            let json = json.map_err(|e| StorageError::Serialization(e.to_string()))?;
            fs::write(&path, json).map_err(|e| StorageError::Io(format!("Failed to write {}: {e}", path.display())))?;
            log::debug!("Saved annotations to {}", path.display());
            Ok(())
        })
    }

    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<AnnotationSet>> {
        let path = self.set_path(key);
        let key = key.to_string();
        Box::pin(async move {
            if !path.exists() {
                return Err(StorageError::NotFound(key));
            }
            let json = fs::read_to_string(&path)
                .map_err(|e| StorageError::Io(format!("Failed to read {}: {e}", path.display())))?;
            AnnotationSet::from_json(&json)
                .map_err(|e| StorageError::Serialization(format!("Failed to parse {}: {e}", path.display())))
        })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.set_path(key);
        Box::pin(async move {
            if path.exists() {
                fs::remove_file(&path)
                    .map_err(|e| StorageError::Io(format!("Failed to delete {}: {e}", path.display())))?;
            }
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        let base = self.base_path.clone();
        Box::pin(async move {
            if !base.exists() {
                return Ok(Vec::new());
            }
            let entries = fs::read_dir(&base).map_err(|e| StorageError::Io(format!("Failed to read directory: {e}")))?;
            let keys = entries
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
                .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
                .collect();
            Ok(keys)
        })
    }

    fn exists(&self, key: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let path = self.set_path(key);
        Box::pin(async move { Ok(path.exists()) })
    }
}
