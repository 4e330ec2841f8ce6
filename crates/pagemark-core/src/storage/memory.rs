//! In-memory storage implementation.

use std::collections::HashMap;
use std::sync::RwLock;

use super::{AnnotationSet, BoxFuture, Storage, StorageError, StorageResult};

/// In-memory storage for testing and ephemeral use.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    sets: RwLock<HashMap<String, AnnotationSet>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Other(format!("Lock error: {e}"))
}

impl Storage for MemoryStorage {
    fn save(&self, key: &str, set: &AnnotationSet) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();
        let set = set.clone();
        Box::pin(async move {
            self.sets.write().map_err(lock_error)?.insert(key, set);
            Ok(())
        })
    }

    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<AnnotationSet>> {
        let key = key.to_string();
        Box::pin(async move {
            let sets = self.sets.read().map_err(lock_error)?;
            sets.get(&key).cloned().ok_or(StorageError::NotFound(key))
        })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();
        Box::pin(async move {
            self.sets.write().map_err(lock_error)?.remove(&key);
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move { Ok(self.sets.read().map_err(lock_error)?.keys().cloned().collect()) })
    }

    fn exists(&self, key: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let key = key.to_string();
        Box::pin(async move { Ok(self.sets.read().map_err(lock_error)?.contains_key(&key)) })
    }
}
