//! In-memory secure storage.

use crate::error::StorageError;
use crate::providers::SecureStorage;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// [`SecureStorage`] backed by a shared `HashMap`.
///
/// Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct InMemorySecureStorage {
    entries: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    read_only: bool,
}

impl InMemorySecureStorage {
    /// Empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that rejects every write, for exercising failure paths.
    #[must_use]
    pub fn read_only() -> Self {
        Self {
            read_only: true,
            ..Self::default()
        }
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    /// Whether nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn writable(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>>, StorageError> {
        if self.read_only {
            return Err(StorageError::Unavailable("read-only".to_string()));
        }
        self.lock()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>>, StorageError> {
        self.entries
            .lock()
            .map_err(|_| StorageError::Unavailable("poisoned".to_string()))
    }
}

impl SecureStorage for InMemorySecureStorage {
    fn save(&self, data: &[u8], key: &str) -> Result<(), StorageError> {
        self.writable()?.insert(key.to_string(), data.to_vec());
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.writable()?.remove(key);
        Ok(())
    }
}
