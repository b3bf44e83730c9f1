//! In-memory result store for testing.

use crate::core::{ScanError, ScanResponse};
use crate::output::traits::ResultStore;

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

/// Keeps responses in a map instead of writing files.
#[derive(Debug, Default)]
pub struct MemoryResultStore {
    entries: RwLock<HashMap<String, ScanResponse>>,
    read_only: RwLock<HashSet<String>>,
}

impl MemoryResultStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes writes for `name` fail as if the destination were not writable.
    pub fn with_write_failure_for(self, name: impl Into<String>) -> Self {
        self.read_only.write().unwrap().insert(name.into());
        self
    }

    /// Returns the stored response for `name`.
    pub fn get(&self, name: &str) -> Option<ScanResponse> {
        self.entries.read().unwrap().get(name).cloned()
    }

    /// Returns the number of stored responses.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    /// Returns `true` if nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ResultStore for MemoryResultStore {
    async fn write(&self, name: &str, response: &ScanResponse) -> Result<String, ScanError> {
        if self.read_only.read().unwrap().contains(name) {
            return Err(ScanError::WriteFailed {
                path: name.into(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            });
        }
        self.entries
            .write()
            .unwrap()
            .insert(name.to_string(), response.clone());
        Ok(format!("memory:{}", name))
    }
}
