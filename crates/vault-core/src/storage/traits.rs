//! Storage trait definitions

use async_trait::async_trait;

use crate::error::Result;

/// Opaque persistent key-value collaborator.
///
/// Values are opaque byte sequences; callers encrypt before storing.
/// Transport failures surface as [`crate::VaultError::Storage`] or
/// [`crate::VaultError::Io`] - never as a crypto error, so they cannot be
/// mistaken for a wrong password.
#[async_trait]
pub trait VaultStorage: Send + Sync {
    /// Store a value under the given key, replacing any previous value
    async fn store(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Retrieve a value by key
    async fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Delete a value by key (no-op if absent)
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check if a key exists
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Remove all stored data
    async fn clear(&self) -> Result<()>;

    /// Get a human-readable name for this storage backend
    fn backend_name(&self) -> &'static str;
}
