//! Session context for the in-memory key
//!
//! The session key is shared state between the master-key manager (which
//! creates and destroys it) and the credential stores (which use it). Rather
//! than a process-global, it lives in an explicit cloneable handle so
//! multiple independent vaults can coexist in one process.

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::crypto::SessionKey;
use crate::error::{Result, VaultError};

/// Shared handle to the current session key.
///
/// Cloning the handle shares the underlying slot; clearing it through any
/// clone locks every component holding the same session.
#[derive(Clone, Default)]
pub struct VaultSession {
    key: Arc<RwLock<Option<SessionKey>>>,
}

impl VaultSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a session key (successful initialize or unlock)
    pub async fn set(&self, key: SessionKey) {
        *self.key.write().await = Some(key);
    }

    /// Discard the session key (lock)
    pub async fn clear(&self) {
        *self.key.write().await = None;
    }

    pub async fn is_unlocked(&self) -> bool {
        self.key.read().await.is_some()
    }

    /// The session key, or [`VaultError::Locked`] when none is set
    pub async fn key(&self) -> Result<SessionKey> {
        self.try_key().await.ok_or(VaultError::Locked)
    }

    /// The session key if one is set
    pub async fn try_key(&self) -> Option<SessionKey> {
        self.key.read().await.clone()
    }
}
