//! Vault facade wiring session, master key, store, and backup flows

use std::sync::Arc;
use tracing::info;

use crate::backup::{self, BackupFile};
use crate::error::Result;
use crate::master_key::{MasterKeyManager, VaultState};
use crate::merge::{self, MergeStrategy};
use crate::session::VaultSession;
use crate::storage::VaultStorage;
use crate::store::CredentialStore;

/// Summary of an applied backup import
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeReport {
    pub added: usize,
    pub updated: usize,
    pub skipped: usize,
}

/// One installation's vault: master-key lifecycle plus the credential store,
/// sharing a single session context.
pub struct Vault {
    storage: Arc<dyn VaultStorage>,
    session: VaultSession,
    master: MasterKeyManager,
    credentials: CredentialStore,
}

impl Vault {
    pub fn new(storage: Arc<dyn VaultStorage>) -> Self {
        let session = VaultSession::new();
        let master = MasterKeyManager::new(storage.clone(), session.clone());
        let credentials = CredentialStore::new(storage.clone(), session.clone());

        Self {
            storage,
            session,
            master,
            credentials,
        }
    }

    pub async fn state(&self) -> Result<VaultState> {
        self.master.state().await
    }

    pub async fn is_initialized(&self) -> Result<bool> {
        self.master.is_initialized().await
    }

    /// Set the master password for the first time (also unlocks)
    pub async fn initialize(&self, password: &str) -> Result<()> {
        self.master.initialize(password).await
    }

    /// Verify the master password; on success load the credential collection.
    ///
    /// Returns `Ok(false)` on a wrong password.
    pub async fn unlock(&self, password: &str) -> Result<bool> {
        if !self.master.unlock(password).await? {
            return Ok(false);
        }
        self.credentials.load_all().await?;
        Ok(true)
    }

    /// Discard the session key and the decrypted credential cache
    pub async fn lock(&self) {
        self.master.lock().await;
        self.credentials.clear_cache().await;
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Export the current collection as a standalone encrypted backup file.
    ///
    /// The backup key comes from `export_password`, not the session key, so
    /// the file can be restored on a fresh installation.
    pub async fn export_backup(&self, export_password: &str) -> Result<BackupFile> {
        self.session.key().await?;

        let credentials = self.credentials.get_all().await;
        backup::export_collection(&credentials, export_password)
    }

    /// Decrypt a backup file, merge it into the collection, and persist.
    pub async fn import_backup(
        &self,
        file: &BackupFile,
        import_password: &str,
        strategy: MergeStrategy,
    ) -> Result<MergeReport> {
        self.session.key().await?;

        let payload = backup::import_collection(file, import_password)?;
        let existing = self.credentials.get_all().await;
        let outcome = merge::merge(&payload.credentials, &existing, strategy);

        self.credentials.replace_all(outcome.result).await?;

        info!(
            "imported backup: {} added, {} updated, {} skipped",
            outcome.added, outcome.updated, outcome.skipped
        );
        Ok(MergeReport {
            added: outcome.added,
            updated: outcome.updated,
            skipped: outcome.skipped,
        })
    }

    /// Wipe all stored data and return to `Uninitialized`. Irreversible.
    pub async fn reset(&self) -> Result<()> {
        self.storage.clear().await?;
        self.session.clear().await;
        self.credentials.clear_cache().await;

        info!("vault reset");
        Ok(())
    }
}
