//! Master-password lifecycle and verification
//!
//! The persisted record holds only a random salt and a fixed constant
//! encrypted under the derived key. Unlocking re-derives a candidate key and
//! attempts to decrypt that constant - a cheap wrong-password check that
//! never stores or transmits the password itself and never touches the
//! credential collection.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::crypto::{self, derive_key, Envelope, SessionKey, SALT_LEN};
use crate::error::{Result, VaultError};
use crate::session::VaultSession;
use crate::storage::VaultStorage;

/// Storage key for the master-key record
pub const MASTER_RECORD_KEY: &str = "master";

/// Fixed plaintext encrypted into the verification envelope
const VERIFICATION_PLAINTEXT: &str = "passvault-verification";

/// Lifecycle state of the vault
///
/// `Uninitialized -> Locked -> Unlocked`, with `Unlocked -> Locked`
/// re-lockable indefinitely. There is no way back to `Uninitialized` short
/// of wiping storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultState {
    /// No master password has been set
    Uninitialized,
    /// Master password set, session key absent
    Locked,
    /// Session key present
    Unlocked,
}

/// Persisted master-password record, one per installation.
///
/// Never contains the password or the derived key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterKeyRecord {
    #[serde(with = "crate::crypto::encoding::base64_fixed")]
    pub salt: [u8; SALT_LEN],
    pub verification: Envelope,
}

/// Owns the initialize/unlock/lock state machine and the session key slot
pub struct MasterKeyManager {
    storage: Arc<dyn VaultStorage>,
    session: VaultSession,
}

impl MasterKeyManager {
    pub fn new(storage: Arc<dyn VaultStorage>, session: VaultSession) -> Self {
        Self { storage, session }
    }

    /// True iff a master-key record exists in storage
    pub async fn is_initialized(&self) -> Result<bool> {
        self.storage.exists(MASTER_RECORD_KEY).await
    }

    pub async fn state(&self) -> Result<VaultState> {
        if !self.is_initialized().await? {
            return Ok(VaultState::Uninitialized);
        }
        if self.session.is_unlocked().await {
            Ok(VaultState::Unlocked)
        } else {
            Ok(VaultState::Locked)
        }
    }

    /// Set the master password for the first time.
    ///
    /// Generates a fresh salt, persists the verification record, and installs
    /// the session key - initializing also unlocks.
    pub async fn initialize(&self, password: &str) -> Result<()> {
        if self.is_initialized().await? {
            return Err(VaultError::AlreadyInitialized);
        }
        if password.is_empty() {
            return Err(VaultError::InvalidInput(
                "master password must not be empty".to_string(),
            ));
        }

        let salt = crypto::generate_salt();
        let key = derive_key(password, &salt);
        let verification = crypto::encrypt(VERIFICATION_PLAINTEXT.as_bytes(), &key)?;

        let record = MasterKeyRecord { salt, verification };
        self.storage
            .store(MASTER_RECORD_KEY, &serde_json::to_vec(&record)?)
            .await?;

        self.session.set(key).await;

        info!("master password initialized");
        Ok(())
    }

    /// Verify the master password and install the session key.
    ///
    /// Returns `Ok(false)` on a wrong password - a failed authentication tag
    /// is user error, not a system error. Only missing records and transport
    /// failures surface as `Err`.
    pub async fn unlock(&self, password: &str) -> Result<bool> {
        let raw = self
            .storage
            .retrieve(MASTER_RECORD_KEY)
            .await?
            .ok_or(VaultError::NotInitialized)?;
        let record: MasterKeyRecord = serde_json::from_slice(&raw)?;

        // Always re-derive against the stored salt; keys are never reused
        // across salts.
        let candidate = derive_key(password, &record.salt);

        match crypto::decrypt(&record.verification, &candidate) {
            Ok(plaintext) if plaintext == VERIFICATION_PLAINTEXT.as_bytes() => {
                self.session.set(candidate).await;
                debug!("master key verified");
                Ok(true)
            }
            Ok(_) => {
                debug!("verification plaintext mismatch");
                Ok(false)
            }
            Err(VaultError::Crypto(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Discard the session key.
    ///
    /// Callers holding a decrypted credential cache must clear it as well;
    /// see [`crate::Vault::lock`].
    pub async fn lock(&self) {
        self.session.clear().await;
        info!("vault locked");
    }

    /// The current session key, if unlocked
    pub async fn session_key(&self) -> Option<SessionKey> {
        self.session.try_key().await
    }
}
