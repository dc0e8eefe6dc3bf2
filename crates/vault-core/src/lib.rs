//! # vault-core
//!
//! Core engine for the Passvault password manager:
//! - PBKDF2-HMAC-SHA256 key derivation and AES-256-GCM envelope encryption
//! - Master-password lifecycle with an encrypted verification record
//! - Encrypted credential collection with CRUD and search
//! - Password-protected backup files with conflict-aware import merge
//! - Remote row-store mode with per-credential encryption
//!
//! Rendering, transports, and durable byte storage are collaborators behind
//! traits; this crate owns everything security-critical in between.

pub mod backup;
pub mod crypto;
pub mod error;
pub mod master_key;
pub mod merge;
pub mod remote;
pub mod session;
pub mod storage;
pub mod store;
mod vault;

pub use backup::{export_collection, import_collection, BackupFile, BackupPayload, BACKUP_VERSION};
pub use crypto::{
    decrypt, decrypt_string, derive_key, encrypt, encrypt_string, generate_nonce, generate_salt,
    Envelope, SessionKey,
};
pub use error::{Result, VaultError};
pub use master_key::{MasterKeyManager, MasterKeyRecord, VaultState};
pub use merge::{conflict_key, detect_conflicts, merge, MergeOutcome, MergeStrategy};
pub use remote::{CredentialRow, CredentialRowStore, RemoteCredentialStore};
pub use session::VaultSession;
pub use storage::{FileStorage, MemoryStorage, VaultStorage};
pub use store::{Credential, CredentialInput, CredentialStore};
pub use vault::{MergeReport, Vault};
