//! Error types for vault-core

use thiserror::Error;

/// Result type alias for vault operations
pub type Result<T> = std::result::Result<T, VaultError>;

/// Vault error types
///
/// All variants are recoverable: callers surface a message and keep the
/// session usable. [`VaultError::Crypto`] deliberately conflates "wrong
/// password" and "corrupted data" - AEAD cannot distinguish them, and the
/// ambiguity must never be resolved in favor of weaker verification.
#[derive(Error, Debug)]
pub enum VaultError {
    #[error("validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("credential not found: {0}")]
    NotFound(String),

    #[error("vault is locked - unlock with the master password first")]
    Locked,

    #[error("master password has not been set")]
    NotInitialized,

    #[error("master password is already set")]
    AlreadyInitialized,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("wrong password or corrupted data: {0}")]
    Crypto(String),

    #[error("malformed backup file: {0}")]
    MalformedBackup(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
