//! Encrypted backup export and import
//!
//! Backup files are self-contained: they carry their own salt, so they can
//! be decrypted on a fresh installation regardless of the device's
//! master-password state. The export key is derived from the export password
//! and a fresh salt, never from the session key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::crypto::{self, derive_key, Envelope, NONCE_LEN, SALT_LEN};
use crate::error::{Result, VaultError};
use crate::store::Credential;

/// Backup file format version
pub const BACKUP_VERSION: &str = "1.0";

/// Versioned, self-contained encrypted backup file.
///
/// The nonce serializes as `iv` for compatibility with files written by the
/// web client; `nonce` is accepted on input.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupFile {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    #[serde(with = "crate::crypto::encoding::base64_fixed")]
    pub salt: [u8; SALT_LEN],
    #[serde(rename = "iv", alias = "nonce", with = "crate::crypto::encoding::base64_fixed")]
    pub nonce: [u8; NONCE_LEN],
    #[serde(with = "crate::crypto::encoding::base64_vec")]
    pub ciphertext: Vec<u8>,
}

/// Decrypted backup payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupPayload {
    pub credentials: Vec<Credential>,
    pub exported_at: DateTime<Utc>,
}

impl BackupFile {
    /// Parse a backup file from JSON text.
    ///
    /// Structural problems are reported as [`VaultError::MalformedBackup`]
    /// naming the offending field, before any key derivation happens.
    pub fn parse(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|_| VaultError::MalformedBackup("not a valid JSON object".to_string()))?;
        let object = value
            .as_object()
            .ok_or_else(|| VaultError::MalformedBackup("not a valid JSON object".to_string()))?;

        for field in ["version", "exportedAt", "salt", "ciphertext"] {
            let present = matches!(object.get(field), Some(Value::String(s)) if !s.is_empty());
            if !present {
                return Err(VaultError::MalformedBackup(format!(
                    "missing or empty field `{}`",
                    field
                )));
            }
        }
        let has_nonce = ["iv", "nonce"]
            .iter()
            .any(|field| matches!(object.get(*field), Some(Value::String(s)) if !s.is_empty()));
        if !has_nonce {
            return Err(VaultError::MalformedBackup(
                "missing or empty field `iv`".to_string(),
            ));
        }

        serde_json::from_value(value).map_err(|e| VaultError::MalformedBackup(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Encrypt a credential collection into a standalone backup file.
///
/// Derives a fresh key from `export_password` and a fresh salt, distinct
/// from the installation's master-key salt.
pub fn export_collection(
    credentials: &[Credential],
    export_password: &str,
) -> Result<BackupFile> {
    if export_password.is_empty() {
        return Err(VaultError::InvalidInput(
            "export password must not be empty".to_string(),
        ));
    }

    let salt = crypto::generate_salt();
    let key = derive_key(export_password, &salt);
    let exported_at = Utc::now();

    let payload = BackupPayload {
        credentials: credentials.to_vec(),
        exported_at,
    };
    let envelope = crypto::encrypt(&serde_json::to_vec(&payload)?, &key)?;

    info!("exported {} credentials", credentials.len());
    Ok(BackupFile {
        version: BACKUP_VERSION.to_string(),
        exported_at,
        salt,
        nonce: envelope.nonce,
        ciphertext: envelope.ciphertext,
    })
}

/// Decrypt a backup file with the given password.
///
/// An authentication failure surfaces as [`VaultError::Crypto`] - wrong
/// password and corrupted data are indistinguishable by design. A payload
/// that decrypts but is not a credential collection is
/// [`VaultError::MalformedBackup`].
pub fn import_collection(file: &BackupFile, import_password: &str) -> Result<BackupPayload> {
    let key = derive_key(import_password, &file.salt);
    let envelope = Envelope {
        nonce: file.nonce,
        ciphertext: file.ciphertext.clone(),
    };

    let plaintext = crypto::decrypt(&envelope, &key)?;

    let payload: BackupPayload = serde_json::from_slice(&plaintext).map_err(|e| {
        VaultError::MalformedBackup(format!("decrypted payload is not a credential collection: {}", e))
    })?;

    info!("imported backup of {} credentials", payload.credentials.len());
    Ok(payload)
}
