//! Remote row-store mode
//!
//! Alternate persistence shape for installations backed by a remote row
//! store instead of the local envelope: each credential is one row, and only
//! the password field is ciphertext. The transport itself is a collaborator
//! behind [`CredentialRowStore`]; this module owns the per-credential
//! encryption and the same validation and error taxonomy as the local store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::crypto::{self, Envelope};
use crate::error::{Result, VaultError};
use crate::session::VaultSession;
use crate::store::{Credential, CredentialInput};

/// One credential as held by the remote collaborator.
///
/// Plaintext metadata plus the password envelope; the remote side never sees
/// a decryption key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRow {
    pub id: Uuid,
    pub user_id: String,
    pub site_name: String,
    pub username: String,
    pub encrypted_password: Envelope,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row-level operations the remote backend must provide
#[async_trait]
pub trait CredentialRowStore: Send + Sync {
    async fn insert(&self, row: CredentialRow) -> Result<()>;

    /// Replace the row whose id matches `row.id`
    async fn update(&self, row: CredentialRow) -> Result<()>;

    async fn delete(&self, id: Uuid) -> Result<()>;

    /// All rows for the current user, newest first (`created_at` descending)
    async fn select_all(&self) -> Result<Vec<CredentialRow>>;
}

/// Credential operations over a remote row store
pub struct RemoteCredentialStore {
    rows: Arc<dyn CredentialRowStore>,
    session: VaultSession,
    user_id: String,
}

impl RemoteCredentialStore {
    pub fn new(
        rows: Arc<dyn CredentialRowStore>,
        session: VaultSession,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            rows,
            session,
            user_id: user_id.into(),
        }
    }

    pub async fn add(&self, input: &CredentialInput) -> Result<Credential> {
        input.validate()?;
        let key = self.session.key().await?;

        let credential = Credential::new(input);
        let row = CredentialRow {
            id: credential.id,
            user_id: self.user_id.clone(),
            site_name: credential.site_name.clone(),
            username: credential.username.clone(),
            encrypted_password: crypto::encrypt_string(&credential.password, &key)?,
            notes: credential.notes.clone(),
            created_at: credential.created_at,
            updated_at: credential.updated_at,
        };
        self.rows.insert(row).await?;

        info!("added remote credential {}", credential.id);
        Ok(credential)
    }

    pub async fn update(&self, id: Uuid, input: &CredentialInput) -> Result<Credential> {
        input.validate()?;
        let key = self.session.key().await?;

        let rows = self.rows.select_all().await?;
        let current = rows
            .into_iter()
            .find(|row| row.id == id)
            .ok_or_else(|| VaultError::NotFound(id.to_string()))?;

        let credential = Credential {
            id: current.id,
            site_name: input.site_name.trim().to_string(),
            username: input.username.trim().to_string(),
            password: input.password.clone(),
            notes: input.notes.trim().to_string(),
            created_at: current.created_at,
            updated_at: Utc::now(),
        };
        let row = CredentialRow {
            id: credential.id,
            user_id: current.user_id,
            site_name: credential.site_name.clone(),
            username: credential.username.clone(),
            // Fresh nonce on every re-encryption
            encrypted_password: crypto::encrypt_string(&credential.password, &key)?,
            notes: credential.notes.clone(),
            created_at: credential.created_at,
            updated_at: credential.updated_at,
        };
        self.rows.update(row).await?;

        info!("updated remote credential {}", id);
        Ok(credential)
    }

    pub async fn remove(&self, id: Uuid) -> Result<()> {
        self.session.key().await?;
        self.rows.delete(id).await?;

        info!("removed remote credential {}", id);
        Ok(())
    }

    /// Fetch and decrypt every credential, newest first
    pub async fn fetch_all(&self) -> Result<Vec<Credential>> {
        let key = self.session.key().await?;

        let rows = self.rows.select_all().await?;
        debug!("fetched {} remote rows", rows.len());

        rows.into_iter()
            .map(|row| {
                let password = crypto::decrypt_string(&row.encrypted_password, &key)?;
                Ok(Credential {
                    id: row.id,
                    site_name: row.site_name,
                    username: row.username,
                    password,
                    notes: row.notes,
                    created_at: row.created_at,
                    updated_at: row.updated_at,
                })
            })
            .collect()
    }

    /// Case-insensitive substring search over site name and username
    pub async fn search(&self, query: &str) -> Result<Vec<Credential>> {
        let credentials = self.fetch_all().await?;
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(credentials);
        }

        Ok(credentials
            .into_iter()
            .filter(|c| {
                c.site_name.to_lowercase().contains(&needle)
                    || c.username.to_lowercase().contains(&needle)
            })
            .collect())
    }
}
