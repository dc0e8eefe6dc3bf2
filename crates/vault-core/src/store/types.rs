//! Credential record types and input validation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, VaultError};

/// Version of the persisted collection format
pub const COLLECTION_VERSION: u32 = 1;

pub(crate) fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

/// A stored site credential.
///
/// `id` is immutable after creation and unique within the collection.
/// `created_at` is set once; `updated_at` never decreases across updates to
/// the same record. Timestamps default to the Unix epoch when absent from
/// legacy or imported payloads, which makes "missing" lose every
/// newer-wins comparison.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub id: Uuid,
    pub site_name: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default = "epoch")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "epoch")]
    pub updated_at: DateTime<Utc>,
}

impl Credential {
    /// Mint a new credential from validated input, with a fresh id and both
    /// timestamps set to now.
    pub fn new(input: &CredentialInput) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            site_name: input.site_name.trim().to_string(),
            username: input.username.trim().to_string(),
            password: input.password.clone(),
            notes: input.notes.trim().to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite user-editable fields, preserving `id` and `created_at` and
    /// bumping `updated_at`.
    pub(crate) fn apply(&mut self, input: &CredentialInput) {
        self.site_name = input.site_name.trim().to_string();
        self.username = input.username.trim().to_string();
        self.password = input.password.clone();
        self.notes = input.notes.trim().to_string();
        self.updated_at = Utc::now();
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("id", &self.id)
            .field("site_name", &self.site_name)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("notes", &self.notes)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// User-supplied fields for creating or updating a credential
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialInput {
    pub site_name: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub notes: String,
}

impl CredentialInput {
    /// Check that site name, username, and password are non-empty after
    /// trimming. Collects every violation rather than stopping at the first.
    pub fn validate(&self) -> Result<()> {
        let mut violations = Vec::new();

        if self.site_name.trim().is_empty() {
            violations.push("siteName must not be empty".to_string());
        }
        if self.username.trim().is_empty() {
            violations.push("username must not be empty".to_string());
        }
        if self.password.trim().is_empty() {
            violations.push("password must not be empty".to_string());
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(VaultError::Validation(violations))
        }
    }
}

impl std::fmt::Debug for CredentialInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialInput")
            .field("site_name", &self.site_name)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("notes", &self.notes)
            .finish()
    }
}

/// Persisted plaintext form of the collection (before envelope encryption)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionFile {
    pub version: u32,
    pub credentials: Vec<Credential>,
}
