//! Credential store: in-memory collection with encrypted persistence
//!
//! The in-memory cache is the single source of truth while unlocked; storage
//! only ever holds the encrypted envelope. Every mutation re-serializes the
//! whole collection and re-encrypts it with a fresh nonce - there are no
//! partial updates. Callers must serialize mutating calls; the store has no
//! internal cross-call locking and last writer wins.

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::types::{CollectionFile, Credential, CredentialInput, COLLECTION_VERSION};
use crate::crypto::{self, Envelope};
use crate::error::{Result, VaultError};
use crate::session::VaultSession;
use crate::storage::VaultStorage;

/// Storage key for the encrypted credential collection
pub const CREDENTIALS_KEY: &str = "credentials";

/// Authoritative credential collection, guarded by "must be unlocked"
pub struct CredentialStore {
    storage: Arc<dyn VaultStorage>,
    session: VaultSession,
    cache: RwLock<Vec<Credential>>,
}

impl CredentialStore {
    pub fn new(storage: Arc<dyn VaultStorage>, session: VaultSession) -> Self {
        Self {
            storage,
            session,
            cache: RwLock::new(Vec::new()),
        }
    }

    /// Decrypt and load the persisted collection into the cache.
    ///
    /// No persisted envelope means first use: an empty collection. A
    /// malformed envelope or an unrecognized decrypted payload degrades to an
    /// empty collection rather than aborting the session; an authentication
    /// failure propagates as [`VaultError::Crypto`], since post-unlock it
    /// means corrupted data rather than a wrong password.
    pub async fn load_all(&self) -> Result<Vec<Credential>> {
        let key = self.session.key().await?;

        let Some(raw) = self.storage.retrieve(CREDENTIALS_KEY).await? else {
            debug!("no persisted credential envelope, starting empty");
            self.cache.write().await.clear();
            return Ok(Vec::new());
        };

        let envelope: Envelope = match serde_json::from_slice(&raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("persisted credential envelope is malformed, starting empty: {}", e);
                self.cache.write().await.clear();
                return Ok(Vec::new());
            }
        };

        let plaintext = crypto::decrypt(&envelope, &key)?;
        let credentials = Self::deserialize_collection(&plaintext);

        debug!("loaded {} credentials", credentials.len());
        *self.cache.write().await = credentials.clone();
        Ok(credentials)
    }

    fn deserialize_collection(plaintext: &[u8]) -> Vec<Credential> {
        if let Ok(file) = serde_json::from_slice::<CollectionFile>(plaintext) {
            if file.version == COLLECTION_VERSION {
                return file.credentials;
            }
        }
        // Legacy payloads were a bare credential array
        if let Ok(credentials) = serde_json::from_slice::<Vec<Credential>>(plaintext) {
            return credentials;
        }
        warn!("unrecognized credential payload, starting empty");
        Vec::new()
    }

    async fn save_all(&self) -> Result<()> {
        let key = self.session.key().await?;

        let file = CollectionFile {
            version: COLLECTION_VERSION,
            credentials: self.cache.read().await.clone(),
        };
        let plaintext = serde_json::to_vec(&file)?;
        let envelope = crypto::encrypt(&plaintext, &key)?;

        self.storage
            .store(CREDENTIALS_KEY, &serde_json::to_vec(&envelope)?)
            .await?;

        debug!("persisted {} credentials", file.credentials.len());
        Ok(())
    }

    /// Snapshot of the collection in insertion order (defensive copy)
    pub async fn get_all(&self) -> Vec<Credential> {
        self.cache.read().await.clone()
    }

    pub async fn get_by_id(&self, id: Uuid) -> Option<Credential> {
        self.cache.read().await.iter().find(|c| c.id == id).cloned()
    }

    /// Validate, append, and persist a new credential
    pub async fn add(&self, input: &CredentialInput) -> Result<Credential> {
        input.validate()?;
        self.session.key().await?;

        let credential = Credential::new(input);
        self.cache.write().await.push(credential.clone());
        self.save_all().await?;

        info!("added credential {}", credential.id);
        Ok(credential)
    }

    /// Update an existing credential, preserving `id` and `created_at`
    pub async fn update(&self, id: Uuid, input: &CredentialInput) -> Result<Credential> {
        input.validate()?;
        self.session.key().await?;

        let updated = {
            let mut cache = self.cache.write().await;
            let credential = cache
                .iter_mut()
                .find(|c| c.id == id)
                .ok_or_else(|| VaultError::NotFound(id.to_string()))?;
            credential.apply(input);
            credential.clone()
        };
        self.save_all().await?;

        info!("updated credential {}", id);
        Ok(updated)
    }

    pub async fn remove(&self, id: Uuid) -> Result<()> {
        self.session.key().await?;

        {
            let mut cache = self.cache.write().await;
            let index = cache
                .iter()
                .position(|c| c.id == id)
                .ok_or_else(|| VaultError::NotFound(id.to_string()))?;
            cache.remove(index);
        }
        self.save_all().await?;

        info!("removed credential {}", id);
        Ok(())
    }

    /// Case-insensitive substring search over site name and username.
    ///
    /// A blank query returns the full collection in insertion order.
    pub async fn search(&self, query: &str) -> Vec<Credential> {
        let cache = self.cache.read().await;
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return cache.clone();
        }

        cache
            .iter()
            .filter(|c| {
                c.site_name.to_lowercase().contains(&needle)
                    || c.username.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect()
    }

    /// Replace the whole collection (merge commit path) and persist
    pub async fn replace_all(&self, credentials: Vec<Credential>) -> Result<()> {
        self.session.key().await?;

        *self.cache.write().await = credentials;
        self.save_all().await
    }

    /// Drop the decrypted cache; must be called on lock
    pub async fn clear_cache(&self) {
        self.cache.write().await.clear();
        debug!("credential cache cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{derive_key, generate_salt};
    use crate::storage::MemoryStorage;

    async fn unlocked_store() -> CredentialStore {
        let session = VaultSession::new();
        session.set(derive_key("test-password", &generate_salt())).await;
        CredentialStore::new(Arc::new(MemoryStorage::new()), session)
    }

    fn input(site: &str, user: &str, pass: &str) -> CredentialInput {
        CredentialInput {
            site_name: site.to_string(),
            username: user.to_string(),
            password: pass.to_string(),
            notes: String::new(),
        }
    }

    #[tokio::test]
    async fn test_locked_store_rejects_operations() {
        let store = CredentialStore::new(Arc::new(MemoryStorage::new()), VaultSession::new());

        assert!(matches!(store.load_all().await, Err(VaultError::Locked)));
        assert!(matches!(
            store.add(&input("example.com", "alice", "p1")).await,
            Err(VaultError::Locked)
        ));
    }

    #[tokio::test]
    async fn test_first_use_yields_empty_collection() {
        let store = unlocked_store().await;
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_sets_id_and_timestamps() {
        let store = unlocked_store().await;

        let credential = store.add(&input("example.com", "alice", "p1")).await.unwrap();

        let fetched = store.get_by_id(credential.id).await.unwrap();
        assert_eq!(fetched.created_at, fetched.updated_at);
        assert_eq!(fetched.site_name, "example.com");
    }

    #[tokio::test]
    async fn test_update_preserves_id_and_created_at() {
        let store = unlocked_store().await;
        let original = store.add(&input("example.com", "alice", "p1")).await.unwrap();

        let updated = store
            .update(original.id, &input("example.com", "alice", "p2"))
            .await
            .unwrap();

        assert_eq!(updated.id, original.id);
        assert_eq!(updated.created_at, original.created_at);
        assert!(updated.updated_at > original.updated_at);
        assert_eq!(updated.password, "p2");
    }

    #[tokio::test]
    async fn test_update_missing_id_fails() {
        let store = unlocked_store().await;

        let result = store.update(Uuid::new_v4(), &input("a", "b", "c")).await;
        assert!(matches!(result, Err(VaultError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_remove() {
        let store = unlocked_store().await;
        let credential = store.add(&input("example.com", "alice", "p1")).await.unwrap();

        store.remove(credential.id).await.unwrap();
        assert!(store.get_by_id(credential.id).await.is_none());

        let result = store.remove(credential.id).await;
        assert!(matches!(result, Err(VaultError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_validation_rejects_blank_fields() {
        let store = unlocked_store().await;

        let result = store.add(&input("  ", "alice", "")).await;
        match result {
            Err(VaultError::Validation(violations)) => assert_eq!(violations.len(), 2),
            other => panic!("expected Validation error, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn test_search() {
        let store = unlocked_store().await;
        store.add(&input("GitHub", "alice", "p1")).await.unwrap();
        store.add(&input("gitlab.com", "bob", "p2")).await.unwrap();
        store.add(&input("example.com", "carol", "p3")).await.unwrap();

        let hits = store.search("GIT").await;
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].site_name, "GitHub");

        let by_user = store.search("carol").await;
        assert_eq!(by_user.len(), 1);

        // Blank query returns everything in insertion order
        let all = store.search("   ").await;
        assert_eq!(all.len(), 3);
        assert_eq!(all[1].site_name, "gitlab.com");
    }

    #[tokio::test]
    async fn test_persistence_roundtrip() {
        let storage = Arc::new(MemoryStorage::new());
        let session = VaultSession::new();
        session.set(derive_key("pw", &generate_salt())).await;

        let store = CredentialStore::new(storage.clone(), session.clone());
        let added = store.add(&input("example.com", "alice", "p1")).await.unwrap();

        // Fresh store over the same storage and session sees the same data
        let reloaded = CredentialStore::new(storage, session);
        let credentials = reloaded.load_all().await.unwrap();

        assert_eq!(credentials, vec![added]);
    }

    #[tokio::test]
    async fn test_idempotent_load() {
        let store = unlocked_store().await;
        store.add(&input("example.com", "alice", "p1")).await.unwrap();

        let first = store.load_all().await.unwrap();
        let second = store.load_all().await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_wrong_key_surfaces_crypto_error() {
        let storage = Arc::new(MemoryStorage::new());
        let salt = generate_salt();

        let session = VaultSession::new();
        session.set(derive_key("right", &salt)).await;
        let store = CredentialStore::new(storage.clone(), session);
        store.add(&input("example.com", "alice", "p1")).await.unwrap();

        let other = VaultSession::new();
        other.set(derive_key("wrong", &salt)).await;
        let mis_keyed = CredentialStore::new(storage, other);

        assert!(matches!(
            mis_keyed.load_all().await,
            Err(VaultError::Crypto(_))
        ));
    }

    #[tokio::test]
    async fn test_malformed_envelope_degrades_to_empty() {
        let storage = Arc::new(MemoryStorage::new());
        storage.store(CREDENTIALS_KEY, b"not json at all").await.unwrap();

        let session = VaultSession::new();
        session.set(derive_key("pw", &generate_salt())).await;
        let store = CredentialStore::new(storage, session);

        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_legacy_bare_array_payload_accepted() {
        let storage = Arc::new(MemoryStorage::new());
        let session = VaultSession::new();
        let key = derive_key("pw", &generate_salt());
        session.set(key.clone()).await;

        let legacy = serde_json::to_vec(&vec![Credential::new(&input("old.example", "alice", "p1"))])
            .unwrap();
        let envelope = crypto::encrypt(&legacy, &key).unwrap();
        storage
            .store(CREDENTIALS_KEY, &serde_json::to_vec(&envelope).unwrap())
            .await
            .unwrap();

        let store = CredentialStore::new(storage, session);
        let credentials = store.load_all().await.unwrap();

        assert_eq!(credentials.len(), 1);
        assert_eq!(credentials[0].site_name, "old.example");
    }

    #[tokio::test]
    async fn test_unrecognized_payload_degrades_to_empty() {
        let storage = Arc::new(MemoryStorage::new());
        let session = VaultSession::new();
        let key = derive_key("pw", &generate_salt());
        session.set(key.clone()).await;

        let envelope = crypto::encrypt(b"{\"version\": 99}", &key).unwrap();
        storage
            .store(CREDENTIALS_KEY, &serde_json::to_vec(&envelope).unwrap())
            .await
            .unwrap();

        let store = CredentialStore::new(storage, session);
        assert!(store.load_all().await.unwrap().is_empty());
    }
}
