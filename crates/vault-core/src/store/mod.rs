//! Credential records and the encrypted credential store

mod manager;
mod types;

pub use manager::{CredentialStore, CREDENTIALS_KEY};
pub use types::{CollectionFile, Credential, CredentialInput, COLLECTION_VERSION};
