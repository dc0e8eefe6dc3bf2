//! Cryptographic primitives for credential encryption at rest
//!
//! This module provides:
//! - AES-256-GCM authenticated encryption
//! - PBKDF2-HMAC-SHA256 key derivation from the master password
//! - Base64 codec for embedding binary material in JSON
//! - Secure memory handling with zeroize

pub mod encoding;
mod encryption;
mod key_derivation;
mod secure_memory;

pub use encryption::{decrypt, decrypt_string, encrypt, encrypt_string, Envelope};
pub use key_derivation::{
    derive_key, generate_nonce, generate_salt, KEY_LEN, NONCE_LEN, PBKDF2_ITERATIONS, SALT_LEN,
};
pub use secure_memory::SessionKey;
