//! AES-256-GCM authenticated encryption
//!
//! Every encryption produces an [`Envelope`] of a fresh random nonce plus the
//! AEAD output (the 16-byte authentication tag stays embedded at the end of
//! the ciphertext). A failed tag check on decryption is the only signal for
//! "wrong password or corrupted data" - there is no partial decryption.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use serde::{Deserialize, Serialize};

use super::encoding;
use super::key_derivation::{generate_nonce, NONCE_LEN};
use super::SessionKey;
use crate::error::{Result, VaultError};

/// Nonce + ciphertext bundle needed to later decrypt a payload.
///
/// Serializes with base64 fields; `iv` is accepted as an alias for `nonce`
/// when reading envelopes written by older clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(alias = "iv", with = "encoding::base64_fixed")]
    pub nonce: [u8; NONCE_LEN],
    #[serde(with = "encoding::base64_vec")]
    pub ciphertext: Vec<u8>,
}

/// Encrypt plaintext under the given key with a fresh random nonce.
pub fn encrypt(plaintext: &[u8], key: &SessionKey) -> Result<Envelope> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::Crypto(e.to_string()))?;

    let nonce = generate_nonce();
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|e| VaultError::Crypto(e.to_string()))?;

    Ok(Envelope { nonce, ciphertext })
}

/// Decrypt an envelope, verifying the authentication tag.
pub fn decrypt(envelope: &Envelope, key: &SessionKey) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::Crypto(e.to_string()))?;

    cipher
        .decrypt(
            Nonce::from_slice(&envelope.nonce),
            envelope.ciphertext.as_slice(),
        )
        .map_err(|_| VaultError::Crypto("authentication tag mismatch".to_string()))
}

/// Encrypt a UTF-8 string
pub fn encrypt_string(plaintext: &str, key: &SessionKey) -> Result<Envelope> {
    encrypt(plaintext.as_bytes(), key)
}

/// Decrypt an envelope and decode the plaintext as UTF-8
pub fn decrypt_string(envelope: &Envelope, key: &SessionKey) -> Result<String> {
    let plaintext = decrypt(envelope, key)?;
    String::from_utf8(plaintext).map_err(|e| VaultError::Crypto(format!("invalid UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::key_derivation::{derive_key, generate_salt};
    use std::collections::HashSet;

    fn test_key() -> SessionKey {
        derive_key("test-password", &generate_salt())
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let key = test_key();
        let plaintext = b"Hello, World!";

        let envelope = encrypt(plaintext, &key).unwrap();
        let decrypted = decrypt(&envelope, &key).unwrap();

        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_string_roundtrip() {
        let key = test_key();

        let envelope = encrypt_string("hunter2", &key).unwrap();
        let decrypted = decrypt_string(&envelope, &key).unwrap();

        assert_eq!(decrypted, "hunter2");
    }

    #[test]
    fn test_fresh_nonce_per_call() {
        let key = test_key();
        let plaintext = b"same plaintext";

        let nonces: HashSet<[u8; NONCE_LEN]> = (0..64)
            .map(|_| encrypt(plaintext, &key).unwrap().nonce)
            .collect();

        assert_eq!(nonces.len(), 64);
    }

    #[test]
    fn test_wrong_key_fails_decryption() {
        let key1 = test_key();
        let key2 = test_key();

        let envelope = encrypt(b"secret data", &key1).unwrap();
        let result = decrypt(&envelope, &key2);

        assert!(matches!(result, Err(VaultError::Crypto(_))));
    }

    #[test]
    fn test_tampered_ciphertext_fails_decryption() {
        let key = test_key();

        let mut envelope = encrypt(b"secret data", &key).unwrap();
        envelope.ciphertext[0] ^= 0xFF;

        assert!(matches!(
            decrypt(&envelope, &key),
            Err(VaultError::Crypto(_))
        ));
    }

    #[test]
    fn test_tampered_tag_fails_decryption() {
        let key = test_key();

        let mut envelope = encrypt(b"secret data", &key).unwrap();
        // The tag is the last 16 bytes of the AEAD output
        let last = envelope.ciphertext.len() - 1;
        envelope.ciphertext[last] ^= 0xFF;

        assert!(matches!(
            decrypt(&envelope, &key),
            Err(VaultError::Crypto(_))
        ));
    }

    #[test]
    fn test_envelope_serde_roundtrip() {
        let key = test_key();
        let envelope = encrypt(b"payload", &key).unwrap();

        let json = serde_json::to_string(&envelope).unwrap();
        let parsed: Envelope = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, envelope);
    }

    #[test]
    fn test_envelope_accepts_iv_alias() {
        let key = test_key();
        let envelope = encrypt(b"payload", &key).unwrap();

        let json = serde_json::to_string(&envelope)
            .unwrap()
            .replace("\"nonce\"", "\"iv\"");
        let parsed: Envelope = serde_json::from_str(&json).unwrap();

        assert_eq!(decrypt(&parsed, &key).unwrap(), b"payload");
    }
}
