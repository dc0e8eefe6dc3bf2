//! Password-based key derivation using PBKDF2-HMAC-SHA256

use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;

use super::SessionKey;

/// Fixed PBKDF2 iteration count. Changing this breaks every stored record
/// and backup file, so it is not configurable.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Salt length in bytes
pub const SALT_LEN: usize = 16;

/// AES-GCM nonce length in bytes
pub const NONCE_LEN: usize = 12;

/// Derived key length in bytes (256 bits)
pub const KEY_LEN: usize = 32;

/// Generate a cryptographically secure random salt
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Generate a fresh random nonce.
///
/// Every encryption call must use a new nonce; reuse under the same key is a
/// critical integrity violation.
pub fn generate_nonce() -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);
    nonce
}

/// Derive a 256-bit key from a password and salt.
///
/// Deterministic given identical inputs. Must be re-run on every unlock
/// attempt - keys are never cached across different salts.
pub fn derive_key(password: &str, salt: &[u8]) -> SessionKey {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ITERATIONS, &mut key);
    SessionKey::new(key)
}
