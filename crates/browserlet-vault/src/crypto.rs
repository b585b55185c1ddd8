//! PBKDF2-HMAC-SHA256 key derivation and AES-256-GCM sealing for vault
//! records.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::{Error, Result};

/// PBKDF2 iteration count for vault key derivation.
pub const PBKDF2_ITERATIONS: u32 = 600_000;
/// Salt length for vault key derivation, in bytes.
pub const SALT_LEN: usize = 16;
/// AES-256 key length, in bytes.
pub const KEY_LEN: usize = 32;
/// AES-GCM nonce length, in bytes.
const NONCE_LEN: usize = 12;

/// A derived 256-bit AES-GCM key. Never serialized directly; see
/// [`crate::cache`] for the JWK-wrapped, device-key-encrypted form that is
/// allowed to touch disk.
#[derive(Clone)]
pub struct DerivedKey(pub [u8; KEY_LEN]);

/// Derive a 256-bit key from `password` and `salt` via
/// PBKDF2-HMAC-SHA256 at [`PBKDF2_ITERATIONS`] iterations.
pub fn derive_key(password: &str, salt: &[u8; SALT_LEN]) -> DerivedKey {
    let mut out = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ITERATIONS, &mut out);
    DerivedKey(out)
}

/// Generate a fresh random salt for a new vault.
pub fn random_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    salt
}

/// An AES-256-GCM ciphertext with its nonce, base64-encoded for JSON
/// storage. Each record gets a fresh nonce.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SealedValue {
    nonce_base64: String,
    ciphertext_base64: String,
}

/// Encrypt `plaintext` under `key` with a freshly generated nonce.
pub fn seal(key: &DerivedKey, plaintext: &str) -> SealedValue {
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::rng().fill_bytes(&mut nonce_bytes);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key.0));
    let nonce = Nonce::from_slice(&nonce_bytes);
    let ciphertext = cipher
        .encrypt(nonce, plaintext.as_bytes())
        .expect("AES-GCM encryption over an in-memory buffer cannot fail");
    SealedValue {
        nonce_base64: BASE64.encode(nonce_bytes),
        ciphertext_base64: BASE64.encode(ciphertext),
    }
}

/// Decrypt `sealed` under `key`. An auth-tag mismatch (wrong key, or
/// tampered ciphertext) surfaces as [`Error::WrongPassword`] — an AES-GCM
/// auth-tag failure is taken as the wrong-password signal.
pub fn unseal(key: &DerivedKey, sealed: &SealedValue) -> Result<String> {
    let nonce_bytes = BASE64
        .decode(&sealed.nonce_base64)
        .map_err(|e| Error::Corrupt { path: "<in-memory>".into(), message: e.to_string() })?;
    let ciphertext = BASE64
        .decode(&sealed.ciphertext_base64)
        .map_err(|e| Error::Corrupt { path: "<in-memory>".into(), message: e.to_string() })?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key.0));
    let nonce = Nonce::from_slice(&nonce_bytes);
    let plaintext = cipher
        .decrypt(nonce, ciphertext.as_ref())
        .map_err(|_| Error::WrongPassword)?;
    String::from_utf8(plaintext).map_err(|e| Error::Corrupt { path: "<in-memory>".into(), message: e.to_string() })
}

/// The literal string sealed under a fresh vault's derived key so a later
/// unlock attempt can be validated without ever decrypting a real
/// credential first.
pub const VALIDATION_MARKER: &str = "browserlet_vault_v1";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seal_then_unseal_round_trips() {
        let salt = random_salt();
        let key = derive_key("hunter2", &salt);
        let sealed = seal(&key, "s3cret-value");
        assert_eq!(unseal(&key, &sealed).unwrap(), "s3cret-value");
    }

    #[test]
    fn wrong_password_fails_auth_tag_check() {
        let salt = random_salt();
        let right = derive_key("hunter2", &salt);
        let wrong = derive_key("not-hunter2", &salt);
        let sealed = seal(&right, VALIDATION_MARKER);
        assert!(matches!(unseal(&wrong, &sealed), Err(Error::WrongPassword)));
    }

    #[test]
    fn each_seal_uses_a_fresh_nonce() {
        let salt = random_salt();
        let key = derive_key("hunter2", &salt);
        let a = seal(&key, "same-plaintext");
        let b = seal(&key, "same-plaintext");
        assert_ne!(a.nonce_base64, b.nonce_base64);
    }
}
