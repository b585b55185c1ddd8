//! The derived-key cache: the unlocked vault key, JWK-wrapped and sealed
//! under a per-machine device key, with an absolute TTL.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::{
    crypto::{self, DerivedKey, SealedValue, KEY_LEN},
    error::{Error, Result},
};

/// Absolute lifetime of a cached derived key before it must be re-derived.
pub const CACHE_TTL: Duration = Duration::from_secs(15 * 60);

/// A minimal octet-sequence JWK, just enough to round-trip a 256-bit AES
/// key through a cache file.
#[derive(Debug, Serialize, Deserialize)]
struct Jwk {
    kty: &'static str,
    k: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheRecord {
    jwk: Jwk,
    expires_at: DateTime<Utc>,
}

fn jwk_from_key(key: &DerivedKey) -> Jwk {
    Jwk { kty: "oct", k: URL_SAFE_NO_PAD.encode(key.0) }
}

fn key_from_jwk(jwk: &Jwk) -> Result<DerivedKey> {
    let bytes = URL_SAFE_NO_PAD
        .decode(&jwk.k)
        .map_err(|e| Error::Corrupt { path: "<cache>".into(), message: e.to_string() })?;
    let array: [u8; KEY_LEN] = bytes
        .try_into()
        .map_err(|_| Error::Corrupt { path: "<cache>".into(), message: "cached key is not 32 bytes".into() })?;
    Ok(DerivedKey(array))
}

/// Path to the device key, persisted alongside the vault file.
pub fn device_key_path(config_dir: &Path) -> PathBuf {
    config_dir.join("device.key")
}

/// Load the per-machine device key, generating and persisting a fresh one
/// on first use.
pub fn load_or_create_device_key(config_dir: &Path) -> Result<DerivedKey> {
    let path = device_key_path(config_dir);
    match fs::read_to_string(&path) {
        Ok(hex_str) => {
            let bytes = hex::decode(hex_str.trim())
                .map_err(|e| Error::Corrupt { path: path.display().to_string(), message: e.to_string() })?;
            let array: [u8; KEY_LEN] = bytes
                .try_into()
                .map_err(|_| Error::Corrupt { path: path.display().to_string(), message: "device key is not 32 bytes".into() })?;
            Ok(DerivedKey(array))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let mut bytes = [0u8; KEY_LEN];
            rand::rng().fill_bytes(&mut bytes);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| Error::Io { path: parent.display().to_string(), message: e.to_string() })?;
            }
            fs::write(&path, hex::encode(bytes)).map_err(|e| Error::Io { path: path.display().to_string(), message: e.to_string() })?;
            restrict_permissions(&path).map_err(|e| Error::Io { path: path.display().to_string(), message: e.to_string() })?;
            Ok(DerivedKey(bytes))
        }
        Err(e) => Err(Error::Io { path: path.display().to_string(), message: e.to_string() }),
    }
}

/// Path to this user's cache file under the OS temp directory.
pub fn cache_path() -> PathBuf {
    let dir = std::env::temp_dir().join("browserlet");
    #[cfg(unix)]
    {
        let uid = unsafe { libc::getuid() };
        dir.join(format!("vault-cache-{uid}.enc"))
    }
    #[cfg(not(unix))]
    {
        dir.join("vault-cache.enc")
    }
}

/// Write the unlocked `key` to the cache, encrypted under `device_key`,
/// expiring [`CACHE_TTL`] from now. The old file is deleted first so a
/// fresh create applies owner-only permissions.
pub fn write(device_key: &DerivedKey, key: &DerivedKey) -> Result<()> {
    write_at(&cache_path(), device_key, key)
}

fn write_at(path: &Path, device_key: &DerivedKey, key: &DerivedKey) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::Io { path: parent.display().to_string(), message: e.to_string() })?;
    }
    let record = CacheRecord { jwk: jwk_from_key(key), expires_at: Utc::now() + CACHE_TTL };
    let plaintext = serde_json::to_string(&record).expect("CacheRecord serializes");
    let sealed = crypto::seal(device_key, &plaintext);
    let body = serde_json::to_string(&sealed).expect("SealedValue serializes");
    let _ = fs::remove_file(path);
    fs::write(path, body).map_err(|e| Error::Io { path: path.display().to_string(), message: e.to_string() })?;
    restrict_permissions(path).map_err(|e| Error::Io { path: path.display().to_string(), message: e.to_string() })
}

/// Read and decrypt the cache. Any failure — missing file, parse error,
/// decrypt failure, or an expired TTL — is a cache miss: `None` is
/// returned and the file is unlinked.
pub fn read(device_key: &DerivedKey) -> Option<DerivedKey> {
    read_at(&cache_path(), device_key)
}

fn read_at(path: &Path, device_key: &DerivedKey) -> Option<DerivedKey> {
    let outcome = (|| -> Result<DerivedKey> {
        let body = fs::read_to_string(path).map_err(|e| Error::Io { path: path.display().to_string(), message: e.to_string() })?;
        let sealed: SealedValue =
            serde_json::from_str(&body).map_err(|e| Error::Corrupt { path: path.display().to_string(), message: e.to_string() })?;
        let plaintext = crypto::unseal(device_key, &sealed)?;
        let record: CacheRecord =
            serde_json::from_str(&plaintext).map_err(|e| Error::Corrupt { path: path.display().to_string(), message: e.to_string() })?;
        if record.expires_at <= Utc::now() {
            return Err(Error::Locked);
        }
        key_from_jwk(&record.jwk)
    })();
    match outcome {
        Ok(key) => Some(key),
        Err(_) => {
            let _ = fs::remove_file(path);
            None
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn test_device_key() -> DerivedKey {
        DerivedKey([7u8; KEY_LEN])
    }

    #[test]
    fn jwk_round_trips_a_key() {
        let key = DerivedKey([42u8; KEY_LEN]);
        let jwk = jwk_from_key(&key);
        let back = key_from_jwk(&jwk).unwrap();
        assert_eq!(back.0, key.0);
    }

    #[test]
    fn cache_write_then_read_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vault-cache.enc");
        let device_key = test_device_key();
        let key = DerivedKey([9u8; KEY_LEN]);
        write_at(&path, &device_key, &key).unwrap();
        let read_back = read_at(&path, &device_key).expect("cache hit");
        assert_eq!(read_back.0, key.0);
    }

    #[test]
    fn wrong_device_key_is_a_cache_miss() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vault-cache.enc");
        let device_key = test_device_key();
        let key = DerivedKey([9u8; KEY_LEN]);
        write_at(&path, &device_key, &key).unwrap();
        let wrong = DerivedKey([1u8; KEY_LEN]);
        assert!(read_at(&path, &wrong).is_none());
        assert!(!path.exists());
    }

    #[test]
    fn expired_cache_is_a_miss_and_unlinks_the_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vault-cache.enc");
        let device_key = test_device_key();
        let record = CacheRecord {
            jwk: jwk_from_key(&DerivedKey([9u8; KEY_LEN])),
            expires_at: Utc::now() - chrono::Duration::seconds(1),
        };
        let plaintext = serde_json::to_string(&record).unwrap();
        let sealed = crypto::seal(&device_key, &plaintext);
        fs::write(&path, serde_json::to_string(&sealed).unwrap()).unwrap();
        assert!(read_at(&path, &device_key).is_none());
        assert!(!path.exists());
    }
}
