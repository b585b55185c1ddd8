//! Encrypted credential storage, the derived-key cache, and the localhost
//! token bridge used to hand a credential value to the browser extension
//! without ever exposing the vault password to it.
//!
//! # Stable API Surface
//! - [`Vault`] / [`SharedVault`]: open, unlock, and query credentials.
//! - [`PasswordStorage`]: the capability the substitution pass resolves
//!   `{{credential:ALIAS}}` placeholders against.
//! - [`bridge::Bridge`]: the localhost HTTP server.
#![warn(missing_docs)]

pub mod bridge;
mod cache;
mod crypto;
mod error;
mod store;

use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

pub use bridge::{Bridge, CredentialSource, TokenStore, DEFAULT_PORT, DEFAULT_TOKEN_TTL};
pub use error::{Error, Result};
pub use store::CredentialRecord;
use tracing::debug;

/// Resolves `{{credential:ALIAS}}` placeholders during substitution.
/// Implemented by [`SharedVault`]; a runner configured without a vault
/// simply has no `PasswordStorage` to pass in, and substitution fails
/// deterministically instead.
pub trait PasswordStorage: Send + Sync {
    /// Resolve `alias` to its plaintext credential value.
    fn resolve_credential(&self, alias: &str) -> Result<String>;
}

/// The vault's on-disk file plus the key it is currently unlocked with, if
/// any.
pub struct Vault {
    path: PathBuf,
    device_key: crypto::DerivedKey,
    file: store::VaultFile,
    key: Option<crypto::DerivedKey>,
}

impl Vault {
    /// The directory the vault file, device key, and any future per-vault
    /// state live under: the OS config directory's `browserlet`
    /// subdirectory.
    pub fn config_dir() -> Result<PathBuf> {
        directories::ProjectDirs::from("", "", "browserlet")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .ok_or_else(|| Error::Io { path: "<config dir>".into(), message: "could not determine OS config directory".into() })
    }

    /// Path to the vault file under `config_dir`.
    pub fn vault_path(config_dir: &Path) -> PathBuf {
        store::default_vault_path(config_dir)
    }

    /// Create a brand-new vault at the default location, protected by
    /// `password`. Fails if one already exists.
    pub fn init(config_dir: &Path, password: &str) -> Result<Self> {
        let path = Self::vault_path(config_dir);
        if path.exists() {
            return Err(Error::AlreadyExists(path.display().to_string()));
        }
        std::fs::create_dir_all(config_dir).map_err(|e| Error::Io { path: config_dir.display().to_string(), message: e.to_string() })?;
        restrict_dir_permissions(config_dir).map_err(|e| Error::Io { path: config_dir.display().to_string(), message: e.to_string() })?;
        let device_key = cache::load_or_create_device_key(config_dir)?;
        let (file, key) = store::VaultFile::create(password);
        file.save(&path)?;
        let vault = Self { path, device_key, file, key: Some(key.clone()) };
        let _ = cache::write(&vault.device_key, &key);
        Ok(vault)
    }

    /// Open the vault at `config_dir`, locked. Use [`Vault::unlock`] (which
    /// tries the derived-key cache first) before reading credentials.
    pub fn open(config_dir: &Path) -> Result<Self> {
        let path = Self::vault_path(config_dir);
        let file = store::VaultFile::load(&path)?;
        let device_key = cache::load_or_create_device_key(config_dir)?;
        Ok(Self { path, device_key, file, key: None })
    }

    /// Whether the vault currently has a derived key in memory.
    pub fn is_unlocked(&self) -> bool {
        self.key.is_some()
    }

    /// Unlock the vault: try the derived-key cache first, falling back to
    /// deriving from `password` and re-priming the cache on success.
    pub fn unlock(&mut self, password: &str) -> Result<()> {
        if let Some(key) = cache::read(&self.device_key) {
            debug!("vault unlocked from derived-key cache");
            self.key = Some(key);
            return Ok(());
        }
        let key = self.file.unlock(password)?;
        let _ = cache::write(&self.device_key, &key);
        self.key = Some(key);
        Ok(())
    }

    /// Drop the in-memory key. The on-disk cache is left as-is; it will
    /// simply expire or be consulted again by a future [`Vault::unlock`].
    pub fn lock(&mut self) {
        self.key = None;
    }

    fn require_key(&self) -> Result<&crypto::DerivedKey> {
        self.key.as_ref().ok_or(Error::Locked)
    }

    /// Add a new credential under `alias`.
    pub fn add(&mut self, alias: &str, value: &str) -> Result<()> {
        let key = self.require_key()?.clone();
        self.file.add_credential(&key, alias, value)?;
        self.file.save(&self.path)
    }

    /// Remove the credential stored under `alias`.
    pub fn remove(&mut self, alias: &str) -> Result<()> {
        self.file.remove_credential(alias)?;
        self.file.save(&self.path)
    }

    /// List every credential's alias, id, and creation time.
    pub fn list(&self) -> Vec<CredentialRecord> {
        self.file.list().cloned().collect()
    }

    /// Decrypt the credential stored under `alias`.
    pub fn reveal(&self, alias: &str) -> Result<String> {
        let key = self.require_key()?;
        self.file.reveal(key, alias)
    }

    /// The credential id associated with `alias`, used to issue a bridge
    /// token without exposing the plaintext value to the caller.
    pub fn credential_id(&self, alias: &str) -> Result<String> {
        self.file.credential_id(alias).map(str::to_string)
    }

    /// Delete the vault file, device key, and cache file. Used by the
    /// `vault reset` subcommand.
    pub fn reset(config_dir: &Path) -> Result<()> {
        let vault_path = Self::vault_path(config_dir);
        let device_key_path = cache::device_key_path(config_dir);
        let cache_path = cache::cache_path();
        for path in [&vault_path, &device_key_path, &cache_path] {
            remove_if_present(&path)?;
        }
        Ok(())
    }
}

/// Restrict the vault's config directory to owner-only access.
#[cfg(unix)]
fn restrict_dir_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
}

#[cfg(not(unix))]
fn restrict_dir_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

fn remove_if_present(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::Io { path: path.display().to_string(), message: e.to_string() }),
    }
}

impl PasswordStorage for Vault {
    fn resolve_credential(&self, alias: &str) -> Result<String> {
        self.reveal(alias)
    }
}

impl CredentialSource for Vault {
    fn credential_value(&self, credential_id: &str) -> Option<String> {
        let key = self.key.as_ref()?;
        self.file.reveal_by_id(key, credential_id).ok()
    }
}

/// A `Vault` shared between the runner's substitution pass and the
/// credential bridge, both of which only ever need shared, lockable
/// access.
#[derive(Clone)]
pub struct SharedVault(pub Arc<Mutex<Vault>>);

impl SharedVault {
    /// Wrap a `Vault` for sharing across the runner and bridge.
    pub fn new(vault: Vault) -> Self {
        Self(Arc::new(Mutex::new(vault)))
    }
}

impl PasswordStorage for SharedVault {
    fn resolve_credential(&self, alias: &str) -> Result<String> {
        self.0.lock().expect("vault mutex poisoned").reveal(alias)
    }
}

impl CredentialSource for SharedVault {
    fn credential_value(&self, credential_id: &str) -> Option<String> {
        self.0.lock().expect("vault mutex poisoned").credential_value(credential_id)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    // `Vault::init`/`unlock` prime the real OS-temp-dir cache file, so these
    // scenarios share that global file and must not run concurrently with
    // each other. One test function, run sequentially, avoids the race.
    #[test]
    fn vault_lifecycle_covers_init_unlock_reset_and_shared_access() {
        let dir = tempdir().unwrap();
        {
            let mut vault = Vault::init(dir.path(), "hunter2").unwrap();
            vault.add("github", "s3cret-token").unwrap();
        }

        let mut reopened = Vault::open(dir.path()).unwrap();
        assert!(!reopened.is_unlocked());
        reopened.unlock("hunter2").unwrap();
        assert_eq!(reopened.reveal("github").unwrap(), "s3cret-token");

        // The cache primed above would let a stale in-process unlock
        // succeed without ever checking the password; drop it so the wrong
        // password actually gets checked against the vault file.
        let _ = std::fs::remove_file(cache::cache_path());
        let mut locked = Vault::open(dir.path()).unwrap();
        assert!(matches!(locked.unlock("wrong"), Err(Error::WrongPassword)));

        let shared_dir = tempdir().unwrap();
        let vault = Vault::init(shared_dir.path(), "hunter2").unwrap();
        let shared = SharedVault::new(vault);
        assert!(matches!(shared.resolve_credential("github"), Err(Error::AliasNotFound(_))));

        assert!(Vault::vault_path(dir.path()).exists());
        Vault::reset(dir.path()).unwrap();
        assert!(!Vault::vault_path(dir.path()).exists());
        assert!(!cache::device_key_path(dir.path()).exists());
    }
}
