//! The on-disk vault file: validation record plus the encrypted credential
//! list.

use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::{
    crypto::{self, DerivedKey, SealedValue, SALT_LEN, VALIDATION_MARKER},
    error::{Error, Result},
};

/// One stored credential: an alias the user refers to it by, and its value
/// sealed under the vault's derived key.
///
/// `alias` is required rather than optional: every credential enters the
/// vault through `add_credential`, which already requires one (the CLI's
/// `vault add <alias>` subcommand has no alias-less form), and every other
/// operation here — `reveal`, `remove_credential`, `credential_id` — looks a
/// record up by that same alias. See `DESIGN.md`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// `cred-{ms-since-epoch}-{8 hex chars}`.
    pub id: String,
    /// The alias used in `{{credential:ALIAS}}` placeholders.
    pub alias: String,
    value: SealedValue,
    /// When this credential was added.
    pub created_at: DateTime<Utc>,
    /// When this credential's value was last changed. Equal to `created_at`
    /// until an update path exists; no vault subcommand currently updates a
    /// credential in place (`add` rejects an existing alias, `del` then
    /// `add` is the documented way to replace a value).
    pub updated_at: DateTime<Utc>,
}

/// The vault file as it exists on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultFile {
    salt_base64: String,
    validation: SealedValue,
    credentials: Vec<CredentialRecord>,
}

impl VaultFile {
    /// Create a fresh vault protected by `password`, returning the file and
    /// the derived key it was just unlocked with.
    pub fn create(password: &str) -> (Self, DerivedKey) {
        let salt = crypto::random_salt();
        let key = crypto::derive_key(password, &salt);
        let validation = crypto::seal(&key, VALIDATION_MARKER);
        (
            Self {
                salt_base64: base64_encode(&salt),
                validation,
                credentials: Vec::new(),
            },
            key,
        )
    }

    /// Load a vault file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::NotFound(path.display().to_string()),
            _ => Error::Io { path: path.display().to_string(), message: e.to_string() },
        })?;
        serde_json::from_str(&raw).map_err(|e| Error::Corrupt { path: path.display().to_string(), message: e.to_string() })
    }

    /// Write the vault atomically: write to a sibling temp file, restrict
    /// its permissions, then rename over the target.
    pub fn save(&self, path: &Path) -> Result<()> {
        let tmp = path.with_extension("json.tmp");
        let body = serde_json::to_string_pretty(self).expect("VaultFile serializes");
        fs::write(&tmp, body).map_err(|e| Error::Io { path: tmp.display().to_string(), message: e.to_string() })?;
        restrict_permissions(&tmp).map_err(|e| Error::Io { path: tmp.display().to_string(), message: e.to_string() })?;
        fs::rename(&tmp, path).map_err(|e| Error::Io { path: path.display().to_string(), message: e.to_string() })
    }

    /// Derive a key from `password` and verify it against the validation
    /// record. Returns the key on success.
    pub fn unlock(&self, password: &str) -> Result<DerivedKey> {
        let salt = base64_decode(&self.salt_base64)?;
        let key = crypto::derive_key(password, &salt);
        let marker = crypto::unseal(&key, &self.validation)?;
        if marker != VALIDATION_MARKER {
            return Err(Error::WrongPassword);
        }
        Ok(key)
    }

    /// Seal `value` under `key` and store it under `alias`.
    pub fn add_credential(&mut self, key: &DerivedKey, alias: &str, value: &str) -> Result<&CredentialRecord> {
        if self.credentials.iter().any(|c| c.alias == alias) {
            return Err(Error::AliasExists(alias.to_string()));
        }
        let now = Utc::now();
        let record = CredentialRecord {
            id: generate_credential_id(),
            alias: alias.to_string(),
            value: crypto::seal(key, value),
            created_at: now,
            updated_at: now,
        };
        self.credentials.push(record);
        Ok(self.credentials.last().expect("just pushed"))
    }

    /// Remove the credential stored under `alias`.
    pub fn remove_credential(&mut self, alias: &str) -> Result<()> {
        let before = self.credentials.len();
        self.credentials.retain(|c| c.alias != alias);
        if self.credentials.len() == before {
            return Err(Error::AliasNotFound(alias.to_string()));
        }
        Ok(())
    }

    /// List every stored credential's alias, id, and creation time, never
    /// its value.
    pub fn list(&self) -> impl Iterator<Item = &CredentialRecord> {
        self.credentials.iter()
    }

    /// Decrypt the credential stored under `alias`.
    pub fn reveal(&self, key: &DerivedKey, alias: &str) -> Result<String> {
        let record = self
            .credentials
            .iter()
            .find(|c| c.alias == alias)
            .ok_or_else(|| Error::AliasNotFound(alias.to_string()))?;
        crypto::unseal(key, &record.value)
    }

    /// Decrypt the credential with the given id, used by the token bridge
    /// which addresses credentials by id rather than alias.
    pub fn reveal_by_id(&self, key: &DerivedKey, id: &str) -> Result<String> {
        let record = self
            .credentials
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| Error::AliasNotFound(id.to_string()))?;
        crypto::unseal(key, &record.value)
    }

    /// Find the credential id associated with `alias`, for token issuance.
    pub fn credential_id(&self, alias: &str) -> Result<&str> {
        self.credentials
            .iter()
            .find(|c| c.alias == alias)
            .map(|c| c.id.as_str())
            .ok_or_else(|| Error::AliasNotFound(alias.to_string()))
    }
}

fn generate_credential_id() -> String {
    let ms = Utc::now().timestamp_millis();
    let mut suffix = [0u8; 4];
    rand::rng().fill_bytes(&mut suffix);
    format!("cred-{ms}-{}", hex::encode(suffix))
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

fn base64_encode(bytes: &[u8]) -> String {
    use base64::{engine::general_purpose::STANDARD, Engine};
    STANDARD.encode(bytes)
}

fn base64_decode(text: &str) -> Result<[u8; SALT_LEN]> {
    use base64::{engine::general_purpose::STANDARD, Engine};
    let bytes = STANDARD
        .decode(text)
        .map_err(|e| Error::Corrupt { path: "<salt>".into(), message: e.to_string() })?;
    bytes
        .try_into()
        .map_err(|_| Error::Corrupt { path: "<salt>".into(), message: "salt is not 16 bytes".into() })
}

/// The default vault file location: `vault.json` under the OS
/// config directory's `browserlet` subdirectory.
pub fn default_vault_path(config_dir: &Path) -> PathBuf {
    config_dir.join("vault.json")
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn create_unlock_round_trips() {
        let (vault, _key) = VaultFile::create("hunter2");
        assert!(vault.unlock("hunter2").is_ok());
        assert!(matches!(vault.unlock("wrong"), Err(Error::WrongPassword)));
    }

    #[test]
    fn add_list_reveal_and_remove_credential() {
        let (mut vault, key) = VaultFile::create("hunter2");
        vault.add_credential(&key, "github", "s3cret-token").unwrap();
        assert_eq!(vault.list().count(), 1);
        assert_eq!(vault.reveal(&key, "github").unwrap(), "s3cret-token");
        assert!(matches!(
            vault.add_credential(&key, "github", "again"),
            Err(Error::AliasExists(_))
        ));
        vault.remove_credential("github").unwrap();
        assert_eq!(vault.list().count(), 0);
    }

    #[test]
    fn save_then_load_round_trips_and_restricts_permissions() {
        let (mut vault, key) = VaultFile::create("hunter2");
        vault.add_credential(&key, "github", "s3cret-token").unwrap();
        let dir = tempdir().unwrap();
        let path = dir.path().join("vault.json");
        vault.save(&path).unwrap();
        let loaded = VaultFile::load(&path).unwrap();
        let loaded_key = loaded.unlock("hunter2").unwrap();
        assert_eq!(loaded.reveal(&loaded_key, "github").unwrap(), "s3cret-token");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
            assert_eq!(mode, 0o600);
        }
    }

    #[test]
    fn load_missing_file_reports_not_found() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("does-not-exist.json");
        assert!(matches!(VaultFile::load(&path), Err(Error::NotFound(_))));
    }
}
