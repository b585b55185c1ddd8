//! Shared vault-opening helper used by `run`/`test` (`--vault`) and the
//! `vault` subcommand itself.

use std::sync::Arc;

use browserlet_vault::{PasswordStorage, SharedVault, Vault};

use crate::error::{Error, Result};

/// Open the default vault, unlocking it (prompting for the password on a
/// cache miss), and return the owned `Vault` for operations that need
/// direct access (`add`, `reveal`, `credential_id`).
pub fn open_unlocked_vault_owned() -> Result<Vault> {
    let config_dir = Vault::config_dir()?;
    let mut vault = Vault::open(&config_dir)?;
    if !vault.is_unlocked() {
        let password = rpassword::prompt_password("vault password: ")?;
        vault.unlock(&password)?;
    }
    Ok(vault)
}

/// Same as [`open_unlocked_vault_owned`], wrapped for the substitution
/// pass's `PasswordStorage` capability.
pub fn open_unlocked_vault() -> Result<Arc<dyn PasswordStorage>> {
    Ok(Arc::new(SharedVault::new(open_unlocked_vault_owned()?)))
}

/// Open the default vault without unlocking it, for operations
/// (`list`, `del`, `lock`) that don't need the derived key.
pub fn open_vault() -> Result<Vault> {
    let config_dir = Vault::config_dir()?;
    Ok(Vault::open(&config_dir)?)
}
