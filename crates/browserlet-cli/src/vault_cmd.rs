//! `vault init|add|del|list|lock|reset|import-from-extension`.

use std::io::Read;

use browserlet_vault::Vault;
use serde::Deserialize;

use crate::{
    cli::VaultCommand,
    error::{Error, Result},
    vault_support::{open_unlocked_vault_owned, open_vault},
};

/// Dispatch a `vault` subcommand, returning the process exit code.
pub fn run(command: VaultCommand) -> Result<i32> {
    match command {
        VaultCommand::Init => init(),
        VaultCommand::Add { alias } => add(&alias),
        VaultCommand::Del { alias } => del(&alias),
        VaultCommand::List => list(),
        VaultCommand::Lock => lock(),
        VaultCommand::Reset { yes } => reset(yes),
        VaultCommand::ImportFromExtension => import_from_extension(),
    }
}

fn init() -> Result<i32> {
    let config_dir = Vault::config_dir()?;
    let password = rpassword::prompt_password("new vault password: ")?;
    let confirm = rpassword::prompt_password("confirm password: ")?;
    if password != confirm {
        eprintln!("passwords did not match");
        return Ok(2);
    }
    Vault::init(&config_dir, &password)?;
    println!("vault created at {}", Vault::vault_path(&config_dir).display());
    Ok(0)
}

fn add(alias: &str) -> Result<i32> {
    let mut vault = open_unlocked_vault_owned()?;
    let value = rpassword::prompt_password(format!("value for {alias}: "))?;
    vault.add(alias, &value)?;
    println!("added credential {alias:?}");
    Ok(0)
}

fn del(alias: &str) -> Result<i32> {
    let mut vault = open_vault()?;
    vault.remove(alias)?;
    println!("removed credential {alias:?}");
    Ok(0)
}

fn list() -> Result<i32> {
    let vault = open_vault()?;
    for record in vault.list() {
        println!("{}\t{}\t{}", record.alias, record.id, record.created_at);
    }
    Ok(0)
}

fn lock() -> Result<i32> {
    let mut vault = open_vault()?;
    vault.lock();
    println!("vault locked");
    Ok(0)
}

fn reset(yes: bool) -> Result<i32> {
    if !yes {
        eprintln!("refusing to delete the vault without --yes");
        return Ok(2);
    }
    let config_dir = Vault::config_dir()?;
    Vault::reset(&config_dir)?;
    println!("vault reset");
    Ok(0)
}

#[derive(Deserialize)]
struct ImportedCredential {
    alias: String,
    value: String,
}

fn import_from_extension() -> Result<i32> {
    let mut raw = String::new();
    std::io::stdin().read_to_string(&mut raw)?;
    let credentials: Vec<ImportedCredential> = serde_json::from_str(&raw)
        .map_err(|e| Error::InvalidInput(format!("malformed import JSON: {e}")))?;

    let mut vault = open_unlocked_vault_owned()?;
    for credential in &credentials {
        vault.add(&credential.alias, &credential.value)?;
    }
    println!("imported {} credential(s)", credentials.len());
    Ok(0)
}
