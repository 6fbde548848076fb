//! On-disk credential store for the admin workflows.
//!
//! Keypairs are stored as `<name>.json` in the standard file-wallet
//! format; plain addresses (for accounts the client does not hold keys
//! to, like the derived stake-state account) are stored as `<name>.pub`.
//! Entries are write-once: a workflow that would clobber an existing
//! entry fails instead, so reruns cannot silently discard credentials.

use {
    crate::error::StakingClientError,
    log::info,
    solana_sdk::{
        pubkey::Pubkey,
        signature::{read_keypair_file, write_keypair_file, Keypair},
    },
    std::{
        fs,
        path::{Path, PathBuf},
        str::FromStr,
    },
};

/// Entry name for the pool admin keypair.
pub const ADMIN_KEY: &str = "admin";
/// Entry name for the pool token account keypair.
pub const STAKE_TOKEN_ACCOUNT_KEY: &str = "stake-token-account";
/// Entry name for the derived stake-state address.
pub const STAKE_STATE_RECORD: &str = "stake-state";

/// A directory of named keypairs and addresses.
#[derive(Debug, Clone)]
pub struct Keystore {
    dir: PathBuf,
}

impl Keystore {
    /// Opens a keystore, creating the directory if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StakingClientError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|err| {
            StakingClientError::Config(format!(
                "failed to create keystore directory {}: {err}",
                dir.display()
            ))
        })?;
        Ok(Self { dir })
    }

    pub fn keypair_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    pub fn address_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.pub"))
    }

    pub fn contains_keypair(&self, name: &str) -> bool {
        self.keypair_path(name).exists()
    }

    pub fn contains_address(&self, name: &str) -> bool {
        self.address_path(name).exists()
    }

    /// Loads a stored keypair.
    pub fn load_keypair(&self, name: &str) -> Result<Keypair, StakingClientError> {
        let path = self.keypair_path(name);
        if !path.exists() {
            return Err(StakingClientError::MissingCredential(name.to_string()));
        }
        read_keypair_file(&path).map_err(|err| StakingClientError::CorruptCredential {
            name: name.to_string(),
            reason: err.to_string(),
        })
    }

    /// Stores a keypair, refusing to overwrite an existing entry.
    pub fn store_keypair(&self, name: &str, keypair: &Keypair) -> Result<(), StakingClientError> {
        let path = self.keypair_path(name);
        if path.exists() {
            return Err(StakingClientError::CredentialExists(name.to_string()));
        }
        write_keypair_file(keypair, &path).map_err(|err| {
            StakingClientError::Config(format!("failed to write {}: {err}", path.display()))
        })?;
        info!("stored keypair {name} at {}", path.display());
        Ok(())
    }

    /// Records a plain address, refusing to overwrite an existing entry.
    pub fn record_address(&self, name: &str, address: &Pubkey) -> Result<(), StakingClientError> {
        let path = self.address_path(name);
        if path.exists() {
            return Err(StakingClientError::CredentialExists(name.to_string()));
        }
        fs::write(&path, format!("{address}\n")).map_err(|err| {
            StakingClientError::Config(format!("failed to write {}: {err}", path.display()))
        })?;
        info!("recorded address {address} for {name} at {}", path.display());
        Ok(())
    }

    /// Loads a recorded address.
    pub fn load_address(&self, name: &str) -> Result<Pubkey, StakingClientError> {
        let path = self.address_path(name);
        if !path.exists() {
            return Err(StakingClientError::MissingCredential(name.to_string()));
        }
        let contents =
            fs::read_to_string(&path).map_err(|err| StakingClientError::CorruptCredential {
                name: name.to_string(),
                reason: err.to_string(),
            })?;
        Pubkey::from_str(contents.trim()).map_err(|err| StakingClientError::CorruptCredential {
            name: name.to_string(),
            reason: err.to_string(),
        })
    }
}
