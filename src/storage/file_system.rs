use std::fs;
use std::path::{Path, PathBuf};

use super::models::Metadata;
use super::WalletStore;
use crate::error::StorageError;
use crate::wallet::Wallet;

const WALLET_FILE: &str = "wallet.json";
const METADATA_FILE: &str = "metadata.json";

#[derive(Clone, Debug)]
pub struct Storage {
    base_path: PathBuf,
}

impl Storage {
    /// Create a new storage instance with the default base directory ("./wallets")
    pub fn new() -> Self {
        Self {
            base_path: PathBuf::from(crate::config::DEFAULT_WALLET_DIR),
        }
    }

    /// Create storage with custom base directory (for testing)
    pub fn new_with_base_dir(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Check if a wallet has been saved
    pub fn wallet_exists(&self) -> bool {
        self.base_path.join(WALLET_FILE).exists()
    }

    /// Load wallet metadata from disk
    pub fn load_metadata(&self) -> Result<Metadata, StorageError> {
        let path = self.base_path.join(METADATA_FILE);
        if !path.exists() {
            return Err(StorageError::FileNotFound(path.display().to_string()));
        }
        let contents = fs::read_to_string(path)?;
        let meta = serde_json::from_str(&contents)?;
        Ok(meta)
    }

    /// Delete the wallet and all its associated data from disk
    pub fn delete(&self) -> Result<(), StorageError> {
        if !self.base_path.exists() {
            return Err(StorageError::FileNotFound(
                self.base_path.display().to_string(),
            ));
        }

        log::warn!("Deleting wallet directory: {:?}", self.base_path);
        fs::remove_dir_all(&self.base_path)?;
        log::info!("Wallet storage deleted");
        Ok(())
    }

    /// Write through a sibling temp file and rename over the target, so a
    /// reader sees either the old file or the new one
    fn write_atomic(path: &Path, contents: &str) -> Result<(), StorageError> {
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

impl Default for Storage {
    fn default() -> Self {
        Self::new()
    }
}

impl WalletStore for Storage {
    fn load(&self) -> Result<Option<Wallet>, StorageError> {
        let path = self.base_path.join(WALLET_FILE);
        if !path.exists() {
            log::debug!("No wallet stored at {:?}", path);
            return Ok(None);
        }
        let contents = fs::read_to_string(path)?;
        let wallet = serde_json::from_str(&contents)?;
        Ok(Some(wallet))
    }

    fn save(&self, wallet: &Wallet) -> Result<(), StorageError> {
        fs::create_dir_all(&self.base_path)?;

        let json = serde_json::to_string_pretty(wallet)?;
        Self::write_atomic(&self.base_path.join(WALLET_FILE), &json)?;

        let keyring_count = wallet.keyrings().len();
        let account_count = wallet.accounts().len();
        let metadata = match self.load_metadata() {
            Ok(existing) => existing.touched(keyring_count, account_count),
            Err(_) => Metadata::new(keyring_count, account_count),
        };
        let json = serde_json::to_string_pretty(&metadata)?;
        Self::write_atomic(&self.base_path.join(METADATA_FILE), &json)?;

        log::debug!(
            "Saved wallet with {} accounts to {:?}",
            account_count,
            self.base_path
        );
        Ok(())
    }
}
