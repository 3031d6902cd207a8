//! Storage and persistence layer
//!
//! - `WalletStore` - the persistence seam the coordinator commits through
//! - File system implementation
//! - Data models

mod file_system;
mod models;

pub use file_system::Storage;
pub use models::Metadata;

use crate::error::StorageError;
use crate::wallet::Wallet;

/// Opaque storage for the canonical wallet snapshot
pub trait WalletStore: Send + Sync {
    /// Load the persisted wallet, `None` if nothing has been saved yet
    fn load(&self) -> Result<Option<Wallet>, StorageError>;

    /// Persist a complete snapshot, replacing the previous one
    fn save(&self, wallet: &Wallet) -> Result<(), StorageError>;
}
