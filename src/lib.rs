//! Wallet Keyring: key management and account lifecycle for a blockchain wallet
//!
//! This crate holds the key-derivation strategies ("keyrings") of a wallet,
//! derives the accounts users see from them, and routes every change of the
//! account set through a copy-on-write update so partial changes are never
//! observable.
//!
//! # Architecture
//!
//! - **Keyrings**: seed, hardware, raw key, custodial and address-only variants
//!   with capability checks derived from the variant alone
//! - **Wallet**: value snapshot of keyrings, accounts and index bookkeeping
//! - **Account Factory**: derives the next account and its default name
//! - **Protocol Selector**: legacy vs current signing per network
//! - **Update Coordinator**: serialized derive → clone → commit with an
//!   IDLE / LOADING / FINISH progress signal
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use wallet_keyring::{Keyring, Storage, WalletConfig, WalletUpdateCoordinator};
//!
//! let config = WalletConfig::from_env();
//! let storage = Storage::new_with_base_dir(config.wallet_dir.clone());
//! let coordinator = WalletUpdateCoordinator::new(config, Arc::new(storage));
//!
//! coordinator.create_wallet(Keyring::generate_hd_wallet()?, None).await?;
//! let account = coordinator.add_account().await?;
//! assert_eq!(account.name, "Account 2");
//! ```

// Public modules
pub mod config;
pub mod coordinator;
pub mod error;
pub mod keyring;
pub mod protocol;
pub mod storage;
pub mod wallet;

// Re-exports for convenience
pub use config::WalletConfig;
pub use coordinator::{UpdateState, WalletUpdateCoordinator};
pub use error::{StorageError, WalletError};
pub use keyring::{
    DerivedKey, DeviceConnector, KeyManager, Keyring, KeyringSigner, KeyringType, SignedPayload,
};
pub use protocol::{select_protocol, ProtocolVersion, LEGACY_NETWORKS};
pub use storage::{Metadata, Storage, WalletStore};
pub use wallet::{default_account_name, Account, AccountFactory, LedgerKey, Wallet};

// Common result type
pub type Result<T> = std::result::Result<T, WalletError>;
