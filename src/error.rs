//! Error types for keyring and wallet operations

use thiserror::Error;

use crate::keyring::KeyringType;

#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Keyring {keyring} cannot {operation}")]
    Capability {
        keyring: KeyringType,
        operation: &'static str,
    },

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Duplicate account: {0}")]
    DuplicateAccount(String),

    #[error("Duplicate keyring: {0}")]
    DuplicateKeyring(String),

    #[error("No wallet loaded")]
    NoWallet,

    #[error("Wallet already exists")]
    WalletExists,

    #[error("Another wallet update is in progress")]
    UpdateInProgress,

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Keyring not found: {0}")]
    KeyringNotFound(String),

    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Invalid account name: {0}")]
    InvalidAccountName(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Derivation error: {0}")]
    Derivation(String),

    #[error("Device error: {0}")]
    Device(String),

    #[error("Invalid wallet snapshot: {0}")]
    InvalidWallet(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] StorageError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl WalletError {
    pub fn capability(keyring: KeyringType, operation: &'static str) -> Self {
        Self::Capability { keyring, operation }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedOperation(msg.into())
    }

    /// Errors a caller may resolve by retrying a fresh attempt
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Persistence(_) | Self::UpdateInProgress | Self::Device(_)
        )
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Storage task failed: {0}")]
    Task(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_message_names_keyring() {
        let err = WalletError::capability(KeyringType::Airgap, "sign");
        assert_eq!(err.to_string(), "Keyring AIRGAP cannot sign");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_storage_errors_are_retryable() {
        let err: WalletError = StorageError::Unavailable("disk full".into()).into();
        assert!(matches!(err, WalletError::Persistence(_)));
        assert!(err.is_retryable());
    }
}
