//! Keyrings: the key-management strategies a wallet can hold
//!
//! - `HD_WALLET` - BIP39 seed, derives any number of accounts
//! - `LEDGER` - hardware device, keys never leave it
//! - `PRIVATE_KEY` - single raw secp256k1 key
//! - `WEB3_AUTH` - custodial key handed over by a social login provider
//! - `AIRGAP` - address only, view-only accounts
//!
//! Capabilities are functions of the variant tag alone.

mod keys;
mod signer;

pub use keys::{DerivedKey, KeyManager};
pub use signer::{DeviceConnector, KeyringSigner, SignedPayload};

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::WalletError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyringType {
    #[serde(rename = "HD_WALLET")]
    HdWallet,
    #[serde(rename = "LEDGER")]
    Ledger,
    #[serde(rename = "PRIVATE_KEY")]
    PrivateKey,
    #[serde(rename = "WEB3_AUTH")]
    Web3Auth,
    #[serde(rename = "AIRGAP")]
    Airgap,
}

impl KeyringType {
    pub const ALL: [KeyringType; 5] = [
        KeyringType::HdWallet,
        KeyringType::Ledger,
        KeyringType::PrivateKey,
        KeyringType::Web3Auth,
        KeyringType::Airgap,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            KeyringType::HdWallet => "HD_WALLET",
            KeyringType::Ledger => "LEDGER",
            KeyringType::PrivateKey => "PRIVATE_KEY",
            KeyringType::Web3Auth => "WEB3_AUTH",
            KeyringType::Airgap => "AIRGAP",
        }
    }

    /// Whether the keyring holds (or can reach) private key material in-process
    pub const fn has_private_key(self) -> bool {
        match self {
            KeyringType::HdWallet | KeyringType::PrivateKey | KeyringType::Web3Auth => true,
            KeyringType::Ledger | KeyringType::Airgap => false,
        }
    }

    pub const fn is_address_only(self) -> bool {
        match self {
            KeyringType::Airgap => true,
            KeyringType::HdWallet
            | KeyringType::Ledger
            | KeyringType::PrivateKey
            | KeyringType::Web3Auth => false,
        }
    }

    pub const fn is_hardware_backed(self) -> bool {
        match self {
            KeyringType::Ledger => true,
            KeyringType::HdWallet
            | KeyringType::PrivateKey
            | KeyringType::Web3Auth
            | KeyringType::Airgap => false,
        }
    }

    /// Only seed keyrings derive more than one fixed account
    pub const fn can_derive_accounts(self) -> bool {
        match self {
            KeyringType::HdWallet => true,
            KeyringType::Ledger
            | KeyringType::PrivateKey
            | KeyringType::Web3Auth
            | KeyringType::Airgap => false,
        }
    }

    /// Whether accounts of this keyring can produce signatures at all,
    /// in-process or on a device
    pub const fn can_sign(self) -> bool {
        self.has_private_key() || self.is_hardware_backed()
    }
}

impl fmt::Display for KeyringType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HdWalletKeyring {
    id: Uuid,
    mnemonic: String,
}

impl HdWalletKeyring {
    pub(crate) fn mnemonic(&self) -> &str {
        &self.mnemonic
    }
}

impl fmt::Debug for HdWalletKeyring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HdWalletKeyring")
            .field("id", &self.id)
            .field("mnemonic", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerKeyring {
    id: Uuid,
    device: String,
}

impl LedgerKeyring {
    /// Human-readable device label, e.g. "Nano S"
    pub fn device(&self) -> &str {
        &self.device
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateKeyKeyring {
    id: Uuid,
    private_key: String,
}

impl PrivateKeyKeyring {
    pub(crate) fn private_key(&self) -> &str {
        &self.private_key
    }
}

impl fmt::Debug for PrivateKeyKeyring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKeyKeyring")
            .field("id", &self.id)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Web3AuthKeyring {
    id: Uuid,
    private_key: String,
}

impl Web3AuthKeyring {
    pub(crate) fn private_key(&self) -> &str {
        &self.private_key
    }
}

impl fmt::Debug for Web3AuthKeyring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Web3AuthKeyring")
            .field("id", &self.id)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressKeyring {
    id: Uuid,
    address: String,
}

impl AddressKeyring {
    pub fn address(&self) -> &str {
        &self.address
    }
}

/// One key-management strategy owned by a wallet
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Keyring {
    #[serde(rename = "HD_WALLET")]
    HdWallet(HdWalletKeyring),
    #[serde(rename = "LEDGER")]
    Ledger(LedgerKeyring),
    #[serde(rename = "PRIVATE_KEY")]
    PrivateKey(PrivateKeyKeyring),
    #[serde(rename = "WEB3_AUTH")]
    Web3Auth(Web3AuthKeyring),
    #[serde(rename = "AIRGAP")]
    Airgap(AddressKeyring),
}

impl Keyring {
    /// Seed keyring from an existing mnemonic phrase
    pub fn hd_wallet(words: &str) -> Result<Self, WalletError> {
        let mnemonic = KeyManager::parse_mnemonic(words)?;
        Ok(Keyring::HdWallet(HdWalletKeyring {
            id: Uuid::new_v4(),
            mnemonic: mnemonic.to_string(),
        }))
    }

    /// Seed keyring from a freshly generated mnemonic
    pub fn generate_hd_wallet() -> Result<Self, WalletError> {
        let mnemonic = KeyManager::generate_mnemonic()?;
        Ok(Keyring::HdWallet(HdWalletKeyring {
            id: Uuid::new_v4(),
            mnemonic: mnemonic.to_string(),
        }))
    }

    pub fn private_key(hex_key: &str) -> Result<Self, WalletError> {
        let secret_key = KeyManager::parse_secret_key(hex_key)?;
        Ok(Keyring::PrivateKey(PrivateKeyKeyring {
            id: Uuid::new_v4(),
            private_key: hex::encode(secret_key.secret_bytes()),
        }))
    }

    pub fn web3_auth(hex_key: &str) -> Result<Self, WalletError> {
        let secret_key = KeyManager::parse_secret_key(hex_key)?;
        Ok(Keyring::Web3Auth(Web3AuthKeyring {
            id: Uuid::new_v4(),
            private_key: hex::encode(secret_key.secret_bytes()),
        }))
    }

    pub fn ledger(device: &str) -> Self {
        Keyring::Ledger(LedgerKeyring {
            id: Uuid::new_v4(),
            device: device.to_string(),
        })
    }

    pub fn airgap(address: &str) -> Result<Self, WalletError> {
        let address = address.trim();
        KeyManager::validate_address(address)?;
        Ok(Keyring::Airgap(AddressKeyring {
            id: Uuid::new_v4(),
            address: address.to_string(),
        }))
    }

    pub fn id(&self) -> Uuid {
        match self {
            Keyring::HdWallet(k) => k.id,
            Keyring::Ledger(k) => k.id,
            Keyring::PrivateKey(k) => k.id,
            Keyring::Web3Auth(k) => k.id,
            Keyring::Airgap(k) => k.id,
        }
    }

    pub fn kind(&self) -> KeyringType {
        match self {
            Keyring::HdWallet(_) => KeyringType::HdWallet,
            Keyring::Ledger(_) => KeyringType::Ledger,
            Keyring::PrivateKey(_) => KeyringType::PrivateKey,
            Keyring::Web3Auth(_) => KeyringType::Web3Auth,
            Keyring::Airgap(_) => KeyringType::Airgap,
        }
    }

    pub fn has_private_key(&self) -> bool {
        self.kind().has_private_key()
    }

    pub fn is_address_only(&self) -> bool {
        self.kind().is_address_only()
    }

    pub fn is_hardware_backed(&self) -> bool {
        self.kind().is_hardware_backed()
    }

    pub fn can_derive_accounts(&self) -> bool {
        self.kind().can_derive_accounts()
    }

    /// Fail with a capability error unless the keyring holds private key material
    pub fn require_private_key(&self, operation: &'static str) -> Result<(), WalletError> {
        if self.has_private_key() {
            Ok(())
        } else {
            Err(WalletError::capability(self.kind(), operation))
        }
    }

    /// Export the secret backing this keyring: the mnemonic phrase of a seed
    /// keyring, or the hex private key of a single-key keyring.
    pub fn export_secret(&self) -> Result<String, WalletError> {
        self.require_private_key("export secret")?;

        match self {
            Keyring::HdWallet(k) => Ok(k.mnemonic.clone()),
            Keyring::PrivateKey(k) => Ok(k.private_key.clone()),
            Keyring::Web3Auth(k) => Ok(k.private_key.clone()),
            Keyring::Ledger(_) | Keyring::Airgap(_) => {
                Err(WalletError::capability(self.kind(), "export secret"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PHRASE: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
    const ADDRESS: &str = "g1jg8mtutu9khhfwc4nxmuhcpftf0pajdhfvsqf5";

    fn one_of_each() -> Vec<Keyring> {
        vec![
            Keyring::hd_wallet(PHRASE).unwrap(),
            Keyring::ledger("Nano X"),
            Keyring::private_key(&"11".repeat(32)).unwrap(),
            Keyring::web3_auth(&"22".repeat(32)).unwrap(),
            Keyring::Airgap(AddressKeyring {
                id: Uuid::new_v4(),
                address: ADDRESS.to_string(),
            }),
        ]
    }

    #[test]
    fn test_has_private_key_by_variant() {
        for keyring in one_of_each() {
            let expected = matches!(
                keyring.kind(),
                KeyringType::HdWallet | KeyringType::PrivateKey | KeyringType::Web3Auth
            );
            assert_eq!(keyring.has_private_key(), expected, "{}", keyring.kind());
        }
    }

    #[test]
    fn test_capabilities_are_exclusive() {
        for kind in KeyringType::ALL {
            if kind.is_address_only() {
                assert!(!kind.has_private_key());
                assert!(!kind.can_sign());
            }
            if kind.is_hardware_backed() {
                assert!(!kind.has_private_key());
                assert!(kind.can_sign());
            }
            if kind.can_derive_accounts() {
                assert!(kind.has_private_key());
            }
        }
        assert_eq!(
            KeyringType::ALL
                .iter()
                .filter(|k| k.can_derive_accounts())
                .count(),
            1
        );
    }

    #[test]
    fn test_export_secret_requires_private_key() {
        let seed = Keyring::hd_wallet(PHRASE).unwrap();
        assert_eq!(seed.export_secret().unwrap(), PHRASE);

        let single = Keyring::private_key(&format!("0x{}", "AB".repeat(32))).unwrap();
        assert_eq!(single.export_secret().unwrap(), "ab".repeat(32));

        let ledger = Keyring::ledger("Nano S");
        assert!(matches!(
            ledger.export_secret(),
            Err(WalletError::Capability {
                keyring: KeyringType::Ledger,
                ..
            })
        ));
    }

    #[test]
    fn test_invalid_material_is_rejected() {
        assert!(matches!(
            Keyring::hd_wallet("not a mnemonic"),
            Err(WalletError::InvalidMnemonic(_))
        ));
        assert!(matches!(
            Keyring::web3_auth("1234"),
            Err(WalletError::InvalidPrivateKey(_))
        ));
        assert!(matches!(
            Keyring::airgap("g1short"),
            Err(WalletError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let seed = Keyring::hd_wallet(PHRASE).unwrap();
        let rendered = format!("{:?}", seed);
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("abandon"));

        let single = Keyring::private_key(&"11".repeat(32)).unwrap();
        assert!(!format!("{:?}", single).contains(&"11".repeat(32)));
    }

    #[test]
    fn test_serde_tag_round_trip() {
        let keyring = Keyring::web3_auth(&"33".repeat(32)).unwrap();
        let json = serde_json::to_value(&keyring).unwrap();
        assert_eq!(json["type"], "WEB3_AUTH");

        let back: Keyring = serde_json::from_value(json).unwrap();
        assert_eq!(back, keyring);
        assert_eq!(back.kind(), KeyringType::Web3Auth);
    }
}
