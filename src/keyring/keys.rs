use bip39::Mnemonic;
use bitcoin::bech32::{self, Bech32, Hrp};
use bitcoin::bip32::{DerivationPath, Xpriv};
use bitcoin::hashes::{hash160, Hash};
use bitcoin::key::rand;
use bitcoin::secp256k1::{PublicKey, Secp256k1, SecretKey};
use bitcoin::Network;
use std::str::FromStr;

use super::Keyring;
use crate::config::WalletConfig;
use crate::error::WalletError;

/// Length of the account hash encoded in an address
const ADDRESS_HASH_LEN: usize = 20;

/// Key material derived for a single account
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DerivedKey {
    pub address: String,
    /// Compressed secp256k1 public key, hex encoded
    pub public_key: String,
    /// Derivation path, for seed-derived keys only
    pub hd_path: Option<String>,
}

/// Key derivation primitive shared by the account factory and the signer.
#[derive(Clone, Debug)]
pub struct KeyManager {
    address_prefix: String,
    coin_type: u32,
}

impl KeyManager {
    pub fn new(config: &WalletConfig) -> Self {
        Self {
            address_prefix: config.address_prefix.clone(),
            coin_type: config.coin_type,
        }
    }

    /// Generate a fresh 24-word mnemonic
    pub fn generate_mnemonic() -> Result<Mnemonic, WalletError> {
        let entropy = rand::random::<[u8; 32]>();

        Mnemonic::from_entropy(&entropy).map_err(|e| WalletError::InvalidMnemonic(e.to_string()))
    }

    pub fn parse_mnemonic(words: &str) -> Result<Mnemonic, WalletError> {
        Mnemonic::parse(words.trim()).map_err(|e| WalletError::InvalidMnemonic(e.to_string()))
    }

    /// Parse a hex encoded secp256k1 secret key, with or without `0x`
    pub fn parse_secret_key(hex_key: &str) -> Result<SecretKey, WalletError> {
        let trimmed = hex_key.trim();
        let raw = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = hex::decode(raw).map_err(|e| WalletError::InvalidPrivateKey(e.to_string()))?;

        SecretKey::from_slice(&bytes).map_err(|e| WalletError::InvalidPrivateKey(e.to_string()))
    }

    pub fn parse_public_key(hex_key: &str) -> Result<PublicKey, WalletError> {
        let bytes = hex::decode(hex_key.trim())
            .map_err(|e| WalletError::InvalidPublicKey(e.to_string()))?;

        PublicKey::from_slice(&bytes).map_err(|e| WalletError::InvalidPublicKey(e.to_string()))
    }

    /// Check that `address` is a bech32 encoded account hash
    pub fn validate_address(address: &str) -> Result<(), WalletError> {
        let (_, data) =
            bech32::decode(address).map_err(|e| WalletError::InvalidAddress(e.to_string()))?;

        if data.len() != ADDRESS_HASH_LEN {
            return Err(WalletError::InvalidAddress(format!(
                "expected {} byte payload, got {}",
                ADDRESS_HASH_LEN,
                data.len()
            )));
        }
        Ok(())
    }

    /// BIP44 path of the account at `index`, "m/44'/118'/0'/0/{index}" by default
    pub fn derivation_path(&self, index: u32) -> String {
        format!("m/44'/{}'/0'/0/{}", self.coin_type, index)
    }

    /// Encode the address of a public key: bech32(prefix, RIPEMD160(SHA256(pk)))
    pub fn address_of(&self, public_key: &PublicKey) -> Result<String, WalletError> {
        let hrp = Hrp::parse(&self.address_prefix)
            .map_err(|e| WalletError::InvalidAddress(e.to_string()))?;
        let hash = hash160::Hash::hash(&public_key.serialize());

        bech32::encode::<Bech32>(hrp, hash.as_byte_array())
            .map_err(|e| WalletError::InvalidAddress(e.to_string()))
    }

    /// Derive the secret key of a mnemonic at `index`
    pub fn derive_secret_key(
        &self,
        mnemonic: &Mnemonic,
        index: u32,
    ) -> Result<SecretKey, WalletError> {
        let secp = Secp256k1::new();
        let seed = mnemonic.to_seed("");

        let master_key = Xpriv::new_master(Network::Bitcoin, &seed)
            .map_err(|e| WalletError::Derivation(e.to_string()))?;

        let path = DerivationPath::from_str(&self.derivation_path(index))
            .map_err(|e| WalletError::Derivation(e.to_string()))?;

        let derived = master_key
            .derive_priv(&secp, &path)
            .map_err(|e| WalletError::Derivation(e.to_string()))?;

        Ok(derived.private_key)
    }

    /// Secret key backing the account at `index` of a signing-capable keyring.
    ///
    /// Seed keyrings derive per index; raw-key keyrings hold a single key.
    pub fn secret_key(&self, keyring: &Keyring, index: u32) -> Result<SecretKey, WalletError> {
        keyring.require_private_key("access private key material")?;

        match keyring {
            Keyring::HdWallet(hd) => {
                let mnemonic = Self::parse_mnemonic(hd.mnemonic())?;
                self.derive_secret_key(&mnemonic, index)
            }
            Keyring::PrivateKey(single) => Self::parse_secret_key(single.private_key()),
            Keyring::Web3Auth(custodial) => Self::parse_secret_key(custodial.private_key()),
            Keyring::Ledger(_) | Keyring::Airgap(_) => Err(WalletError::capability(
                keyring.kind(),
                "access private key material",
            )),
        }
    }

    /// Derive address and public key of the account at `index`.
    ///
    /// Ledger keys never leave the device and airgap keyrings carry no key,
    /// so neither can derive here.
    pub fn derive(&self, keyring: &Keyring, index: u32) -> Result<DerivedKey, WalletError> {
        match keyring {
            Keyring::Ledger(_) => Err(WalletError::unsupported(
                "ledger keys are derived on the device",
            )),
            Keyring::Airgap(_) => Err(WalletError::capability(keyring.kind(), "derive keys")),
            Keyring::HdWallet(_) | Keyring::PrivateKey(_) | Keyring::Web3Auth(_) => {
                let secret_key = self.secret_key(keyring, index)?;
                let public_key = PublicKey::from_secret_key(&Secp256k1::new(), &secret_key);
                let hd_path = keyring
                    .can_derive_accounts()
                    .then(|| self.derivation_path(index));

                Ok(DerivedKey {
                    address: self.address_of(&public_key)?,
                    public_key: hex::encode(public_key.serialize()),
                    hd_path,
                })
            }
        }
    }

    /// Build the key record for a device-held public key
    pub fn from_device_key(
        &self,
        public_key_hex: &str,
        index: u32,
    ) -> Result<DerivedKey, WalletError> {
        let public_key = Self::parse_public_key(public_key_hex)?;

        Ok(DerivedKey {
            address: self.address_of(&public_key)?,
            public_key: hex::encode(public_key.serialize()),
            hd_path: Some(self.derivation_path(index)),
        })
    }
}
