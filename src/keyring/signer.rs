use bitcoin::hashes::{sha256, Hash};
use bitcoin::secp256k1::{ecdsa::Signature, Message, PublicKey, Secp256k1};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{KeyManager, Keyring, LedgerKeyring};
use crate::error::WalletError;
use crate::protocol::{select_protocol, ProtocolVersion};
use crate::wallet::Account;

/// Hardware device bridge for ledger keyrings.
///
/// `sign` may block on user confirmation; callers run it off the async runtime.
pub trait DeviceConnector: Send + Sync {
    /// Sign `sign_bytes` with the key at `hd_path`, returning a 64-byte compact signature
    fn sign(
        &self,
        keyring: &LedgerKeyring,
        hd_path: &str,
        sign_bytes: &[u8],
    ) -> Result<Vec<u8>, WalletError>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedPayload {
    pub protocol: ProtocolVersion,
    /// Compact ECDSA signature over SHA256(payload), hex encoded
    pub signature: String,
    pub public_key: String,
}

/// Signs payloads on behalf of wallet accounts.
///
/// Software keyrings sign in-process, ledger keyrings go through the
/// connected device, airgap keyrings never sign.
#[derive(Clone)]
pub struct KeyringSigner {
    keys: KeyManager,
    device: Option<Arc<dyn DeviceConnector>>,
}

impl KeyringSigner {
    pub fn new(keys: KeyManager) -> Self {
        Self { keys, device: None }
    }

    pub fn with_device(mut self, device: Arc<dyn DeviceConnector>) -> Self {
        self.device = Some(device);
        self
    }

    pub fn sign(
        &self,
        keyring: &Keyring,
        account: &Account,
        payload: &[u8],
        chain_id: &str,
    ) -> Result<SignedPayload, WalletError> {
        if account.keyring_id != keyring.id() {
            return Err(WalletError::KeyringNotFound(format!(
                "account {} does not belong to keyring {}",
                account.id,
                keyring.id()
            )));
        }

        let protocol = select_protocol(chain_id);
        log::debug!(
            "Signing for account {} with {} keyring ({} protocol)",
            account.id,
            keyring.kind(),
            protocol
        );

        match keyring {
            Keyring::Ledger(ledger) => self.sign_on_device(ledger, account, payload, protocol),
            Keyring::Airgap(_) => Err(WalletError::capability(keyring.kind(), "sign")),
            Keyring::HdWallet(_) | Keyring::PrivateKey(_) | Keyring::Web3Auth(_) => {
                keyring.require_private_key("sign")?;

                let secp = Secp256k1::new();
                let secret_key = self.keys.secret_key(keyring, account.index)?;
                let public_key = PublicKey::from_secret_key(&secp, &secret_key);

                // Stored address must match the key that signs for it
                if self.keys.address_of(&public_key)? != account.address {
                    return Err(WalletError::Derivation(format!(
                        "key for account {} does not match its address",
                        account.id
                    )));
                }

                let signature = secp.sign_ecdsa(&digest(payload), &secret_key);

                Ok(SignedPayload {
                    protocol,
                    signature: hex::encode(signature.serialize_compact()),
                    public_key: hex::encode(public_key.serialize()),
                })
            }
        }
    }

    fn sign_on_device(
        &self,
        ledger: &LedgerKeyring,
        account: &Account,
        payload: &[u8],
        protocol: ProtocolVersion,
    ) -> Result<SignedPayload, WalletError> {
        let device = self
            .device
            .as_ref()
            .ok_or_else(|| WalletError::Device(format!("{} is not connected", ledger.device())))?;
        let hd_path = account.hd_path.as_deref().ok_or_else(|| {
            WalletError::Device(format!("account {} has no derivation path", account.id))
        })?;
        let public_key = account.public_key.clone().ok_or_else(|| {
            WalletError::Device(format!("account {} has no public key", account.id))
        })?;

        let signature = device.sign(ledger, hd_path, payload)?;
        let parsed =
            Signature::from_compact(&signature).map_err(|e| WalletError::Device(e.to_string()))?;
        let account_key = KeyManager::parse_public_key(&public_key)?;
        Secp256k1::verification_only()
            .verify_ecdsa(&digest(payload), &parsed, &account_key)
            .map_err(|_| {
                WalletError::Device(format!(
                    "{} signed with a key other than account {}",
                    ledger.device(),
                    account.id
                ))
            })?;

        Ok(SignedPayload {
            protocol,
            signature: hex::encode(signature),
            public_key,
        })
    }

    /// Check a signature produced by [`KeyringSigner::sign`]
    pub fn verify(payload: &[u8], signed: &SignedPayload) -> Result<bool, WalletError> {
        let public_key = KeyManager::parse_public_key(&signed.public_key)?;
        let bytes = hex::decode(&signed.signature)
            .map_err(|e| WalletError::Internal(format!("invalid signature hex: {}", e)))?;
        let signature = Signature::from_compact(&bytes)
            .map_err(|e| WalletError::Internal(format!("invalid signature: {}", e)))?;

        Ok(Secp256k1::verification_only()
            .verify_ecdsa(&digest(payload), &signature, &public_key)
            .is_ok())
    }
}

fn digest(payload: &[u8]) -> Message {
    Message::from_digest(sha256::Hash::hash(payload).to_byte_array())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WalletConfig;
    use crate::wallet::{AccountFactory, LedgerKey, Wallet};

    const PHRASE: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    struct SoftwareDevice {
        keys: KeyManager,
        seed: Keyring,
        index: u32,
    }

    impl DeviceConnector for SoftwareDevice {
        fn sign(
            &self,
            _keyring: &LedgerKeyring,
            _hd_path: &str,
            sign_bytes: &[u8],
        ) -> Result<Vec<u8>, WalletError> {
            let secret_key = self.keys.secret_key(&self.seed, self.index)?;
            let signature = Secp256k1::new().sign_ecdsa(&digest(sign_bytes), &secret_key);
            Ok(signature.serialize_compact().to_vec())
        }
    }

    fn setup() -> (KeyManager, AccountFactory, Wallet) {
        let config = WalletConfig::default();
        let keys = KeyManager::new(&config);
        let factory = AccountFactory::new(keys.clone());
        let seed = Keyring::hd_wallet(PHRASE).unwrap();
        let first = factory.first_account(&seed, None).unwrap();
        let wallet = Wallet::initial(seed, first).unwrap();
        (keys, factory, wallet)
    }

    #[test]
    fn test_seed_account_signs_and_verifies() {
        let (keys, _, wallet) = setup();
        let account = wallet.current_account().unwrap();
        let keyring = wallet.keyring_of(account).unwrap();

        let signed = KeyringSigner::new(keys)
            .sign(keyring, account, b"payload", "test5")
            .unwrap();

        assert_eq!(signed.protocol, ProtocolVersion::Current);
        assert_eq!(account.public_key.as_deref(), Some(signed.public_key.as_str()));
        assert!(KeyringSigner::verify(b"payload", &signed).unwrap());
        assert!(!KeyringSigner::verify(b"tampered", &signed).unwrap());
    }

    #[test]
    fn test_legacy_network_selects_legacy_protocol() {
        let (keys, _, wallet) = setup();
        let account = wallet.current_account().unwrap();
        let keyring = wallet.keyring_of(account).unwrap();

        let signed = KeyringSigner::new(keys)
            .sign(keyring, account, b"payload", "test3")
            .unwrap();
        assert_eq!(signed.protocol, ProtocolVersion::Legacy);
    }

    #[test]
    fn test_airgap_account_cannot_sign() {
        let (keys, factory, wallet) = setup();
        let address = wallet.current_account().unwrap().address.clone();
        let airgap = Keyring::airgap(&address).unwrap();
        let account = factory.import_account(&wallet, &airgap).unwrap();

        let result = KeyringSigner::new(keys).sign(&airgap, &account, b"payload", "test5");
        assert!(matches!(result, Err(WalletError::Capability { .. })));
    }

    #[test]
    fn test_ledger_requires_connected_device() {
        let (keys, factory, wallet) = setup();
        let seed = wallet.keyrings()[0].clone();
        let public_key = keys.derive(&seed, 0).unwrap().public_key;

        let ledger = Keyring::ledger("Nano S");
        let account = factory
            .import_ledger_account(
                &wallet,
                &ledger,
                &LedgerKey {
                    public_key,
                    hd_index: 0,
                },
            )
            .unwrap();

        let disconnected = KeyringSigner::new(keys.clone());
        assert!(matches!(
            disconnected.sign(&ledger, &account, b"payload", "test5"),
            Err(WalletError::Device(_))
        ));

        let connected = KeyringSigner::new(keys.clone()).with_device(Arc::new(SoftwareDevice {
            keys,
            seed,
            index: 0,
        }));
        let signed = connected.sign(&ledger, &account, b"payload", "test5").unwrap();
        assert!(KeyringSigner::verify(b"payload", &signed).unwrap());
    }

    #[test]
    fn test_device_signature_must_match_account_key() {
        let (keys, factory, wallet) = setup();
        let seed = wallet.keyrings()[0].clone();
        let public_key = keys.derive(&seed, 0).unwrap().public_key;

        let ledger = Keyring::ledger("Nano S");
        let account = factory
            .import_ledger_account(
                &wallet,
                &ledger,
                &LedgerKey {
                    public_key,
                    hd_index: 0,
                },
            )
            .unwrap();

        let wrong_key = KeyringSigner::new(keys.clone()).with_device(Arc::new(SoftwareDevice {
            keys,
            seed,
            index: 1,
        }));
        assert!(matches!(
            wrong_key.sign(&ledger, &account, b"payload", "test5"),
            Err(WalletError::Device(_))
        ));
    }

    #[test]
    fn test_rejects_foreign_keyring() {
        let (keys, _, wallet) = setup();
        let account = wallet.current_account().unwrap();
        let other = Keyring::hd_wallet(PHRASE).unwrap();

        let result = KeyringSigner::new(keys).sign(&other, account, b"payload", "test5");
        assert!(matches!(result, Err(WalletError::KeyringNotFound(_))));
    }
}
