use serde::{Deserialize, Serialize};

use super::{Account, Wallet};
use crate::error::WalletError;
use crate::keyring::{KeyManager, Keyring};

/// Public key reported by a hardware device for one of its accounts
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerKey {
    pub public_key: String,
    pub hd_index: u32,
}

/// Builds new accounts against a wallet snapshot without mutating it.
///
/// Every account gets `index = last_account_index + 1` and the matching
/// default name; the caller adds it to a clone of the wallet.
#[derive(Clone, Debug)]
pub struct AccountFactory {
    keys: KeyManager,
}

impl AccountFactory {
    pub fn new(keys: KeyManager) -> Self {
        Self { keys }
    }

    /// Derive the next account from a seed keyring of `wallet`
    pub fn create_account(
        &self,
        wallet: &Wallet,
        seed_keyring: &Keyring,
    ) -> Result<Account, WalletError> {
        if wallet.keyring(&seed_keyring.id()).is_none() {
            return Err(WalletError::KeyringNotFound(seed_keyring.id().to_string()));
        }
        if !seed_keyring.can_derive_accounts() {
            return Err(WalletError::unsupported(format!(
                "{} keyring cannot derive additional accounts",
                seed_keyring.kind()
            )));
        }

        let index = wallet.next_account_index()?;
        let derived = self.keys.derive(seed_keyring, index)?;
        log::debug!("Derived account {} at {:?}", index, derived.hd_path);

        Ok(Account::from_derived(index, seed_keyring.id(), derived))
    }

    /// First account of a brand-new wallet, at index 0
    pub fn first_account(
        &self,
        keyring: &Keyring,
        ledger: Option<&LedgerKey>,
    ) -> Result<Account, WalletError> {
        self.fixed_account(keyring, 0, ledger)
    }

    /// Account for a newly imported seed, private-key, custodial or airgap keyring
    pub fn import_account(
        &self,
        wallet: &Wallet,
        keyring: &Keyring,
    ) -> Result<Account, WalletError> {
        self.fixed_account(keyring, wallet.next_account_index()?, None)
    }

    /// Account for a key held on a hardware device
    pub fn import_ledger_account(
        &self,
        wallet: &Wallet,
        keyring: &Keyring,
        ledger: &LedgerKey,
    ) -> Result<Account, WalletError> {
        self.fixed_account(keyring, wallet.next_account_index()?, Some(ledger))
    }

    fn fixed_account(
        &self,
        keyring: &Keyring,
        index: u32,
        ledger: Option<&LedgerKey>,
    ) -> Result<Account, WalletError> {
        match keyring {
            Keyring::Airgap(view_only) => Ok(Account::address_only(
                index,
                keyring.id(),
                view_only.address(),
            )),
            Keyring::Ledger(device) => {
                let ledger = ledger.ok_or_else(|| {
                    WalletError::Device(format!(
                        "no public key supplied by {}",
                        device.device()
                    ))
                })?;
                let derived = self.keys.from_device_key(&ledger.public_key, ledger.hd_index)?;
                Ok(Account::from_derived(index, keyring.id(), derived))
            }
            Keyring::HdWallet(_) | Keyring::PrivateKey(_) | Keyring::Web3Auth(_) => {
                let derived = self.keys.derive(keyring, index)?;
                Ok(Account::from_derived(index, keyring.id(), derived))
            }
        }
    }
}
