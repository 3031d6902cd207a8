//! Wallet snapshot and account derivation
//!
//! - `account.rs` - Account record and default naming
//! - `factory.rs` - Derives and imports accounts against a snapshot
//!
//! A [`Wallet`] is a value: every change is made on a clone which replaces
//! the canonical snapshot only once all steps succeeded.

mod account;
mod factory;

pub use account::{default_account_name, Account};
pub use factory::{AccountFactory, LedgerKey};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use crate::error::WalletError;
use crate::keyring::Keyring;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    keyrings: Vec<Keyring>,
    accounts: Vec<Account>,
    last_account_index: u32,
    current_account_id: Option<Uuid>,
}

impl Wallet {
    /// First snapshot of a wallet: one keyring and its first account, selected as current
    pub fn initial(keyring: Keyring, account: Account) -> Result<Self, WalletError> {
        let wallet = Self {
            last_account_index: account.index,
            current_account_id: Some(account.id),
            keyrings: vec![keyring],
            accounts: vec![account],
        };
        wallet.validate()?;
        Ok(wallet)
    }

    pub fn keyrings(&self) -> &[Keyring] {
        &self.keyrings
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn last_account_index(&self) -> u32 {
        self.last_account_index
    }

    pub fn current_account_id(&self) -> Option<Uuid> {
        self.current_account_id
    }

    pub fn current_account(&self) -> Option<&Account> {
        self.current_account_id.and_then(|id| self.account(&id))
    }

    pub fn account(&self, id: &Uuid) -> Option<&Account> {
        self.accounts.iter().find(|account| account.id == *id)
    }

    pub fn keyring(&self, id: &Uuid) -> Option<&Keyring> {
        self.keyrings.iter().find(|keyring| keyring.id() == *id)
    }

    pub fn keyring_of(&self, account: &Account) -> Option<&Keyring> {
        self.keyring(&account.keyring_id)
    }

    /// The keyring new accounts are derived from: the first seed keyring
    pub fn primary_seed_keyring(&self) -> Option<&Keyring> {
        self.keyrings
            .iter()
            .find(|keyring| keyring.can_derive_accounts())
    }

    /// Whether the account can produce signatures (in-process or on a device)
    pub fn is_signing_capable(&self, account_id: &Uuid) -> bool {
        self.account(account_id)
            .and_then(|account| self.keyring_of(account))
            .map(|keyring| keyring.kind().can_sign())
            .unwrap_or(false)
    }

    pub fn next_account_index(&self) -> Result<u32, WalletError> {
        self.last_account_index
            .checked_add(1)
            .ok_or_else(|| WalletError::unsupported("account index space exhausted"))
    }

    pub fn add_keyring(&mut self, keyring: Keyring) -> Result<(), WalletError> {
        if self.keyring(&keyring.id()).is_some() {
            return Err(WalletError::DuplicateKeyring(keyring.id().to_string()));
        }
        self.keyrings.push(keyring);
        Ok(())
    }

    /// Append an account and advance `last_account_index` to cover it
    pub fn add_account(&mut self, account: Account) -> Result<(), WalletError> {
        if self.account(&account.id).is_some() {
            return Err(WalletError::DuplicateAccount(account.id.to_string()));
        }
        let keyring = self
            .keyring(&account.keyring_id)
            .ok_or_else(|| WalletError::KeyringNotFound(account.keyring_id.to_string()))?;

        if keyring.can_derive_accounts() && self.seed_index_taken(account.index) {
            return Err(WalletError::DuplicateAccount(format!(
                "seed index {} already in use",
                account.index
            )));
        }

        self.last_account_index = self.last_account_index.max(account.index);
        self.accounts.push(account);
        Ok(())
    }

    pub fn set_current_account(&mut self, id: &Uuid) -> Result<(), WalletError> {
        if self.account(id).is_none() {
            return Err(WalletError::AccountNotFound(id.to_string()));
        }
        self.current_account_id = Some(*id);
        Ok(())
    }

    /// Rename an account. The index is left untouched.
    pub fn rename_account(&mut self, id: &Uuid, name: &str) -> Result<(), WalletError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(WalletError::InvalidAccountName(
                "name must not be empty".into(),
            ));
        }
        let account = self
            .accounts
            .iter_mut()
            .find(|account| account.id == *id)
            .ok_or_else(|| WalletError::AccountNotFound(id.to_string()))?;
        account.name = name.to_string();
        Ok(())
    }

    /// Remove an account. A keyring left without accounts is removed with it.
    pub fn remove_account(&mut self, id: &Uuid) -> Result<Account, WalletError> {
        let position = self
            .accounts
            .iter()
            .position(|account| account.id == *id)
            .ok_or_else(|| WalletError::AccountNotFound(id.to_string()))?;
        if self.accounts.len() == 1 {
            return Err(WalletError::unsupported("cannot remove the last account"));
        }

        let removed = self.accounts.remove(position);
        if !self
            .accounts
            .iter()
            .any(|account| account.keyring_id == removed.keyring_id)
        {
            self.keyrings
                .retain(|keyring| keyring.id() != removed.keyring_id);
        }
        self.repoint_current_account();
        Ok(removed)
    }

    /// Remove a keyring and every account bound to it
    pub fn remove_keyring(&mut self, id: &Uuid) -> Result<Vec<Account>, WalletError> {
        if self.keyring(id).is_none() {
            return Err(WalletError::KeyringNotFound(id.to_string()));
        }
        if self.accounts.iter().all(|account| account.keyring_id == *id) {
            return Err(WalletError::unsupported(
                "cannot remove the keyring holding every account",
            ));
        }

        let (removed, kept): (Vec<_>, Vec<_>) = self
            .accounts
            .drain(..)
            .partition(|account| account.keyring_id == *id);
        self.accounts = kept;
        self.keyrings.retain(|keyring| keyring.id() != *id);
        self.repoint_current_account();
        Ok(removed)
    }

    /// Check every snapshot invariant
    pub fn validate(&self) -> Result<(), WalletError> {
        let mut keyring_ids = HashSet::new();
        for keyring in &self.keyrings {
            if !keyring_ids.insert(keyring.id()) {
                return Err(WalletError::InvalidWallet(format!(
                    "duplicate keyring {}",
                    keyring.id()
                )));
            }
        }

        let mut account_ids = HashSet::new();
        let mut seed_indices = HashSet::new();
        for account in &self.accounts {
            if !account_ids.insert(account.id) {
                return Err(WalletError::InvalidWallet(format!(
                    "duplicate account {}",
                    account.id
                )));
            }
            let keyring = self.keyring_of(account).ok_or_else(|| {
                WalletError::InvalidWallet(format!(
                    "account {} references missing keyring {}",
                    account.id, account.keyring_id
                ))
            })?;
            if keyring.can_derive_accounts() {
                if !seed_indices.insert(account.index) {
                    return Err(WalletError::InvalidWallet(format!(
                        "seed index {} used twice",
                        account.index
                    )));
                }
                if account.index > self.last_account_index {
                    return Err(WalletError::InvalidWallet(format!(
                        "account index {} exceeds last account index {}",
                        account.index, self.last_account_index
                    )));
                }
            }
        }

        if let Some(current) = self.current_account_id {
            if !account_ids.contains(&current) {
                return Err(WalletError::InvalidWallet(format!(
                    "current account {} is not in the wallet",
                    current
                )));
            }
        }
        Ok(())
    }

    fn seed_index_taken(&self, index: u32) -> bool {
        self.accounts.iter().any(|account| {
            account.index == index
                && self
                    .keyring_of(account)
                    .map(Keyring::can_derive_accounts)
                    .unwrap_or(false)
        })
    }

    fn repoint_current_account(&mut self) {
        let still_present = self
            .current_account_id
            .map(|id| self.account(&id).is_some())
            .unwrap_or(false);
        if !still_present {
            self.current_account_id = self.accounts.first().map(|account| account.id);
        }
    }
}
