use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::keyring::DerivedKey;

/// Default display name for the account at `index`.
///
/// Indices are 0-based, display numbers 1-based: index 1 is "Account 2".
pub fn default_account_name(index: u32) -> String {
    format!("Account {}", u64::from(index) + 1)
}

/// A named, indexed identity bound to one keyring of the same wallet
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub index: u32,
    pub name: String,
    /// Owning keyring, by id
    pub keyring_id: Uuid,
    pub address: String,
    /// Hex public key; absent for address-only accounts
    pub public_key: Option<String>,
    /// Derivation path for seed and device accounts
    pub hd_path: Option<String>,
}

impl Account {
    pub(crate) fn from_derived(index: u32, keyring_id: Uuid, key: DerivedKey) -> Self {
        Self {
            id: Uuid::new_v4(),
            index,
            name: default_account_name(index),
            keyring_id,
            address: key.address,
            public_key: Some(key.public_key),
            hd_path: key.hd_path,
        }
    }

    pub(crate) fn address_only(index: u32, keyring_id: Uuid, address: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            index,
            name: default_account_name(index),
            keyring_id,
            address: address.to_string(),
            public_key: None,
            hd_path: None,
        }
    }
}
