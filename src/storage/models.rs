//! Data models for wallet storage

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const STORAGE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub keyring_count: usize,
    pub account_count: usize,
}

impl Metadata {
    pub fn new(keyring_count: usize, account_count: usize) -> Self {
        let now = Utc::now();
        Self {
            version: STORAGE_VERSION,
            created_at: now,
            updated_at: now,
            keyring_count,
            account_count,
        }
    }

    /// Metadata for the next save, keeping the original creation time
    pub fn touched(&self, keyring_count: usize, account_count: usize) -> Self {
        Self {
            version: STORAGE_VERSION,
            created_at: self.created_at,
            updated_at: Utc::now(),
            keyring_count,
            account_count,
        }
    }
}
