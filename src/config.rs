/// Wallet configuration from environment variables
///
/// Controls the target network, address encoding and storage location.
/// Defaults to the `test5` network with `g` addresses.
use std::env;
use std::path::PathBuf;

pub const DEFAULT_CHAIN_ID: &str = "test5";
pub const DEFAULT_ADDRESS_PREFIX: &str = "g";
pub const DEFAULT_WALLET_DIR: &str = "./wallets";
pub const DEFAULT_COIN_TYPE: u32 = 118;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WalletConfig {
    /// Network identifier handed to the protocol selector when signing
    pub chain_id: String,
    /// Bech32 human-readable part of derived addresses
    pub address_prefix: String,
    /// Base directory of the file storage
    pub wallet_dir: PathBuf,
    /// BIP44 coin type
    pub coin_type: u32,
}

impl WalletConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `CHAIN_ID`: network identifier (default "test5")
    /// - `ADDRESS_PREFIX`: bech32 prefix (default "g")
    /// - `WALLET_DIR`: storage directory (default "./wallets")
    /// - `COIN_TYPE`: BIP44 coin type (default 118)
    ///
    /// # Examples
    ///
    /// ```bash
    /// # Sign against the legacy testnet
    /// CHAIN_ID=test3 cargo run -- add-account
    /// ```
    pub fn from_env() -> Self {
        let chain_id = env::var("CHAIN_ID")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CHAIN_ID.to_string());
        log::info!("🌐 Chain ID: {}", chain_id);

        let address_prefix = env::var("ADDRESS_PREFIX")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ADDRESS_PREFIX.to_string())
            .to_lowercase();

        let wallet_dir = env::var("WALLET_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_WALLET_DIR));
        log::info!("📁 Wallet directory: {}", wallet_dir.display());

        let coin_type = match env::var("COIN_TYPE") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                log::warn!(
                    "⚠️  Invalid COIN_TYPE '{}', defaulting to {}",
                    raw,
                    DEFAULT_COIN_TYPE
                );
                DEFAULT_COIN_TYPE
            }),
            Err(_) => DEFAULT_COIN_TYPE,
        };

        Self {
            chain_id,
            address_prefix,
            wallet_dir,
            coin_type,
        }
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            chain_id: DEFAULT_CHAIN_ID.to_string(),
            address_prefix: DEFAULT_ADDRESS_PREFIX.to_string(),
            wallet_dir: PathBuf::from(DEFAULT_WALLET_DIR),
            coin_type: DEFAULT_COIN_TYPE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WalletConfig::default();
        assert_eq!(config.chain_id, "test5");
        assert_eq!(config.address_prefix, "g");
        assert_eq!(config.coin_type, 118);
    }
}
