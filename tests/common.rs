//! Common test utilities for wallet keyring integration tests
//!
//! This module provides shared test infrastructure including:
//! - Temp-dir backed coordinator setup
//! - Stores that fail or block on save, for the abort and concurrency paths
//! - Logger initialisation
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use tempfile::TempDir;
use wallet_keyring::{
    Keyring, Storage, StorageError, Wallet, WalletConfig, WalletStore, WalletUpdateCoordinator,
};

pub const PHRASE: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

pub fn init_logger() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init()
        .ok();
}

/// Test environment with a coordinator over file storage in a temp dir
pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub config: WalletConfig,
    pub coordinator: WalletUpdateCoordinator,
}

impl TestEnvironment {
    pub fn new() -> anyhow::Result<Self> {
        init_logger();

        let temp_dir = TempDir::new()?;
        log::info!("📁 Test directory: {:?}", temp_dir.path());

        let config = WalletConfig {
            wallet_dir: temp_dir.path().to_path_buf(),
            ..Default::default()
        };
        let coordinator = coordinator_over(&config);

        Ok(Self {
            temp_dir,
            config,
            coordinator,
        })
    }

    /// A second coordinator over the same directory, as after a restart
    pub fn reopen(&self) -> WalletUpdateCoordinator {
        coordinator_over(&self.config)
    }

    /// Environment holding a single seed keyring with "Account 1" at index 0
    pub async fn with_seed_wallet() -> anyhow::Result<Self> {
        let env = Self::new()?;
        env.coordinator
            .create_wallet(Keyring::hd_wallet(PHRASE)?, None)
            .await?;
        Ok(env)
    }
}

fn coordinator_over(config: &WalletConfig) -> WalletUpdateCoordinator {
    let storage = Storage::new_with_base_dir(config.wallet_dir.clone());
    WalletUpdateCoordinator::new(config.clone(), Arc::new(storage))
}

/// In-memory store whose saves can be switched to fail
#[derive(Default)]
pub struct FlakyStore {
    saved: Mutex<Option<Wallet>>,
    failing: AtomicBool,
    pub save_attempts: AtomicUsize,
}

impl FlakyStore {
    pub fn holding(wallet: Wallet) -> Self {
        Self {
            saved: Mutex::new(Some(wallet)),
            ..Default::default()
        }
    }

    pub fn fail_saves(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn saved(&self) -> Option<Wallet> {
        self.saved.lock().unwrap().clone()
    }
}

impl WalletStore for FlakyStore {
    fn load(&self) -> Result<Option<Wallet>, StorageError> {
        Ok(self.saved())
    }

    fn save(&self, wallet: &Wallet) -> Result<(), StorageError> {
        self.save_attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("simulated write failure".into()));
        }
        *self.saved.lock().unwrap() = Some(wallet.clone());
        Ok(())
    }
}

pub fn flaky_coordinator() -> (Arc<FlakyStore>, WalletUpdateCoordinator) {
    init_logger();
    let store = Arc::new(FlakyStore::default());
    let coordinator = WalletUpdateCoordinator::new(WalletConfig::default(), store.clone());
    (store, coordinator)
}

/// Store whose saves block until released, once armed
pub struct GatedStore {
    inner: FlakyStore,
    armed: AtomicBool,
    gate: Mutex<mpsc::Receiver<()>>,
}

impl GatedStore {
    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    pub fn disarm(&self) {
        self.armed.store(false, Ordering::SeqCst);
    }

    pub fn saved(&self) -> Option<Wallet> {
        self.inner.saved()
    }
}

impl WalletStore for GatedStore {
    fn load(&self) -> Result<Option<Wallet>, StorageError> {
        self.inner.load()
    }

    fn save(&self, wallet: &Wallet) -> Result<(), StorageError> {
        if self.armed.load(Ordering::SeqCst) {
            self.gate
                .lock()
                .unwrap()
                .recv()
                .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        }
        self.inner.save(wallet)
    }
}

pub fn gated_coordinator() -> (Arc<GatedStore>, mpsc::Sender<()>, WalletUpdateCoordinator) {
    init_logger();
    let (release, gate) = mpsc::channel();
    let store = Arc::new(GatedStore {
        inner: FlakyStore::default(),
        armed: AtomicBool::new(false),
        gate: Mutex::new(gate),
    });
    let coordinator = WalletUpdateCoordinator::new(WalletConfig::default(), store.clone());
    (store, release, coordinator)
}
