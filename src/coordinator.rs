/// Wallet Update Coordinator - Orchestration Layer
///
/// Every change to the account set runs as one critical section:
/// derive → clone → mutate clone → select as current → persist → publish.
/// Readers only ever see the snapshot that was canonical before the update
/// or the one published after it.
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::{watch, Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::config::WalletConfig;
use crate::error::{StorageError, WalletError};
use crate::keyring::{DeviceConnector, KeyManager, Keyring, KeyringSigner, SignedPayload};
use crate::storage::WalletStore;
use crate::wallet::{Account, AccountFactory, LedgerKey, Wallet};

/// Progress signal of the update in flight
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpdateState {
    Idle,
    Loading,
    Finish,
}

enum Precondition {
    WalletLoaded,
    NoWallet,
}

/// Holds the state at LOADING until finished; dropping it unfinished
/// (failure or cancellation) falls back to IDLE.
struct Progress {
    state: Arc<watch::Sender<UpdateState>>,
    finished: bool,
}

impl Progress {
    fn begin(state: Arc<watch::Sender<UpdateState>>) -> Self {
        state.send_replace(UpdateState::Loading);
        Self {
            state,
            finished: false,
        }
    }

    fn finish(mut self) {
        self.finished = true;
        self.state.send_replace(UpdateState::Finish);
    }
}

impl Drop for Progress {
    fn drop(&mut self) {
        if !self.finished {
            self.state.send_replace(UpdateState::Idle);
        }
    }
}

pub struct WalletUpdateCoordinator {
    config: WalletConfig,
    store: Arc<dyn WalletStore>,
    factory: AccountFactory,
    signer: KeyringSigner,
    canonical: Arc<RwLock<Option<Arc<Wallet>>>>,
    update_lock: Arc<Mutex<()>>,
    state: Arc<watch::Sender<UpdateState>>,
}

impl WalletUpdateCoordinator {
    // ============================================================================
    // Constructor
    // ============================================================================

    pub fn new(config: WalletConfig, store: Arc<dyn WalletStore>) -> Self {
        let keys = KeyManager::new(&config);
        let (state, _) = watch::channel(UpdateState::Idle);

        Self {
            config,
            store,
            factory: AccountFactory::new(keys.clone()),
            signer: KeyringSigner::new(keys),
            canonical: Arc::new(RwLock::new(None)),
            update_lock: Arc::new(Mutex::new(())),
            state: Arc::new(state),
        }
    }

    /// Attach a hardware device used to sign for ledger accounts
    pub fn with_device(mut self, device: Arc<dyn DeviceConnector>) -> Self {
        self.signer = self.signer.with_device(device);
        self
    }

    // ============================================================================
    // Readers
    // ============================================================================

    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    pub fn state(&self) -> UpdateState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<UpdateState> {
        self.state.subscribe()
    }

    /// The canonical wallet snapshot
    pub fn wallet(&self) -> Option<Arc<Wallet>> {
        self.canonical
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn current_account(&self) -> Option<Account> {
        self.wallet()
            .and_then(|wallet| wallet.current_account().cloned())
    }

    /// Whether an add-account update could succeed right now
    pub fn can_add_account(&self) -> bool {
        self.wallet()
            .map(|wallet| wallet.primary_seed_keyring().is_some())
            .unwrap_or(false)
    }

    // ============================================================================
    // Loading
    // ============================================================================

    /// Load the persisted wallet and make it canonical
    pub async fn load(&self) -> Result<Option<Arc<Wallet>>, WalletError> {
        let _serialized = self.enter("load wallet")?;

        let store = Arc::clone(&self.store);
        let loaded = tokio::task::spawn_blocking(move || store.load())
            .await
            .map_err(|e| StorageError::Task(e.to_string()))??;

        match loaded {
            Some(wallet) => {
                wallet.validate()?;
                log::info!(
                    "Loaded wallet with {} keyrings and {} accounts",
                    wallet.keyrings().len(),
                    wallet.accounts().len()
                );
                Ok(Some(publish(&self.canonical, wallet)))
            }
            None => {
                log::info!("No stored wallet found");
                Ok(None)
            }
        }
    }

    // ============================================================================
    // Account updates
    // ============================================================================

    /// Create the first wallet snapshot from a keyring and its first account
    pub async fn create_wallet(
        &self,
        keyring: Keyring,
        ledger: Option<LedgerKey>,
    ) -> Result<Account, WalletError> {
        let factory = &self.factory;
        self.update("create wallet", Precondition::NoWallet, |_| {
            let account = factory.first_account(&keyring, ledger.as_ref())?;
            let wallet = Wallet::initial(keyring, account.clone())?;
            Ok((wallet, account))
        })
        .await
    }

    /// Derive the next account from the primary seed keyring and make it current
    pub async fn add_account(&self) -> Result<Account, WalletError> {
        let factory = &self.factory;
        self.update("add account", Precondition::WalletLoaded, |wallet| {
            let wallet = wallet.ok_or(WalletError::NoWallet)?;
            let seed = wallet.primary_seed_keyring().ok_or_else(|| {
                WalletError::unsupported("wallet has no seed keyring to derive accounts from")
            })?;

            let account = factory.create_account(wallet, seed)?;
            let mut clone = wallet.clone();
            clone.add_account(account.clone())?;
            select_current(clone, account.id)
        })
        .await
    }

    /// Add a keyring with its account and make that account current
    pub async fn import_keyring(
        &self,
        keyring: Keyring,
        ledger: Option<LedgerKey>,
    ) -> Result<Account, WalletError> {
        let factory = &self.factory;
        self.update("import keyring", Precondition::WalletLoaded, |wallet| {
            let wallet = wallet.ok_or(WalletError::NoWallet)?;
            let account = match (&keyring, ledger.as_ref()) {
                (Keyring::Ledger(_), Some(ledger)) => {
                    factory.import_ledger_account(wallet, &keyring, ledger)?
                }
                _ => factory.import_account(wallet, &keyring)?,
            };

            let mut clone = wallet.clone();
            clone.add_keyring(keyring)?;
            clone.add_account(account.clone())?;
            select_current(clone, account.id)
        })
        .await
    }

    pub async fn switch_account(&self, id: Uuid) -> Result<Account, WalletError> {
        self.update("switch account", Precondition::WalletLoaded, |wallet| {
            let wallet = wallet.ok_or(WalletError::NoWallet)?;
            select_current(wallet.clone(), id)
        })
        .await
    }

    pub async fn rename_account(&self, id: Uuid, name: &str) -> Result<Account, WalletError> {
        self.update("rename account", Precondition::WalletLoaded, |wallet| {
            let mut clone = wallet.ok_or(WalletError::NoWallet)?.clone();
            clone.rename_account(&id, name)?;
            let renamed = clone
                .account(&id)
                .cloned()
                .ok_or_else(|| WalletError::AccountNotFound(id.to_string()))?;
            Ok((clone, renamed))
        })
        .await
    }

    /// Remove an account; its keyring goes with it when no other account uses it
    pub async fn remove_account(&self, id: Uuid) -> Result<Account, WalletError> {
        self.update("remove account", Precondition::WalletLoaded, |wallet| {
            let mut clone = wallet.ok_or(WalletError::NoWallet)?.clone();
            let removed = clone.remove_account(&id)?;
            Ok((clone, removed))
        })
        .await
    }

    /// Remove a keyring together with every account derived from it
    pub async fn remove_keyring(&self, id: Uuid) -> Result<Vec<Account>, WalletError> {
        self.update("remove keyring", Precondition::WalletLoaded, |wallet| {
            let mut clone = wallet.ok_or(WalletError::NoWallet)?.clone();
            let removed = clone.remove_keyring(&id)?;
            Ok((clone, removed))
        })
        .await
    }

    // ============================================================================
    // Signing
    // ============================================================================

    /// Sign `payload` with an account of the canonical wallet.
    ///
    /// Device signing may wait on the user; dropping the returned future
    /// abandons the request without touching the wallet.
    pub async fn sign(
        &self,
        account_id: Uuid,
        payload: Vec<u8>,
    ) -> Result<SignedPayload, WalletError> {
        let wallet = self.wallet().ok_or(WalletError::NoWallet)?;
        let account = wallet
            .account(&account_id)
            .cloned()
            .ok_or_else(|| WalletError::AccountNotFound(account_id.to_string()))?;
        let keyring = wallet
            .keyring_of(&account)
            .cloned()
            .ok_or_else(|| WalletError::KeyringNotFound(account.keyring_id.to_string()))?;

        let signer = self.signer.clone();
        let chain_id = self.config.chain_id.clone();
        tokio::task::spawn_blocking(move || signer.sign(&keyring, &account, &payload, &chain_id))
            .await
            .map_err(|e| WalletError::Internal(format!("Signing task failed: {}", e)))?
    }

    // ============================================================================
    // Internals
    // ============================================================================

    fn enter(&self, action: &str) -> Result<OwnedMutexGuard<()>, WalletError> {
        Arc::clone(&self.update_lock).try_lock_owned().map_err(|_| {
            log::warn!("Rejected {}: another update is in progress", action);
            WalletError::UpdateInProgress
        })
    }

    async fn update<T, F>(
        &self,
        action: &'static str,
        precondition: Precondition,
        mutate: F,
    ) -> Result<T, WalletError>
    where
        F: FnOnce(Option<&Wallet>) -> Result<(Wallet, T), WalletError>,
        T: Send + 'static,
    {
        let serialized = self.enter(action)?;

        let current = self.wallet();
        match (precondition, &current) {
            (Precondition::WalletLoaded, None) => return Err(WalletError::NoWallet),
            (Precondition::NoWallet, Some(_)) => return Err(WalletError::WalletExists),
            _ => {}
        }

        let progress = Progress::begin(Arc::clone(&self.state));
        log::debug!("{}: loading", action);

        let staged = mutate(current.as_deref()).and_then(|(next, value)| {
            next.validate()?;
            Ok((next, value))
        });
        let (next, value) = match staged {
            Ok(staged) => staged,
            Err(e) => {
                log::error!("{} failed, previous wallet kept: {}", action, e);
                return Err(e);
            }
        };

        // The commit owns the update lock and runs to completion even if
        // the caller stops waiting.
        let store = Arc::clone(&self.store);
        let canonical = Arc::clone(&self.canonical);
        let commit = tokio::spawn(async move {
            let snapshot = next.clone();
            let saved = tokio::task::spawn_blocking(move || store.save(&snapshot))
                .await
                .map_err(|e| StorageError::Task(e.to_string()))
                .and_then(|saved| saved);

            let result = match saved {
                Ok(()) => {
                    publish(&canonical, next);
                    progress.finish();
                    log::info!("{}: committed", action);
                    Ok(value)
                }
                Err(e) => {
                    drop(progress);
                    log::error!("{} failed, previous wallet kept: {}", action, e);
                    Err(WalletError::from(e))
                }
            };
            drop(serialized);
            result
        });

        commit
            .await
            .map_err(|e| WalletError::Internal(format!("{} task failed: {}", action, e)))?
    }
}

fn publish(canonical: &RwLock<Option<Arc<Wallet>>>, wallet: Wallet) -> Arc<Wallet> {
    let wallet = Arc::new(wallet);
    *canonical.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&wallet));
    wallet
}

/// Resolve the account inside the clone by id and point `current` at it
fn select_current(mut clone: Wallet, id: Uuid) -> Result<(Wallet, Account), WalletError> {
    let stored = clone
        .account(&id)
        .cloned()
        .ok_or_else(|| WalletError::AccountNotFound(id.to_string()))?;
    clone.set_current_account(&stored.id)?;
    Ok((clone, stored))
}
