//! Application state shared across handlers.

use crate::catalog::Catalog;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::fraud_rules::FraudRuleStore;
use crate::rewards::RewardEngine;
use crate::sessions::SessionTracker;
use crate::settlement::SettlementEngine;
use crate::store::snapshot::SnapshotFile;
use crate::store::Store;
use crate::validator::RewardValidator;
use crate::wallet::WalletLedger;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<Store>,
    pub clock: Arc<dyn Clock>,
    pub rules: Arc<FraudRuleStore>,
    pub sessions: SessionTracker,
    pub rewards: RewardEngine,
    pub wallets: WalletLedger,
    pub catalog: Catalog,
    pub snapshots: Option<SnapshotFile>,
    pub start_time: Instant,
    pub request_count: AtomicU64,
}

impl AppState {
    /// Create application state from configuration, restoring the snapshot
    /// if one is configured and present.
    pub fn new(config: Config) -> Result<Self, crate::Error> {
        let snapshots = config.snapshot_path.clone().map(SnapshotFile::new);
        let restored = match &snapshots {
            Some(file) => file.load()?,
            None => None,
        };
        let store = match restored {
            Some(snapshot) => {
                let store = Store::restore(snapshot)?;
                info!("Store restored from snapshot");
                store
            }
            None => Store::new(),
        };
        Ok(Self::assemble(config, store, Arc::new(SystemClock), snapshots))
    }

    /// In-memory state on an injected clock. No snapshot file.
    pub fn with_clock(config: Config, clock: Arc<dyn Clock>) -> Self {
        Self::assemble(config, Store::new(), clock, None)
    }

    fn assemble(
        config: Config,
        store: Store,
        clock: Arc<dyn Clock>,
        snapshots: Option<SnapshotFile>,
    ) -> Self {
        let store = Arc::new(store);
        let rules = Arc::new(FraudRuleStore::new(
            store.clone(),
            config.fraud_rules(),
            clock.clone(),
        ));
        let sessions = SessionTracker::new(store.clone(), rules.clone(), clock.clone());
        let rewards = RewardEngine::new(
            RewardValidator::new(store.clone(), rules.clone(), clock.clone()),
            SettlementEngine::new(store.clone(), clock.clone()),
            config.max_settle_attempts,
        );
        let wallets = WalletLedger::new(store.clone(), clock.clone(), config.wallet_ledger_page);
        let catalog = Catalog::new(store.clone(), clock.clone());

        Self {
            config,
            store,
            clock,
            rules,
            sessions,
            rewards,
            wallets,
            catalog,
            snapshots,
            start_time: Instant::now(),
            request_count: AtomicU64::new(0),
        }
    }

    /// Write a consistent snapshot. `Ok(false)` when persistence is disabled.
    pub fn save_snapshot(&self) -> Result<bool, crate::Error> {
        match &self.snapshots {
            Some(file) => {
                file.save(&self.store.snapshot())?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
