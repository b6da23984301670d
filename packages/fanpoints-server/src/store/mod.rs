//! In-memory transactional store.
//!
//! Every mutable entity lives behind its own `Mutex` so unrelated users and
//! sessions never contend. Multi-entity writes take locks in a fixed order:
//!
//! 1. user account (wallet + ledger + session index)
//! 2. listening session
//! 3. campaign
//!
//! Request operations hold the shared side of the commit gate; snapshots take
//! the exclusive side so they only ever observe whole transactions.

mod records;
pub mod snapshot;

pub use records::{
    Account, Campaign, LedgerEntry, ListeningSession, RulesRecord, Track, Wallet,
};

use fanpoints_types::{CampaignId, SessionId, TrackId, UserId};
use snapshot::StoreSnapshot;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

type Table<K, V> = RwLock<HashMap<K, Arc<Mutex<V>>>>;

/// Lock an entity, recovering from poisoning. Writers compute every new value
/// before touching the guarded record, so a poisoned lock never hides a
/// half-applied transaction.
pub(crate) fn lock<T>(cell: &Mutex<T>) -> MutexGuard<'_, T> {
    cell.lock().unwrap_or_else(|e| e.into_inner())
}

fn read<T>(table: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    table.read().unwrap_or_else(|e| e.into_inner())
}

fn write<T>(table: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    table.write().unwrap_or_else(|e| e.into_inner())
}

#[derive(Default)]
pub struct Store {
    gate: RwLock<()>,
    accounts: Table<UserId, Account>,
    sessions: Table<SessionId, ListeningSession>,
    campaigns: Table<CampaignId, Campaign>,
    tracks: Table<TrackId, Track>,
    rules: RwLock<Option<RulesRecord>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Commit gate ---

    /// Shared side: held for the duration of a request-scoped write.
    pub(crate) fn enter(&self) -> RwLockReadGuard<'_, ()> {
        read(&self.gate)
    }

    // --- Accounts ---

    /// The user's account, created empty on first access.
    pub fn account(&self, user_id: &UserId) -> Arc<Mutex<Account>> {
        if let Some(cell) = read(&self.accounts).get(user_id) {
            return Arc::clone(cell);
        }
        let mut accounts = write(&self.accounts);
        Arc::clone(
            accounts
                .entry(user_id.clone())
                .or_insert_with(|| Arc::new(Mutex::new(Account::new(user_id.clone())))),
        )
    }

    /// The user's account if it was ever touched.
    pub fn find_account(&self, user_id: &UserId) -> Option<Arc<Mutex<Account>>> {
        read(&self.accounts).get(user_id).cloned()
    }

    // --- Sessions ---

    pub fn session(&self, id: &SessionId) -> Option<Arc<Mutex<ListeningSession>>> {
        read(&self.sessions).get(id).cloned()
    }

    pub(crate) fn insert_session(&self, session: ListeningSession) {
        write(&self.sessions).insert(session.id.clone(), Arc::new(Mutex::new(session)));
    }

    // --- Catalog ---

    pub fn campaign(&self, id: &CampaignId) -> Option<Arc<Mutex<Campaign>>> {
        read(&self.campaigns).get(id).cloned()
    }

    pub(crate) fn insert_campaign(&self, campaign: Campaign) {
        write(&self.campaigns).insert(campaign.id.clone(), Arc::new(Mutex::new(campaign)));
    }

    /// Point-in-time copies of every campaign.
    pub fn campaigns(&self) -> Vec<Campaign> {
        read(&self.campaigns)
            .values()
            .map(|cell| lock(cell).clone())
            .collect()
    }

    pub fn track(&self, id: &TrackId) -> Option<Arc<Mutex<Track>>> {
        read(&self.tracks).get(id).cloned()
    }

    pub(crate) fn insert_track(&self, track: Track) {
        write(&self.tracks).insert(track.id.clone(), Arc::new(Mutex::new(track)));
    }

    /// Point-in-time copies of every track.
    pub fn tracks(&self) -> Vec<Track> {
        read(&self.tracks)
            .values()
            .map(|cell| lock(cell).clone())
            .collect()
    }

    // --- Fraud rules singleton ---

    pub(crate) fn rules(&self) -> Option<RulesRecord> {
        read(&self.rules).clone()
    }

    /// Return the singleton, inserting `init()` if it does not exist yet.
    pub(crate) fn rules_or_init(&self, init: impl FnOnce() -> RulesRecord) -> RulesRecord {
        let mut rules = write(&self.rules);
        rules.get_or_insert_with(init).clone()
    }

    /// Replace the singleton with `f(current)` under the write lock.
    pub(crate) fn update_rules(
        &self,
        f: impl FnOnce(Option<&RulesRecord>) -> RulesRecord,
    ) -> RulesRecord {
        let mut rules = write(&self.rules);
        let next = f(rules.as_ref());
        *rules = Some(next.clone());
        next
    }

    // --- Snapshots ---

    /// Consistent copy of the whole store. Blocks new writes while copying.
    pub fn snapshot(&self) -> StoreSnapshot {
        let _exclusive = write(&self.gate);
        let mut snapshot = StoreSnapshot {
            accounts: read(&self.accounts).values().map(|c| lock(c).clone()).collect(),
            sessions: read(&self.sessions).values().map(|c| lock(c).clone()).collect(),
            campaigns: read(&self.campaigns).values().map(|c| lock(c).clone()).collect(),
            tracks: read(&self.tracks).values().map(|c| lock(c).clone()).collect(),
            rules: read(&self.rules).clone(),
            ..StoreSnapshot::default()
        };
        snapshot.sort();
        snapshot
    }

    /// Rebuild a store from a snapshot after checking its invariants.
    pub fn restore(snapshot: StoreSnapshot) -> Result<Self, crate::Error> {
        snapshot.check()?;
        let store = Store::new();
        {
            let mut accounts = write(&store.accounts);
            for account in snapshot.accounts {
                accounts.insert(account.user_id.clone(), Arc::new(Mutex::new(account)));
            }
        }
        for session in snapshot.sessions {
            store.insert_session(session);
        }
        for campaign in snapshot.campaigns {
            store.insert_campaign(campaign);
        }
        for track in snapshot.tracks {
            store.insert_track(track);
        }
        *write(&store.rules) = snapshot.rules;
        Ok(store)
    }
}
