//! Wallet Ledger reads, plus the administrative bonus credit.

use crate::clock::Clock;
use crate::principal::Principal;
use crate::store::{lock, LedgerEntry, Store};
use crate::Error;
use chrono::{DateTime, Utc};
use fanpoints_types::{LedgerEntryId, LedgerEntryType, UserId};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletView {
    pub balance: u64,
    /// Newest first.
    pub ledger: Vec<LedgerEntry>,
}

pub struct WalletLedger {
    store: Arc<Store>,
    clock: Arc<dyn Clock>,
    page: usize,
}

impl WalletLedger {
    pub fn new(store: Arc<Store>, clock: Arc<dyn Clock>, page: usize) -> Self {
        Self { store, clock, page }
    }

    /// The caller's balance and most recent entries. Creates the wallet on
    /// first read.
    pub fn wallet(&self, principal: &Principal) -> WalletView {
        let _gate = self.store.enter();
        let cell = self.store.account(&principal.user_id);
        let mut account = lock(&cell);
        account.ensure_wallet(self.clock.now());
        WalletView {
            balance: account.balance(),
            ledger: account.ledger.iter().rev().take(self.page).cloned().collect(),
        }
    }

    /// Sum of `entry_type` credits at or after `since`; 0 for unknown users.
    pub fn earned_since(
        &self,
        user_id: &UserId,
        since: DateTime<Utc>,
        entry_type: LedgerEntryType,
    ) -> u64 {
        self.store
            .find_account(user_id)
            .map(|cell| lock(&cell).earned_since(since, entry_type))
            .unwrap_or(0)
    }

    /// Credit `amount` BONUS points to `user_id`. Bonuses count toward the
    /// balance but not toward the daily reward cap.
    pub fn grant_bonus(
        &self,
        principal: &Principal,
        user_id: &UserId,
        amount: u64,
    ) -> Result<LedgerEntry, Error> {
        principal.require_admin()?;
        if amount == 0 {
            return Err(Error::BadInput("amount must be positive".into()));
        }

        let _gate = self.store.enter();
        let cell = self.store.account(user_id);
        let mut account = lock(&cell);
        let now = self.clock.now();
        let balance = account
            .balance()
            .checked_add(amount)
            .ok_or_else(|| Error::BadInput(format!("balance overflow for {user_id}")))?;
        let entry = LedgerEntry {
            id: LedgerEntryId::generate(),
            amount,
            entry_type: LedgerEntryType::Bonus,
            reference_id: None,
            created_at: now,
        };
        account.ensure_wallet(now).balance = balance;
        account.ledger.push(entry.clone());

        info!(admin = %principal.user_id, user_id = %user_id, amount, "Bonus granted");
        Ok(entry)
    }
}
