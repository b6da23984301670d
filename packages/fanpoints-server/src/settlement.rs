//! Settlement Engine: the only writer of balances, ledgers, session
//! closure and campaign spend.
//!
//! One settlement is one transaction. Locks are taken account → session →
//! campaign, the conditions validation relied on are re-checked under them,
//! and every new value is computed before the first field is written. A
//! failed re-check returns [`Error::SettlementConflict`] with nothing changed.

use crate::clock::Clock;
use crate::metrics::METRICS;
use crate::store::{lock, LedgerEntry, Store};
use crate::validator::ValidatedReward;
use crate::Error;
use fanpoints_types::{
    exceeds_daily_cap, has_budget_for, utc_day_start, CampaignStatus, LedgerEntryId,
    LedgerEntryType, RejectReason, SessionStatus,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// What the user received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    pub ledger_entry_id: LedgerEntryId,
    pub amount: u64,
}

pub struct SettlementEngine {
    store: Arc<Store>,
    clock: Arc<dyn Clock>,
}

impl SettlementEngine {
    pub fn new(store: Arc<Store>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn settle(&self, validated: &ValidatedReward) -> Result<Reward, Error> {
        let started = Instant::now();
        let session_id = &validated.session.id;
        let user_id = &validated.session.user_id;
        let amount = validated.amount();

        let _gate = self.store.enter();
        let session_cell = self
            .store
            .session(session_id)
            .ok_or_else(|| Error::Storage(format!("session {session_id} vanished")))?;
        let campaign_cell = self
            .store
            .campaign(&validated.campaign.id)
            .ok_or_else(|| {
                Error::Storage(format!("campaign {} vanished", validated.campaign.id))
            })?;
        let account_cell = self.store.account(user_id);

        let mut account = lock(&account_cell);
        let mut session = lock(&session_cell);
        let mut campaign = lock(&campaign_cell);
        let now = self.clock.now();

        let recheck = if session.is_settled() {
            Some(RejectReason::AlreadyRewarded)
        } else if account.has_reward_for(&session.track_id) {
            Some(RejectReason::DuplicateReward)
        } else if exceeds_daily_cap(
            account.earned_since(utc_day_start(now), LedgerEntryType::Reward),
            amount,
            validated.rules.daily_reward_cap,
        ) {
            Some(RejectReason::DailyCap)
        } else if campaign.status != CampaignStatus::Active {
            Some(RejectReason::CampaignNotActive)
        } else if !has_budget_for(campaign.budget_points, campaign.spent_points, amount) {
            Some(RejectReason::CampaignBudget)
        } else {
            None
        };
        if let Some(reason) = recheck {
            warn!(session_id = %session_id, user_id = %user_id, %reason, "Settlement re-check failed");
            return Err(Error::SettlementConflict(reason));
        }

        let balance = account
            .balance()
            .checked_add(amount)
            .ok_or_else(|| Error::Storage(format!("balance overflow for {user_id}")))?;
        let spent = campaign
            .spent_points
            .checked_add(amount)
            .ok_or_else(|| Error::Storage(format!("spend overflow for {}", campaign.id)))?;
        let entry = LedgerEntry {
            id: LedgerEntryId::generate(),
            amount,
            entry_type: LedgerEntryType::Reward,
            reference_id: Some(session_id.clone()),
            created_at: now,
        };
        let reward = Reward {
            ledger_entry_id: entry.id.clone(),
            amount,
        };

        // Commit. Nothing below can fail.
        account.ensure_wallet(now).balance = balance;
        account.ledger.push(entry);
        account
            .rewarded_tracks
            .insert(session.track_id.clone(), session_id.clone());
        session.status = SessionStatus::Rewarded;
        session.completed_at = Some(now);
        session.rewarded_ledger_id = Some(reward.ledger_entry_id.clone());
        campaign.spent_points = spent;

        METRICS.record_settlement(amount, started);
        info!(
            session_id = %session_id,
            user_id = %user_id,
            campaign_id = %campaign.id,
            amount,
            ledger_entry_id = %reward.ledger_entry_id,
            "Reward settled"
        );
        Ok(reward)
    }
}
