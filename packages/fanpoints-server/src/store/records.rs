//! Persistent record shapes.

use chrono::{DateTime, Utc};
use fanpoints_types::{
    CampaignId, CampaignStatus, FingerprintHashes, FraudRules, LedgerEntryId, LedgerEntryType,
    SessionId, SessionStatus, TrackId, UserId,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Everything owned by one user: wallet, its ledger, and the indexes the
/// validator aggregates over. Guarded by a single lock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub user_id: UserId,
    /// Created lazily by the first wallet read or settlement.
    pub wallet: Option<Wallet>,
    /// Append-only, oldest first.
    pub ledger: Vec<LedgerEntry>,
    /// Start times of recent sessions, oldest first. Entries older than the
    /// hourly window are pruned on insert.
    pub session_starts: Vec<DateTime<Utc>>,
    /// Track → the session that earned the one lifetime reward for it.
    pub rewarded_tracks: HashMap<TrackId, SessionId>,
}

impl Account {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            wallet: None,
            ledger: Vec::new(),
            session_starts: Vec::new(),
            rewarded_tracks: HashMap::new(),
        }
    }

    pub fn balance(&self) -> u64 {
        self.wallet.as_ref().map(|w| w.balance).unwrap_or(0)
    }

    pub fn ensure_wallet(&mut self, now: DateTime<Utc>) -> &mut Wallet {
        self.wallet.get_or_insert_with(|| Wallet {
            balance: 0,
            created_at: now,
        })
    }

    /// Sum of `entry_type` amounts created at or after `since`.
    pub fn earned_since(&self, since: DateTime<Utc>, entry_type: LedgerEntryType) -> u64 {
        self.ledger
            .iter()
            .filter(|e| e.entry_type == entry_type && e.created_at >= since)
            .fold(0u64, |acc, e| acc.saturating_add(e.amount))
    }

    pub fn sessions_started_since(&self, since: DateTime<Utc>) -> usize {
        self.session_starts.iter().filter(|t| **t >= since).count()
    }

    pub fn has_reward_for(&self, track_id: &TrackId) -> bool {
        self.rewarded_tracks.contains_key(track_id)
    }

    pub(crate) fn record_session_start(&mut self, at: DateTime<Utc>, keep_since: DateTime<Utc>) {
        self.session_starts.retain(|t| *t >= keep_since);
        self.session_starts.push(at);
    }

    /// `balance == Σ ledger` must hold for every account.
    pub fn ledger_total(&self) -> Option<u64> {
        self.ledger
            .iter()
            .try_fold(0u64, |acc, e| acc.checked_add(e.amount))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub balance: u64,
    pub created_at: DateTime<Utc>,
}

/// Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub id: LedgerEntryId,
    pub amount: u64,
    #[serde(rename = "type")]
    pub entry_type: LedgerEntryType,
    pub reference_id: Option<SessionId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListeningSession {
    pub id: SessionId,
    pub user_id: UserId,
    pub track_id: TrackId,
    pub status: SessionStatus,
    /// Only ever increases.
    pub progress_sec: u32,
    /// Only ever increases, 0..=100.
    pub completion_pct: u8,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub last_heartbeat_at: Option<DateTime<Utc>>,
    /// Set exactly once, by settlement. Presence means "already paid".
    pub rewarded_ledger_id: Option<LedgerEntryId>,
    #[serde(flatten)]
    pub fingerprint: FingerprintHashes,
}

impl ListeningSession {
    pub fn start(
        user_id: UserId,
        track_id: TrackId,
        fingerprint: FingerprintHashes,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: SessionId::generate(),
            user_id,
            track_id,
            status: SessionStatus::Started,
            progress_sec: 0,
            completion_pct: 0,
            started_at: now,
            completed_at: None,
            last_heartbeat_at: None,
            rewarded_ledger_id: None,
            fingerprint,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.rewarded_ledger_id.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: CampaignId,
    pub creator_id: UserId,
    pub name: String,
    pub status: CampaignStatus,
    pub budget_points: u64,
    /// Only increases, only through settlement, never above `budget_points`.
    pub spent_points: u64,
    pub cost_per_listen: u64,
    pub min_listen_seconds: u32,
    pub created_at: DateTime<Utc>,
}

impl Campaign {
    pub fn remaining_points(&self) -> u64 {
        self.budget_points.saturating_sub(self.spent_points)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: TrackId,
    pub campaign_id: CampaignId,
    pub title: String,
    pub artist_name: String,
    pub cover_url: Option<String>,
    pub duration_sec: u32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Versioned fraud-rule singleton.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RulesRecord {
    #[serde(flatten)]
    pub rules: FraudRules,
    pub version: u64,
    pub updated_at: DateTime<Utc>,
}

impl RulesRecord {
    pub fn initial(rules: FraudRules, now: DateTime<Utc>) -> Self {
        Self {
            rules,
            version: 1,
            updated_at: now,
        }
    }
}
