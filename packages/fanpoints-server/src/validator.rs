//! Reward Validator.
//!
//! A read-only decision over a single session. Each record is copied out
//! under its own brief lock, so validation never holds two locks at once and
//! never blocks settlement for longer than a clone. The result is advisory:
//! settlement re-checks everything that can move under it.
//!
//! Checks run in a fixed order and the first failure wins:
//!
//! | Reason | Condition |
//! |---|---|
//! | `SESSION_NOT_FOUND` | no such session |
//! | `NOT_OWNER` | session belongs to someone else |
//! | `TRACK_MISMATCH` | session was for a different track |
//! | `ALREADY_REWARDED` | session already carries a settlement reference |
//! | `TRACK_INACTIVE` | track switched off |
//! | `CAMPAIGN_NOT_ACTIVE` | campaign paused or ended |
//! | `NOT_QUALIFIED` | listen too short |
//! | `HOURLY_SESSION_CAP` | more than `maxSessionsPerHour` starts in the last hour |
//! | `DUPLICATE_REWARD` | user was already paid for this track |
//! | `DAILY_CAP` | today's REWARD total plus this reward exceeds the cap |
//! | `CAMPAIGN_BUDGET` | remaining budget below the cost per listen |

use crate::clock::Clock;
use crate::fraud_rules::FraudRuleStore;
use crate::principal::Principal;
use crate::store::{lock, Campaign, ListeningSession, Store, Track};
use crate::Error;
use fanpoints_types::{
    exceeds_daily_cap, exceeds_hourly_cap, has_budget_for, hour_window_start, qualifies,
    utc_day_start, CampaignStatus, FraudRules, LedgerEntryType, RejectReason, SessionId, TrackId,
};
use std::sync::Arc;
use tracing::debug;

/// Everything settlement needs, captured at validation time.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedReward {
    pub session: ListeningSession,
    pub track: Track,
    pub campaign: Campaign,
    /// Rules snapshot the decision was made under.
    pub rules: FraudRules,
}

impl ValidatedReward {
    pub fn amount(&self) -> u64 {
        self.campaign.cost_per_listen
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Accepted(Box<ValidatedReward>),
    Rejected(RejectReason),
}

impl Verdict {
    pub fn reason(&self) -> Option<RejectReason> {
        match self {
            Verdict::Accepted(_) => None,
            Verdict::Rejected(reason) => Some(*reason),
        }
    }
}

/// Per-user aggregates read from the account in one lock.
struct UserWindow {
    sessions_last_hour: usize,
    has_reward_for_track: bool,
    earned_today: u64,
}

pub struct RewardValidator {
    store: Arc<Store>,
    rules: Arc<FraudRuleStore>,
    clock: Arc<dyn Clock>,
}

impl RewardValidator {
    pub fn new(store: Arc<Store>, rules: Arc<FraudRuleStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            rules,
            clock,
        }
    }

    /// Decide whether `session_id` earns a reward for `principal`.
    ///
    /// Business rejections come back as `Ok(Verdict::Rejected)`. `Err` is
    /// reserved for a store that references records it does not contain.
    pub fn validate(
        &self,
        principal: &Principal,
        track_id: &TrackId,
        session_id: &SessionId,
    ) -> Result<Verdict, Error> {
        let rules = self.rules.current();
        let now = self.clock.now();

        let Some(cell) = self.store.session(session_id) else {
            return Ok(reject(session_id, RejectReason::SessionNotFound));
        };
        let session = lock(&cell).clone();

        if session.user_id != principal.user_id {
            return Ok(reject(session_id, RejectReason::NotOwner));
        }
        if session.track_id != *track_id {
            return Ok(reject(session_id, RejectReason::TrackMismatch));
        }
        if session.is_settled() {
            return Ok(reject(session_id, RejectReason::AlreadyRewarded));
        }

        let track = self
            .store
            .track(&session.track_id)
            .map(|cell| lock(&cell).clone())
            .ok_or_else(|| {
                Error::Storage(format!(
                    "session {} references missing track {}",
                    session.id, session.track_id
                ))
            })?;
        if !track.is_active {
            return Ok(reject(session_id, RejectReason::TrackInactive));
        }

        let campaign = self
            .store
            .campaign(&track.campaign_id)
            .map(|cell| lock(&cell).clone())
            .ok_or_else(|| {
                Error::Storage(format!(
                    "track {} references missing campaign {}",
                    track.id, track.campaign_id
                ))
            })?;
        if campaign.status != CampaignStatus::Active {
            return Ok(reject(session_id, RejectReason::CampaignNotActive));
        }

        if !qualifies(
            session.progress_sec,
            session.completion_pct,
            campaign.min_listen_seconds,
            track.duration_sec,
        ) {
            return Ok(reject(session_id, RejectReason::NotQualified));
        }

        let window = self.user_window(principal, &track.id, now);
        if exceeds_hourly_cap(window.sessions_last_hour, rules.max_sessions_per_hour) {
            return Ok(reject(session_id, RejectReason::HourlySessionCap));
        }
        if window.has_reward_for_track {
            return Ok(reject(session_id, RejectReason::DuplicateReward));
        }
        if exceeds_daily_cap(
            window.earned_today,
            campaign.cost_per_listen,
            rules.daily_reward_cap,
        ) {
            return Ok(reject(session_id, RejectReason::DailyCap));
        }
        if !has_budget_for(
            campaign.budget_points,
            campaign.spent_points,
            campaign.cost_per_listen,
        ) {
            return Ok(reject(session_id, RejectReason::CampaignBudget));
        }

        debug!(session_id = %session_id, amount = campaign.cost_per_listen, "Reward accepted");
        Ok(Verdict::Accepted(Box::new(ValidatedReward {
            session,
            track,
            campaign,
            rules,
        })))
    }

    // A user who never touched their wallet has no sessions and no earnings.
    fn user_window(
        &self,
        principal: &Principal,
        track_id: &TrackId,
        now: chrono::DateTime<chrono::Utc>,
    ) -> UserWindow {
        match self.store.find_account(&principal.user_id) {
            Some(cell) => {
                let account = lock(&cell);
                UserWindow {
                    sessions_last_hour: account.sessions_started_since(hour_window_start(now)),
                    has_reward_for_track: account.has_reward_for(track_id),
                    earned_today: account.earned_since(utc_day_start(now), LedgerEntryType::Reward),
                }
            }
            None => UserWindow {
                sessions_last_hour: 0,
                has_reward_for_track: false,
                earned_today: 0,
            },
        }
    }
}

fn reject(session_id: &SessionId, reason: RejectReason) -> Verdict {
    debug!(session_id = %session_id, %reason, "Reward rejected");
    Verdict::Rejected(reason)
}
