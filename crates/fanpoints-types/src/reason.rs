//! Reward rejection reasons.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a completed session was not rewarded.
///
/// Variants are declared in evaluation order: the validator returns the
/// first one that applies, so a given state always maps to the same code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectReason {
    SessionNotFound,
    NotOwner,
    TrackMismatch,
    AlreadyRewarded,
    TrackInactive,
    CampaignNotActive,
    NotQualified,
    HourlySessionCap,
    DuplicateReward,
    DailyCap,
    CampaignBudget,
}

impl RejectReason {
    pub const ALL: [RejectReason; 11] = [
        RejectReason::SessionNotFound,
        RejectReason::NotOwner,
        RejectReason::TrackMismatch,
        RejectReason::AlreadyRewarded,
        RejectReason::TrackInactive,
        RejectReason::CampaignNotActive,
        RejectReason::NotQualified,
        RejectReason::HourlySessionCap,
        RejectReason::DuplicateReward,
        RejectReason::DailyCap,
        RejectReason::CampaignBudget,
    ];

    /// Stable wire code.
    pub const fn code(self) -> &'static str {
        match self {
            RejectReason::SessionNotFound => "SESSION_NOT_FOUND",
            RejectReason::NotOwner => "NOT_OWNER",
            RejectReason::TrackMismatch => "TRACK_MISMATCH",
            RejectReason::AlreadyRewarded => "ALREADY_REWARDED",
            RejectReason::TrackInactive => "TRACK_INACTIVE",
            RejectReason::CampaignNotActive => "CAMPAIGN_NOT_ACTIVE",
            RejectReason::NotQualified => "NOT_QUALIFIED",
            RejectReason::HourlySessionCap => "HOURLY_SESSION_CAP",
            RejectReason::DuplicateReward => "DUPLICATE_REWARD",
            RejectReason::DailyCap => "DAILY_CAP",
            RejectReason::CampaignBudget => "CAMPAIGN_BUDGET",
        }
    }

    /// Position in [`RejectReason::ALL`]; used to index per-reason counters.
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
