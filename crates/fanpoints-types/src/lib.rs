//! Shared types and pure-logic utilities for the Fanpoints reward service.
//! No I/O and no clock access; callers pass `now` in explicitly.

mod error;
mod fingerprint;
mod ids;
mod model;
mod qualify;
mod reason;
mod rules;
mod window;

pub use error::ParseError;
pub use fingerprint::{hash_fingerprint_part, ClientFingerprint, FingerprintHashes};
pub use ids::{CampaignId, LedgerEntryId, SessionId, TrackId, UserId};
pub use model::{CampaignStatus, LedgerEntryType, Role, SessionStatus};
pub use qualify::{
    qualifies, required_listen_seconds, COMPLETION_PCT_THRESHOLD, MIN_LISTEN_FLOOR_SECS,
};
pub use reason::RejectReason;
pub use rules::{FraudRules, FraudRulesPatch};
pub use window::{
    exceeds_daily_cap, exceeds_hourly_cap, has_budget_for, hour_window_start, utc_day_start,
};
