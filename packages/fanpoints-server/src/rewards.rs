//! Completion flow: validate, then settle, retrying when settlement loses a
//! race against a concurrent transaction.

use crate::metrics::METRICS;
use crate::principal::Principal;
use crate::settlement::{Reward, SettlementEngine};
use crate::validator::{RewardValidator, Verdict};
use crate::Error;
use fanpoints_types::{RejectReason, SessionId, TrackId};
use std::sync::atomic::Ordering;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Rewarded(Reward),
    Rejected(RejectReason),
}

pub struct RewardEngine {
    validator: RewardValidator,
    settlement: SettlementEngine,
    max_attempts: u32,
}

impl RewardEngine {
    pub fn new(validator: RewardValidator, settlement: SettlementEngine, max_attempts: u32) -> Self {
        Self {
            validator,
            settlement,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn validator(&self) -> &RewardValidator {
        &self.validator
    }

    /// Reward `session_id` at most once.
    ///
    /// A settlement conflict means another transaction committed between
    /// validation and settlement; the next attempt re-validates from scratch so
    /// the caller sees the same reason a fresh request would. Only when every
    /// attempt conflicts does the conflict itself surface.
    pub fn complete(
        &self,
        principal: &Principal,
        track_id: &TrackId,
        session_id: &SessionId,
    ) -> Result<Completion, Error> {
        METRICS.completions.fetch_add(1, Ordering::Relaxed);

        let mut last_conflict = RejectReason::AlreadyRewarded;
        for attempt in 1..=self.max_attempts {
            let validated = match self.validator.validate(principal, track_id, session_id)? {
                Verdict::Accepted(validated) => validated,
                Verdict::Rejected(reason) => {
                    METRICS.record_rejection(reason);
                    info!(
                        session_id = %session_id,
                        user_id = %principal.user_id,
                        %reason,
                        "Completion rejected"
                    );
                    return Ok(Completion::Rejected(reason));
                }
            };

            match self.settlement.settle(&validated) {
                Ok(reward) => return Ok(Completion::Rewarded(reward)),
                Err(Error::SettlementConflict(reason)) => {
                    METRICS.settlement_conflicts.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        session_id = %session_id,
                        attempt,
                        %reason,
                        "Settlement conflict, revalidating"
                    );
                    last_conflict = reason;
                }
                Err(e) => return Err(e),
            }
        }

        warn!(
            session_id = %session_id,
            attempts = self.max_attempts,
            reason = %last_conflict,
            "Settlement retries exhausted"
        );
        Err(Error::SettlementConflict(last_conflict))
    }
}
