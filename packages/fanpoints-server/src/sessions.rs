//! Session Tracker: start, progress heartbeats, diagnostics read.

use crate::clock::Clock;
use crate::fraud_rules::FraudRuleStore;
use crate::metrics::METRICS;
use crate::principal::Principal;
use crate::store::{lock, ListeningSession, Store};
use crate::Error;
use fanpoints_types::{hour_window_start, ClientFingerprint, SessionId, SessionStatus, TrackId};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{debug, info};

/// Longest plausible reported position, in seconds.
pub const MAX_PROGRESS_SECS: u32 = 60 * 60;
pub const MAX_COMPLETION_PCT: u8 = 100;

/// Returned to the player so it can pace its own heartbeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatAck {
    pub min_heartbeat_gap_ms: u64,
}

pub struct SessionTracker {
    store: Arc<Store>,
    rules: Arc<FraudRuleStore>,
    clock: Arc<dyn Clock>,
}

impl SessionTracker {
    pub fn new(store: Arc<Store>, rules: Arc<FraudRuleStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            rules,
            clock,
        }
    }

    /// Open a new session in `STARTED`. Charges nothing and enforces no cap;
    /// the start is recorded against the caller's hourly window.
    pub fn start(
        &self,
        principal: &Principal,
        track_id: &TrackId,
        fingerprint: &ClientFingerprint,
    ) -> Result<ListeningSession, Error> {
        let _gate = self.store.enter();
        if self.store.track(track_id).is_none() {
            return Err(Error::TrackNotFound);
        }

        let now = self.clock.now();
        let session = ListeningSession::start(
            principal.user_id.clone(),
            track_id.clone(),
            fingerprint.hash(),
            now,
        );

        {
            let account = self.store.account(&principal.user_id);
            let mut account = lock(&account);
            account.record_session_start(now, hour_window_start(now));
            self.store.insert_session(session.clone());
        }

        METRICS.sessions_started.fetch_add(1, Ordering::Relaxed);
        info!(
            session_id = %session.id,
            user_id = %principal.user_id,
            track_id = %track_id,
            "Session started"
        );
        Ok(session)
    }

    /// Merge a progress report. Fractional values are floored; stored values
    /// only ever move forward.
    pub fn heartbeat(
        &self,
        principal: &Principal,
        session_id: &SessionId,
        progress_sec: f64,
        completion_pct: f64,
    ) -> Result<HeartbeatAck, Error> {
        let rules = self.rules.current();
        let ack = HeartbeatAck {
            min_heartbeat_gap_ms: rules.min_heartbeat_gap_ms,
        };

        let _gate = self.store.enter();
        let cell = self.store.session(session_id).ok_or(Error::NotFound)?;
        let mut session = lock(&cell);

        if session.user_id != principal.user_id {
            return Err(Error::Forbidden);
        }
        if session.status == SessionStatus::Rewarded {
            debug!(session_id = %session_id, "Heartbeat after reward ignored");
            return Ok(ack);
        }

        let progress = floor_in_range(progress_sec, MAX_PROGRESS_SECS).ok_or(Error::BadProgress)?;
        let pct = floor_in_range(completion_pct, u32::from(MAX_COMPLETION_PCT)).ok_or(Error::BadPct)?;

        session.progress_sec = session.progress_sec.max(progress);
        session.completion_pct = session.completion_pct.max(pct as u8);
        session.status = SessionStatus::InProgress;
        session.last_heartbeat_at = Some(self.clock.now());

        METRICS.heartbeats.fetch_add(1, Ordering::Relaxed);
        debug!(
            session_id = %session_id,
            progress_sec = session.progress_sec,
            completion_pct = session.completion_pct,
            "Heartbeat"
        );
        Ok(ack)
    }

    pub fn get(&self, session_id: &SessionId) -> Option<ListeningSession> {
        self.store.session(session_id).map(|cell| lock(&cell).clone())
    }
}

/// `floor(value)` if finite and within `0..=max`.
fn floor_in_range(value: f64, max: u32) -> Option<u32> {
    if !value.is_finite() {
        return None;
    }
    let floored = value.floor();
    if floored < 0.0 || floored > f64::from(max) {
        return None;
    }
    Some(floored as u32)
}
