//! Response types for the reward API.

use crate::settlement::Reward;
use fanpoints_types::{RejectReason, SessionId};
use serde::Serialize;

/// Response from the health endpoint.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_secs: u64,
    pub requests: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartResponse {
    pub session_id: SessionId,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatResponse {
    pub ok: bool,
    pub min_heartbeat_gap_ms: u64,
}

/// Response from the complete endpoint. Exactly one of `reward` and `reason`
/// is present.
#[derive(Debug, Serialize)]
pub struct CompleteResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward: Option<Reward>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RejectReason>,
}

impl CompleteResponse {
    pub fn rewarded(reward: Reward) -> Self {
        Self {
            ok: true,
            reward: Some(reward),
            reason: None,
        }
    }

    pub fn rejected(reason: RejectReason) -> Self {
        Self {
            ok: false,
            reward: None,
            reason: Some(reason),
        }
    }
}

#[derive(Serialize)]
pub struct RulesResponse<T> {
    pub rules: T,
}

#[derive(Serialize)]
pub struct CampaignResponse<T> {
    pub campaign: T,
}

#[derive(Serialize)]
pub struct CampaignsResponse<T> {
    pub campaigns: Vec<T>,
}

#[derive(Serialize)]
pub struct TrackResponse<T> {
    pub track: T,
}

#[derive(Serialize)]
pub struct TracksResponse<T> {
    pub tracks: Vec<T>,
}

#[derive(Serialize)]
pub struct SessionResponse<T> {
    pub session: T,
}

#[derive(Serialize)]
pub struct EntryResponse<T> {
    pub entry: T,
}
