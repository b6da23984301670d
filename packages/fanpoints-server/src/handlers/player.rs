//! Player endpoints: start, heartbeat, complete, wallet.

use super::{non_empty, ApiJson};
use crate::principal::Principal;
use crate::response::{
    CompleteResponse, HeartbeatResponse, SessionResponse, StartResponse,
};
use crate::rewards::Completion;
use crate::state::AppState;
use crate::Error;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use fanpoints_types::{ClientFingerprint, SessionId, TrackId};
use serde::Deserialize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    #[serde(default)]
    pub track_id: Option<String>,
    #[serde(default)]
    pub device_hash: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub progress_sec: Option<f64>,
    #[serde(default)]
    pub completion_pct: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub track_id: Option<String>,
}

pub async fn start(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    headers: HeaderMap,
    ApiJson(body): ApiJson<StartRequest>,
) -> Result<Json<StartResponse>, Error> {
    state.request_count.fetch_add(1, Ordering::Relaxed);
    let track_id = non_empty(body.track_id).ok_or(Error::MissingTrack)?;

    let fingerprint = ClientFingerprint {
        ip: header_str(&headers, "x-forwarded-for")
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string()),
        user_agent: header_str(&headers, "user-agent").map(str::to_string),
        device_hint: body.device_hash,
    };

    let session = state
        .sessions
        .start(&principal, &TrackId::from(track_id), &fingerprint)?;
    Ok(Json(StartResponse {
        session_id: session.id,
    }))
}

pub async fn heartbeat(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    ApiJson(body): ApiJson<HeartbeatRequest>,
) -> Result<Json<HeartbeatResponse>, Error> {
    state.request_count.fetch_add(1, Ordering::Relaxed);
    let session_id = non_empty(body.session_id).ok_or(Error::MissingSession)?;

    let ack = state.sessions.heartbeat(
        &principal,
        &SessionId::from(session_id),
        body.progress_sec.unwrap_or(0.0),
        body.completion_pct.unwrap_or(0.0),
    )?;
    Ok(Json(HeartbeatResponse {
        ok: true,
        min_heartbeat_gap_ms: ack.min_heartbeat_gap_ms,
    }))
}

pub async fn complete(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    ApiJson(body): ApiJson<CompleteRequest>,
) -> Result<Response, Error> {
    state.request_count.fetch_add(1, Ordering::Relaxed);
    let (Some(session_id), Some(track_id)) = (non_empty(body.session_id), non_empty(body.track_id))
    else {
        return Err(Error::MissingParams);
    };

    let completion = state.rewards.complete(
        &principal,
        &TrackId::from(track_id),
        &SessionId::from(session_id),
    )?;
    Ok(match completion {
        Completion::Rewarded(reward) => Json(CompleteResponse::rewarded(reward)).into_response(),
        Completion::Rejected(reason) => (
            StatusCode::BAD_REQUEST,
            Json(CompleteResponse::rejected(reason)),
        )
            .into_response(),
    })
}

/// The caller's own session, for diagnostics.
pub async fn session(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, Error> {
    let session = state
        .sessions
        .get(&SessionId::from(session_id))
        .ok_or(Error::NotFound)?;
    if session.user_id != principal.user_id && !principal.role.is_admin() {
        return Err(Error::Forbidden);
    }
    Ok(Json(SessionResponse { session }))
}

pub async fn wallet(
    State(state): State<Arc<AppState>>,
    principal: Principal,
) -> impl IntoResponse {
    state.request_count.fetch_add(1, Ordering::Relaxed);
    Json(state.wallets.wallet(&principal))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
