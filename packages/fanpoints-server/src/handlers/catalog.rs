//! Track listing and creator campaign endpoints.

use super::ApiJson;
use crate::catalog::{NewCampaign, NewTrack};
use crate::principal::Principal;
use crate::response::{CampaignResponse, CampaignsResponse, TrackResponse, TracksResponse};
use crate::state::AppState;
use crate::Error;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use fanpoints_types::TrackId;
use std::sync::Arc;

/// Public: rewardable tracks.
pub async fn list_tracks(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(TracksResponse {
        tracks: state.catalog.list_active_tracks(),
    })
}

/// Public: one track with its campaign's listen terms.
pub async fn track_detail(
    State(state): State<Arc<AppState>>,
    Path(track_id): Path<String>,
) -> Result<impl IntoResponse, Error> {
    let track = state.catalog.track_detail(&TrackId::from(track_id))?;
    Ok(Json(TrackResponse { track }))
}

pub async fn create_track(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    ApiJson(body): ApiJson<NewTrack>,
) -> Result<impl IntoResponse, Error> {
    let track = state.catalog.create_track(&principal, body)?;
    Ok(Json(TrackResponse { track }))
}

pub async fn list_campaigns(
    State(state): State<Arc<AppState>>,
    principal: Principal,
) -> Result<impl IntoResponse, Error> {
    let campaigns = state.catalog.list_campaigns(&principal)?;
    Ok(Json(CampaignsResponse { campaigns }))
}

pub async fn create_campaign(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    ApiJson(body): ApiJson<NewCampaign>,
) -> Result<impl IntoResponse, Error> {
    let campaign = state.catalog.create_campaign(&principal, body)?;
    Ok(Json(CampaignResponse { campaign }))
}
