//! Administrator endpoints.

use super::ApiJson;
use crate::principal::Principal;
use crate::response::{CampaignResponse, EntryResponse, RulesResponse, TrackResponse};
use crate::state::AppState;
use crate::Error;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use fanpoints_types::{CampaignId, FraudRulesPatch, TrackId, UserId};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct CampaignPatch {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackPatch {
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BonusRequest {
    pub user_id: String,
    pub amount: u64,
}

pub async fn get_fraud_rules(
    State(state): State<Arc<AppState>>,
    principal: Principal,
) -> Result<impl IntoResponse, Error> {
    principal.require_admin()?;
    Ok(Json(RulesResponse {
        rules: state.rules.record(),
    }))
}

pub async fn patch_fraud_rules(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    ApiJson(patch): ApiJson<FraudRulesPatch>,
) -> Result<impl IntoResponse, Error> {
    let rules = state.rules.update(&principal, patch)?;
    Ok(Json(RulesResponse { rules }))
}

pub async fn patch_campaign(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(campaign_id): Path<String>,
    ApiJson(body): ApiJson<CampaignPatch>,
) -> Result<impl IntoResponse, Error> {
    let campaign = state.catalog.set_campaign_status(
        &principal,
        &CampaignId::from(campaign_id),
        body.status.as_deref(),
    )?;
    Ok(Json(CampaignResponse { campaign }))
}

pub async fn patch_track(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(track_id): Path<String>,
    ApiJson(body): ApiJson<TrackPatch>,
) -> Result<impl IntoResponse, Error> {
    let track =
        state
            .catalog
            .set_track_active(&principal, &TrackId::from(track_id), body.is_active)?;
    Ok(Json(TrackResponse { track }))
}

pub async fn overview(
    State(state): State<Arc<AppState>>,
    principal: Principal,
) -> Result<impl IntoResponse, Error> {
    Ok(Json(state.catalog.overview(&principal)?))
}

pub async fn grant_bonus(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    ApiJson(body): ApiJson<BonusRequest>,
) -> Result<impl IntoResponse, Error> {
    let entry = state
        .wallets
        .grant_bonus(&principal, &UserId::from(body.user_id), body.amount)?;
    Ok(Json(EntryResponse { entry }))
}
