//! Campaigns and tracks: creator CRUD, public listing, admin toggles.
//!
//! The reward core only reads these records. Campaign spend is never written
//! here.

use crate::clock::Clock;
use crate::principal::Principal;
use crate::store::{lock, Campaign, Store, Track};
use crate::Error;
use fanpoints_types::{CampaignId, CampaignStatus, TrackId};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::sync::Arc;
use tracing::info;

pub const ACTIVE_TRACKS_LIMIT: usize = 50;
pub const DEFAULT_COST_PER_LISTEN: u64 = 1;
pub const DEFAULT_MIN_LISTEN_SECONDS: u32 = 30;

// --- Inputs ---

/// Body of a campaign creation request. Numbers are signed so that negative
/// input is reported as `BAD_INPUT` rather than a parse failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCampaign {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub budget_points: Option<i64>,
    #[serde(default)]
    pub cost_per_listen: Option<i64>,
    #[serde(default)]
    pub min_listen_seconds: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTrack {
    #[serde(default)]
    pub campaign_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub artist_name: Option<String>,
    #[serde(default)]
    pub duration_sec: Option<i64>,
    #[serde(default)]
    pub cover_url: Option<String>,
}

// --- Views ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackSummary {
    pub id: TrackId,
    pub title: String,
    pub is_active: bool,
}

impl From<&Track> for TrackSummary {
    fn from(track: &Track) -> Self {
        Self {
            id: track.id.clone(),
            title: track.title.clone(),
            is_active: track.is_active,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignWithTracks {
    #[serde(flatten)]
    pub campaign: Campaign,
    pub tracks: Vec<TrackSummary>,
}

/// Public listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackListing {
    pub id: TrackId,
    pub title: String,
    pub artist_name: String,
    pub cover_url: Option<String>,
    pub duration_sec: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignTerms {
    pub min_listen_seconds: u32,
    pub cost_per_listen: u64,
}

/// Player-facing track detail, with what a qualifying listen earns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackDetail {
    #[serde(flatten)]
    pub track: TrackListing,
    pub campaign: CampaignTerms,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignState {
    pub id: CampaignId,
    pub name: String,
    pub status: CampaignStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewCampaign {
    pub id: CampaignId,
    pub name: String,
    pub status: CampaignStatus,
    pub budget_points: u64,
    pub spent_points: u64,
    pub tracks: Vec<TrackSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewTrack {
    pub id: TrackId,
    pub title: String,
    pub artist_name: String,
    pub is_active: bool,
    pub campaign_id: CampaignId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub campaigns: Vec<OverviewCampaign>,
    pub tracks: Vec<OverviewTrack>,
}

// --- Service ---

pub struct Catalog {
    store: Arc<Store>,
    clock: Arc<dyn Clock>,
}

impl Catalog {
    pub fn new(store: Arc<Store>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn create_campaign(&self, principal: &Principal, input: NewCampaign) -> Result<Campaign, Error> {
        principal.require_campaign_manager()?;

        let name = required_text(input.name, "name")?;
        let budget_points = positive(input.budget_points, "budgetPoints")?;
        let cost_per_listen = match input.cost_per_listen {
            None => DEFAULT_COST_PER_LISTEN,
            some => positive(some, "costPerListen")?,
        };
        let min_listen_seconds = match input.min_listen_seconds {
            None => DEFAULT_MIN_LISTEN_SECONDS,
            Some(secs) => u32::try_from(secs)
                .map_err(|_| Error::BadInput("minListenSeconds out of range".into()))?,
        };

        let campaign = Campaign {
            id: CampaignId::generate(),
            creator_id: principal.user_id.clone(),
            name,
            status: CampaignStatus::Active,
            budget_points,
            spent_points: 0,
            cost_per_listen,
            min_listen_seconds,
            created_at: self.clock.now(),
        };

        let _gate = self.store.enter();
        self.store.insert_campaign(campaign.clone());
        info!(
            campaign_id = %campaign.id,
            creator_id = %campaign.creator_id,
            budget_points,
            cost_per_listen,
            "Campaign created"
        );
        Ok(campaign)
    }

    /// The caller's own campaigns, newest first.
    pub fn list_campaigns(&self, principal: &Principal) -> Result<Vec<CampaignWithTracks>, Error> {
        principal.require_campaign_manager()?;

        let tracks = self.store.tracks();
        let mut campaigns: Vec<Campaign> = self
            .store
            .campaigns()
            .into_iter()
            .filter(|c| c.creator_id == principal.user_id)
            .collect();
        campaigns.sort_by_key(|c| Reverse(c.created_at));

        Ok(campaigns
            .into_iter()
            .map(|campaign| CampaignWithTracks {
                tracks: summaries_for(&tracks, &campaign.id),
                campaign,
            })
            .collect())
    }

    pub fn create_track(&self, principal: &Principal, input: NewTrack) -> Result<Track, Error> {
        principal.require_campaign_manager()?;

        let campaign_id = CampaignId::from(required_text(input.campaign_id, "campaignId")?);
        let title = required_text(input.title, "title")?;
        let artist_name = required_text(input.artist_name, "artistName")?;
        let duration_sec = positive(input.duration_sec, "durationSec")
            .and_then(|d| {
                u32::try_from(d).map_err(|_| Error::BadInput("durationSec out of range".into()))
            })?;
        let cover_url = input.cover_url.filter(|url| !url.trim().is_empty());

        let _gate = self.store.enter();
        let campaign = self
            .store
            .campaign(&campaign_id)
            .ok_or(Error::CampaignNotFound)?;
        let owner = lock(&campaign).creator_id.clone();
        if !principal.role.is_admin() && owner != principal.user_id {
            return Err(Error::Forbidden);
        }

        let track = Track {
            id: TrackId::generate(),
            campaign_id,
            title,
            artist_name,
            cover_url,
            duration_sec,
            is_active: true,
            created_at: self.clock.now(),
        };
        self.store.insert_track(track.clone());
        info!(track_id = %track.id, campaign_id = %track.campaign_id, "Track created");
        Ok(track)
    }

    /// Rewardable tracks: active, in an ACTIVE campaign, newest first.
    pub fn list_active_tracks(&self) -> Vec<TrackListing> {
        let campaigns = self.store.campaigns();
        let mut tracks: Vec<Track> = self
            .store
            .tracks()
            .into_iter()
            .filter(|t| {
                t.is_active
                    && campaigns
                        .iter()
                        .any(|c| c.id == t.campaign_id && c.status == CampaignStatus::Active)
            })
            .collect();
        tracks.sort_by_key(|t| Reverse(t.created_at));
        tracks.truncate(ACTIVE_TRACKS_LIMIT);
        tracks.iter().map(listing).collect()
    }

    pub fn track_detail(&self, track_id: &TrackId) -> Result<TrackDetail, Error> {
        let track = self
            .store
            .track(track_id)
            .map(|cell| lock(&cell).clone())
            .ok_or(Error::NotFound)?;
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
        Ok(TrackDetail {
            track: listing(&track),
            campaign: CampaignTerms {
                min_listen_seconds: campaign.min_listen_seconds,
                cost_per_listen: campaign.cost_per_listen,
            },
        })
    }

    // --- Admin ---

    /// `status = None` leaves the campaign unchanged.
    pub fn set_campaign_status(
        &self,
        principal: &Principal,
        campaign_id: &CampaignId,
        status: Option<&str>,
    ) -> Result<CampaignState, Error> {
        principal.require_admin()?;

        let _gate = self.store.enter();
        let cell = self.store.campaign(campaign_id).ok_or(Error::NotFound)?;
        let status = status
            .map(|s| {
                s.parse::<CampaignStatus>()
                    .map_err(|_| Error::InvalidStatus(s.to_string()))
            })
            .transpose()?;

        let mut campaign = lock(&cell);
        if let Some(status) = status {
            campaign.status = status;
            info!(campaign_id = %campaign_id, ?status, "Campaign status changed");
        }
        Ok(CampaignState {
            id: campaign.id.clone(),
            name: campaign.name.clone(),
            status: campaign.status,
        })
    }

    /// `is_active = None` leaves the track unchanged.
    pub fn set_track_active(
        &self,
        principal: &Principal,
        track_id: &TrackId,
        is_active: Option<bool>,
    ) -> Result<TrackSummary, Error> {
        principal.require_admin()?;

        let _gate = self.store.enter();
        let cell = self.store.track(track_id).ok_or(Error::NotFound)?;
        let mut track = lock(&cell);
        if let Some(is_active) = is_active {
            track.is_active = is_active;
            info!(track_id = %track_id, is_active, "Track toggled");
        }
        Ok(TrackSummary::from(&*track))
    }

    pub fn overview(&self, principal: &Principal) -> Result<Overview, Error> {
        principal.require_admin()?;

        let mut tracks = self.store.tracks();
        tracks.sort_by_key(|t| Reverse(t.created_at));
        let mut campaigns = self.store.campaigns();
        campaigns.sort_by_key(|c| Reverse(c.created_at));

        Ok(Overview {
            campaigns: campaigns
                .into_iter()
                .map(|c| OverviewCampaign {
                    tracks: summaries_for(&tracks, &c.id),
                    id: c.id,
                    name: c.name,
                    status: c.status,
                    budget_points: c.budget_points,
                    spent_points: c.spent_points,
                })
                .collect(),
            tracks: tracks
                .into_iter()
                .map(|t| OverviewTrack {
                    id: t.id,
                    title: t.title,
                    artist_name: t.artist_name,
                    is_active: t.is_active,
                    campaign_id: t.campaign_id,
                })
                .collect(),
        })
    }
}

fn listing(track: &Track) -> TrackListing {
    TrackListing {
        id: track.id.clone(),
        title: track.title.clone(),
        artist_name: track.artist_name.clone(),
        cover_url: track.cover_url.clone(),
        duration_sec: track.duration_sec,
    }
}

fn summaries_for(tracks: &[Track], campaign_id: &CampaignId) -> Vec<TrackSummary> {
    tracks
        .iter()
        .filter(|t| &t.campaign_id == campaign_id)
        .map(TrackSummary::from)
        .collect()
}

fn required_text(value: Option<String>, field: &str) -> Result<String, Error> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::BadInput(format!("{field} is required")))
}

fn positive(value: Option<i64>, field: &str) -> Result<u64, Error> {
    match value {
        Some(v) if v > 0 => Ok(v as u64),
        _ => Err(Error::BadInput(format!("{field} must be positive"))),
    }
}
