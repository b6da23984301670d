//! Error types for the reward service.
//!
//! Reward rejections are not errors; see [`crate::validator::Verdict`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use fanpoints_types::RejectReason;

/// Service error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),
    #[error("missing trackId")]
    MissingTrack,
    #[error("missing sessionId")]
    MissingSession,
    #[error("missing sessionId or trackId")]
    MissingParams,
    #[error("progressSec out of range")]
    BadProgress,
    #[error("completionPct out of range")]
    BadPct,
    #[error("bad input: {0}")]
    BadInput(String),
    #[error("invalid campaign status: {0}")]
    InvalidStatus(String),
    /// No authenticated principal on the request.
    #[error("not authenticated")]
    Unauthenticated,
    /// Gateway API key missing or wrong.
    #[error("invalid or missing API key")]
    InvalidApiKey,
    /// Principal is known but may not act on the resource.
    #[error("forbidden")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error("track not found")]
    TrackNotFound,
    #[error("campaign not found")]
    CampaignNotFound,
    /// The atomic re-check inside settlement failed; nothing was written.
    /// The reason is for logs only and never rendered to the caller.
    #[error("settlement conflict, retry the request")]
    SettlementConflict(RejectReason),
    /// Store integrity, arithmetic overflow, or snapshot I/O.
    #[error("storage error: {0}")]
    Storage(String),
}

impl Error {
    /// Machine-readable code returned in the `error` field.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Config(_) => "CONFIG_ERROR",
            Error::MissingTrack => "MISSING_TRACK",
            Error::MissingSession => "MISSING_SESSION",
            Error::MissingParams => "MISSING_PARAMS",
            Error::BadProgress => "BAD_PROGRESS",
            Error::BadPct => "BAD_PCT",
            Error::BadInput(_) => "BAD_INPUT",
            Error::InvalidStatus(_) => "INVALID_STATUS",
            Error::Unauthenticated => "UNAUTHENTICATED",
            Error::InvalidApiKey => "UNAUTHORIZED",
            Error::Forbidden => "FORBIDDEN",
            Error::NotFound => "NOT_FOUND",
            Error::TrackNotFound => "TRACK_NOT_FOUND",
            Error::CampaignNotFound => "CAMPAIGN_NOT_FOUND",
            Error::SettlementConflict(_) => "SETTLEMENT_CONFLICT",
            Error::Storage(_) => "STORAGE_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Error::MissingTrack
            | Error::MissingSession
            | Error::MissingParams
            | Error::BadProgress
            | Error::BadPct
            | Error::BadInput(_)
            | Error::InvalidStatus(_) => StatusCode::BAD_REQUEST,
            Error::Unauthenticated | Error::InvalidApiKey => StatusCode::UNAUTHORIZED,
            Error::Forbidden => StatusCode::FORBIDDEN,
            Error::NotFound | Error::TrackNotFound | Error::CampaignNotFound => {
                StatusCode::NOT_FOUND
            }
            Error::SettlementConflict(_) => StatusCode::CONFLICT,
            Error::Config(_) | Error::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        let body = serde_json::json!({
            "error": self.code(),
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}
