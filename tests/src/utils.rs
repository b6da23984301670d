use anyhow::{anyhow, Result};
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::{DateTime, TimeZone, Utc};
use fanpoints_server::{create_router, AppState, Config, ManualClock};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

pub const CREATOR: &str = "creator-1";
pub const ADMIN: &str = "admin-1";

/// Mid-day so hour windows never straddle midnight unless a test wants them to.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
}

pub struct TestApp {
    pub app: Router,
    pub state: Arc<AppState>,
    pub clock: Arc<ManualClock>,
}

pub fn setup() -> TestApp {
    setup_with(Config::default())
}

pub fn setup_with(config: Config) -> TestApp {
    let clock = Arc::new(ManualClock::new(t0()));
    let state = Arc::new(AppState::with_clock(config, clock.clone()));
    TestApp {
        app: create_router(state.clone()),
        state,
        clock,
    }
}

/// Caller identity as the gateway would forward it.
#[derive(Clone, Copy)]
pub enum As<'a> {
    Anonymous,
    Fan(&'a str),
    Creator(&'a str),
    Admin(&'a str),
}

impl TestApp {
    pub async fn raw(
        &self,
        method: Method,
        uri: &str,
        who: As<'_>,
        body: Option<Value>,
        extra_headers: &[(&str, &str)],
    ) -> Result<(StatusCode, axum::http::HeaderMap, Vec<u8>)> {
        let mut builder = Request::builder().method(method).uri(uri);
        match who {
            As::Anonymous => {}
            As::Fan(id) => builder = builder.header("x-user-id", id),
            As::Creator(id) => {
                builder = builder
                    .header("x-user-id", id)
                    .header("x-user-role", "CREATOR")
            }
            As::Admin(id) => {
                builder = builder
                    .header("x-user-id", id)
                    .header("x-user-role", "ADMIN")
            }
        }
        for (name, value) in extra_headers {
            builder = builder.header(*name, *value);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.app.clone().oneshot(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        Ok((status, headers, bytes.to_vec()))
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        who: As<'_>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let (status, _, bytes) = self.raw(method, uri, who, body, &[]).await?;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok((status, value))
    }

    pub async fn get(&self, uri: &str, who: As<'_>) -> Result<(StatusCode, Value)> {
        self.send(Method::GET, uri, who, None).await
    }

    pub async fn post(&self, uri: &str, who: As<'_>, body: Value) -> Result<(StatusCode, Value)> {
        self.send(Method::POST, uri, who, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, who: As<'_>, body: Value) -> Result<(StatusCode, Value)> {
        self.send(Method::PATCH, uri, who, Some(body)).await
    }

    // ── Catalog seeding ─────────────────────────────────────────────

    pub async fn create_campaign(&self, budget: u64, cost: u64, min_listen: u32) -> Result<String> {
        let (status, body) = self
            .post(
                "/api/creator/campaigns",
                As::Creator(CREATOR),
                json!({
                    "name": "Summer drop",
                    "budgetPoints": budget,
                    "costPerListen": cost,
                    "minListenSeconds": min_listen,
                }),
            )
            .await?;
        expect_ok(status, &body)?;
        string_at(&body, "/campaign/id")
    }

    pub async fn create_track(&self, campaign_id: &str, duration_sec: u32) -> Result<String> {
        let (status, body) = self
            .post(
                "/api/tracks",
                As::Creator(CREATOR),
                json!({
                    "campaignId": campaign_id,
                    "title": "Track",
                    "artistName": "Artist",
                    "durationSec": duration_sec,
                }),
            )
            .await?;
        expect_ok(status, &body)?;
        string_at(&body, "/track/id")
    }

    /// Campaign plus one track; returns the track id.
    pub async fn seed(&self, budget: u64, cost: u64, min_listen: u32, duration: u32) -> Result<(String, String)> {
        let campaign = self.create_campaign(budget, cost, min_listen).await?;
        let track = self.create_track(&campaign, duration).await?;
        Ok((campaign, track))
    }

    pub async fn set_rules(&self, patch: Value) -> Result<Value> {
        let (status, body) = self
            .patch("/api/admin/fraud-rules", As::Admin(ADMIN), patch)
            .await?;
        expect_ok(status, &body)?;
        Ok(body)
    }

    // ── Player ──────────────────────────────────────────────────────

    pub async fn start(&self, fan: &str, track_id: &str) -> Result<String> {
        let (status, body) = self
            .post("/api/player/start", As::Fan(fan), json!({ "trackId": track_id }))
            .await?;
        expect_ok(status, &body)?;
        string_at(&body, "/sessionId")
    }

    pub async fn heartbeat(
        &self,
        fan: &str,
        session_id: &str,
        progress_sec: f64,
        completion_pct: f64,
    ) -> Result<(StatusCode, Value)> {
        self.post(
            "/api/player/heartbeat",
            As::Fan(fan),
            json!({
                "sessionId": session_id,
                "progressSec": progress_sec,
                "completionPct": completion_pct,
            }),
        )
        .await
    }

    pub async fn complete(&self, fan: &str, session_id: &str, track_id: &str) -> Result<(StatusCode, Value)> {
        self.post(
            "/api/player/complete",
            As::Fan(fan),
            json!({ "sessionId": session_id, "trackId": track_id }),
        )
        .await
    }

    /// Start, report a qualifying listen, return the session id.
    pub async fn listen(&self, fan: &str, track_id: &str) -> Result<String> {
        let session = self.start(fan, track_id).await?;
        let (status, body) = self.heartbeat(fan, &session, 170.0, 85.0).await?;
        expect_ok(status, &body)?;
        Ok(session)
    }

    pub async fn balance(&self, fan: &str) -> Result<u64> {
        let (status, body) = self.get("/api/wallet", As::Fan(fan)).await?;
        expect_ok(status, &body)?;
        body["balance"]
            .as_u64()
            .ok_or_else(|| anyhow!("no balance in {body}"))
    }

    pub async fn campaign_spend(&self, campaign_id: &str) -> Result<(u64, u64)> {
        let (status, body) = self.get("/api/admin/overview", As::Admin(ADMIN)).await?;
        expect_ok(status, &body)?;
        let campaign = body["campaigns"]
            .as_array()
            .and_then(|all| all.iter().find(|c| c["id"] == campaign_id))
            .ok_or_else(|| anyhow!("campaign {campaign_id} not in overview"))?;
        Ok((
            campaign["spentPoints"].as_u64().unwrap_or_default(),
            campaign["budgetPoints"].as_u64().unwrap_or_default(),
        ))
    }
}

pub fn expect_ok(status: StatusCode, body: &Value) -> Result<()> {
    if status.is_success() {
        Ok(())
    } else {
        Err(anyhow!("unexpected {status}: {body}"))
    }
}

pub fn string_at(body: &Value, pointer: &str) -> Result<String> {
    body.pointer(pointer)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| anyhow!("missing {pointer} in {body}"))
}
