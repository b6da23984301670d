//! End-to-end player flow through the HTTP router: start, heartbeat,
//! complete, wallet.

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::json;

use crate::utils::{setup, string_at, As};

// ── Start ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_start_requires_identity_and_track() -> Result<()> {
    let app = setup();
    let (_, track) = app.seed(100, 5, 30, 200).await?;

    let (status, body) = app
        .post("/api/player/start", As::Anonymous, json!({ "trackId": track }))
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "UNAUTHENTICATED");

    let (status, body) = app.post("/api/player/start", As::Fan("fan"), json!({})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "MISSING_TRACK");

    let (status, body) = app
        .post("/api/player/start", As::Fan("fan"), json!({ "trackId": "" }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "MISSING_TRACK");

    let (status, body) = app
        .post("/api/player/start", As::Fan("fan"), json!({ "trackId": "ghost" }))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "TRACK_NOT_FOUND");
    Ok(())
}

#[tokio::test]
async fn test_start_hashes_fingerprint() -> Result<()> {
    let app = setup();
    let (_, track) = app.seed(100, 5, 30, 200).await?;

    let (status, _, bytes) = app
        .raw(
            Method::POST,
            "/api/player/start",
            As::Fan("fan"),
            Some(json!({ "trackId": track, "deviceHash": "device-42" })),
            &[
                ("x-forwarded-for", "203.0.113.9, 10.0.0.1"),
                ("user-agent", "FanPlayer/1.0"),
            ],
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    let body: serde_json::Value = serde_json::from_slice(&bytes)?;
    let session_id = string_at(&body, "/sessionId")?;

    let (status, body) = app
        .get(&format!("/api/player/sessions/{session_id}"), As::Fan("fan"))
        .await?;
    assert_eq!(status, StatusCode::OK);
    let session = &body["session"];
    assert_eq!(session["status"], "STARTED");
    assert_eq!(
        session["ipHash"],
        fanpoints_types::hash_fingerprint_part("203.0.113.9").unwrap()
    );
    assert_eq!(
        session["deviceHash"],
        fanpoints_types::hash_fingerprint_part("device-42").unwrap()
    );
    assert!(!body.to_string().contains("203.0.113.9"));
    assert!(!body.to_string().contains("FanPlayer"));

    let (status, _) = app
        .get(&format!("/api/player/sessions/{session_id}"), As::Fan("someone-else"))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

// ── Heartbeat ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_heartbeat_errors() -> Result<()> {
    let app = setup();
    let (_, track) = app.seed(100, 5, 30, 200).await?;
    let session = app.start("fan", &track).await?;

    let (status, body) = app
        .post("/api/player/heartbeat", As::Fan("fan"), json!({ "progressSec": 5 }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "MISSING_SESSION");

    let (status, body) = app.heartbeat("fan", "ghost", 5.0, 5.0).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");

    let (status, body) = app.heartbeat("intruder", &session, 5.0, 5.0).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "FORBIDDEN");

    let (status, body) = app.heartbeat("fan", &session, 3601.0, 5.0).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BAD_PROGRESS");

    let (status, body) = app.heartbeat("fan", &session, 10.0, 101.0).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BAD_PCT");

    let (status, body) = app
        .post(
            "/api/player/heartbeat",
            As::Fan("fan"),
            json!({ "sessionId": session, "progressSec": "lots" }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BAD_INPUT");
    Ok(())
}

#[tokio::test]
async fn test_heartbeats_only_move_forward() -> Result<()> {
    let app = setup();
    let (_, track) = app.seed(100, 5, 30, 200).await?;
    let session = app.start("fan", &track).await?;

    for (progress, pct) in [(50.0, 30.0), (20.0, 60.0), (45.5, 10.0), (50.0, 30.0)] {
        let (status, body) = app.heartbeat("fan", &session, progress, pct).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "ok": true, "minHeartbeatGapMs": 5000 }));
    }

    let (_, body) = app
        .get(&format!("/api/player/sessions/{session}"), As::Fan("fan"))
        .await?;
    assert_eq!(body["session"]["progressSec"], 50);
    assert_eq!(body["session"]["completionPct"], 60);
    assert_eq!(body["session"]["status"], "IN_PROGRESS");
    Ok(())
}

// ── Complete ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_full_flow_credits_wallet_once() -> Result<()> {
    let app = setup();
    let (campaign, track) = app.seed(100, 5, 30, 200).await?;
    let session = app.listen("fan", &track).await?;

    let (status, body) = app.complete("fan", &session, &track).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["reward"]["amount"], 5);
    let ledger_entry_id = string_at(&body, "/reward/ledgerEntryId")?;

    let (status, body) = app.complete("fan", &session, &track).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "ok": false, "reason": "ALREADY_REWARDED" }));

    let (_, wallet) = app.get("/api/wallet", As::Fan("fan")).await?;
    assert_eq!(wallet["balance"], 5);
    assert_eq!(wallet["ledger"].as_array().map(Vec::len), Some(1));
    assert_eq!(wallet["ledger"][0]["id"], ledger_entry_id);
    assert_eq!(wallet["ledger"][0]["type"], "REWARD");
    assert_eq!(wallet["ledger"][0]["referenceId"], session);

    assert_eq!(app.campaign_spend(&campaign).await?, (5, 100));

    // Late heartbeats are tolerated and change nothing.
    let (status, body) = app.heartbeat("fan", &session, 10.0, 10.0).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    let (_, body) = app
        .get(&format!("/api/player/sessions/{session}"), As::Fan("fan"))
        .await?;
    assert_eq!(body["session"]["status"], "REWARDED");
    assert_eq!(body["session"]["progressSec"], 170);
    Ok(())
}

#[tokio::test]
async fn test_complete_missing_params() -> Result<()> {
    let app = setup();
    let (status, body) = app
        .post("/api/player/complete", As::Fan("fan"), json!({ "sessionId": "s" }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "MISSING_PARAMS");

    let (status, body) = app
        .post("/api/player/complete", As::Fan("fan"), json!({ "trackId": "t" }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "MISSING_PARAMS");
    Ok(())
}

#[tokio::test]
async fn test_complete_identity_rejections() -> Result<()> {
    let app = setup();
    let (_, track) = app.seed(100, 5, 30, 200).await?;
    let (_, other_track) = app.seed(100, 5, 30, 200).await?;
    let session = app.listen("fan", &track).await?;

    let (_, body) = app.complete("fan", "ghost", &track).await?;
    assert_eq!(body["reason"], "SESSION_NOT_FOUND");

    let (_, body) = app.complete("intruder", &session, &track).await?;
    assert_eq!(body["reason"], "NOT_OWNER");

    let (_, body) = app.complete("fan", &session, &other_track).await?;
    assert_eq!(body["reason"], "TRACK_MISMATCH");

    assert_eq!(app.balance("fan").await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_wallet_created_lazily_and_empty() -> Result<()> {
    let app = setup();
    let (status, body) = app.get("/api/wallet", As::Fan("newcomer")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "balance": 0, "ledger": [] }));
    Ok(())
}

// ── Plumbing ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_health_metrics_and_request_id() -> Result<()> {
    let app = setup();
    let (status, body) = app.get("/health", As::Anonymous).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, headers, bytes) = app
        .raw(Method::GET, "/metrics", As::Anonymous, None, &[("x-request-id", "trace-me")])
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["x-request-id"], "trace-me");
    let text = String::from_utf8(bytes)?;
    assert!(text.contains("fanpoints_rewards_settled_total"));
    assert!(text.contains("fanpoints_rejections_total{reason=\"NOT_QUALIFIED\"}"));

    let (_, headers, _) = app
        .raw(Method::GET, "/health", As::Anonymous, None, &[])
        .await?;
    let generated = headers["x-request-id"].to_str()?;
    assert!(generated.starts_with("fp-"));
    Ok(())
}
