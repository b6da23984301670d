//! Racing completions against a shared budget, a per-user daily cap and a
//! shared session.

use anyhow::Result;
use axum::http::StatusCode;
use fanpoints_server::{Completion, Principal};
use fanpoints_types::{RejectReason, SessionId, SessionStatus, TrackId};
use serde_json::json;
use std::sync::Arc;
use std::thread;

use crate::utils::{setup, setup_with, TestApp};

async fn listeners(app: &TestApp, track: &str, count: usize) -> Result<Vec<(String, String)>> {
    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        let fan = format!("fan-{i}");
        let session = app.listen(&fan, track).await?;
        out.push((fan, session));
    }
    Ok(out)
}

// ── Engine level ────────────────────────────────────────────────────

#[tokio::test]
async fn test_parallel_completions_respect_budget() -> Result<()> {
    let app = setup();
    let (campaign, track) = app.seed(20, 3, 30, 200).await?;
    let fans = listeners(&app, &track, 16).await?;

    let track_id = TrackId::from(track.clone());
    let outcomes: Vec<Completion> = thread::scope(|scope| {
        let handles: Vec<_> = fans
            .iter()
            .map(|(fan, session)| {
                let state = &app.state;
                let track_id = &track_id;
                scope.spawn(move || {
                    state.rewards.complete(
                        &Principal::fan(fan.as_str()),
                        track_id,
                        &SessionId::from(session.clone()),
                    )
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("worker panicked"))
            .collect::<Result<Vec<_>, _>>()
    })?;

    let rewarded = outcomes
        .iter()
        .filter(|c| matches!(c, Completion::Rewarded(_)))
        .count();
    assert_eq!(rewarded, 6);
    assert!(outcomes.iter().all(|c| match c {
        Completion::Rewarded(reward) => reward.amount == 3,
        Completion::Rejected(reason) => reason.code() == "CAMPAIGN_BUDGET",
    }));

    let (spent, budget) = app.campaign_spend(&campaign).await?;
    assert_eq!((spent, budget), (18, 20));

    let mut paid = 0;
    for (fan, _) in &fans {
        paid += app.balance(fan).await?;
    }
    assert_eq!(paid, spent);
    Ok(())
}

#[tokio::test]
async fn test_same_session_settles_once() -> Result<()> {
    let app = setup();
    let (campaign, track) = app.seed(100, 5, 30, 200).await?;
    let session = app.listen("fan", &track).await?;

    let track_id = TrackId::from(track.clone());
    let session_id = SessionId::from(session.clone());
    let principal = Principal::fan("fan");
    let outcomes = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| app.state.rewards.complete(&principal, &track_id, &session_id)))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("worker panicked"))
            .collect::<Vec<_>>()
    });

    let rewarded = outcomes
        .iter()
        .filter(|c| matches!(c, Ok(Completion::Rewarded(_))))
        .count();
    assert_eq!(rewarded, 1);
    // Losers either saw the settled session up front or lost the commit race.
    for outcome in &outcomes {
        match outcome {
            Ok(Completion::Rewarded(_)) => {}
            Ok(Completion::Rejected(reason)) => assert_eq!(reason.code(), "ALREADY_REWARDED"),
            Err(e) => assert_eq!(e.code(), "SETTLEMENT_CONFLICT"),
        }
    }

    assert_eq!(app.balance("fan").await?, 5);
    assert_eq!(app.campaign_spend(&campaign).await?, (5, 100));
    Ok(())
}

#[tokio::test]
async fn test_parallel_completions_respect_daily_cap() -> Result<()> {
    let app = setup();
    app.set_rules(json!({ "dailyRewardCap": 10 })).await?;
    let campaign = app.create_campaign(1000, 6, 30).await?;
    let mut sessions = Vec::new();
    for _ in 0..8 {
        let track = app.create_track(&campaign, 200).await?;
        let session = app.listen("fan", &track).await?;
        sessions.push((TrackId::from(track), SessionId::from(session)));
    }

    let principal = Principal::fan("fan");
    let outcomes = thread::scope(|scope| {
        let handles: Vec<_> = sessions
            .iter()
            .map(|(track_id, session_id)| {
                let (state, principal) = (&app.state, &principal);
                scope.spawn(move || state.rewards.complete(principal, track_id, session_id))
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("worker panicked"))
            .collect::<Vec<_>>()
    });

    let rewarded = outcomes
        .iter()
        .filter(|c| matches!(c, Ok(Completion::Rewarded(_))))
        .count();
    assert_eq!(rewarded, 1);
    for outcome in &outcomes {
        match outcome {
            Ok(Completion::Rewarded(reward)) => assert_eq!(reward.amount, 6),
            Ok(Completion::Rejected(reason)) => assert_eq!(*reason, RejectReason::DailyCap),
            Err(e) => assert_eq!(e.code(), "SETTLEMENT_CONFLICT"),
        }
    }

    assert_eq!(app.balance("fan").await?, 6);
    assert_eq!(app.campaign_spend(&campaign).await?, (6, 1000));
    Ok(())
}

#[tokio::test]
async fn test_heartbeats_racing_completion() -> Result<()> {
    let app = setup();
    let (_, track) = app.seed(100, 5, 30, 200).await?;
    let session = app.listen("fan", &track).await?;

    let principal = Principal::fan("fan");
    let track_id = TrackId::from(track.clone());
    let session_id = SessionId::from(session.clone());
    let (completion, acks) = thread::scope(|scope| {
        let completer =
            scope.spawn(|| app.state.rewards.complete(&principal, &track_id, &session_id));
        let beats: Vec<_> = (1..=16u32)
            .map(|i| {
                let (state, principal, session_id) = (&app.state, &principal, &session_id);
                scope.spawn(move || {
                    state
                        .sessions
                        .heartbeat(principal, session_id, f64::from(170 + i), 86.0)
                })
            })
            .collect();
        let acks: Vec<_> = beats
            .into_iter()
            .map(|h| h.join().expect("heartbeat panicked"))
            .collect();
        (completer.join().expect("completer panicked"), acks)
    });

    assert!(matches!(completion, Ok(Completion::Rewarded(_))));
    assert!(acks.iter().all(Result::is_ok));

    let settled = app
        .state
        .sessions
        .get(&session_id)
        .expect("session exists");
    assert_eq!(settled.status, SessionStatus::Rewarded);
    assert!(settled.completed_at.is_some());
    assert!((170..=186).contains(&settled.progress_sec));

    // Reports after settlement are acknowledged but never stored.
    let (status, _) = app.heartbeat("fan", &session, 199.0, 99.0).await?;
    assert_eq!(status, StatusCode::OK);
    let after = app
        .state
        .sessions
        .get(&session_id)
        .expect("session exists");
    assert_eq!(after, settled);
    assert_eq!(app.balance("fan").await?, 5);
    Ok(())
}

// ── HTTP level ──────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_http_completions() -> Result<()> {
    let app = Arc::new(setup_with(fanpoints_server::Config::default()));
    let (campaign, track) = app.seed(50, 10, 30, 200).await?;
    let fans = listeners(&app, &track, 12).await?;

    let mut tasks = Vec::new();
    for (fan, session) in fans.clone() {
        let app = Arc::clone(&app);
        let track = track.clone();
        tasks.push(tokio::spawn(async move {
            app.complete(&fan, &session, &track).await
        }));
    }

    let mut ok = 0;
    for task in tasks {
        let (status, body) = task.await??;
        match status {
            StatusCode::OK => ok += 1,
            StatusCode::BAD_REQUEST => assert_eq!(body["reason"], "CAMPAIGN_BUDGET"),
            other => panic!("unexpected {other}: {body}"),
        }
    }
    assert_eq!(ok, 5);
    assert_eq!(app.campaign_spend(&campaign).await?, (50, 50));

    let mut paid = 0;
    for (fan, _) in &fans {
        paid += app.balance(fan).await?;
    }
    assert_eq!(paid, 50);
    Ok(())
}
