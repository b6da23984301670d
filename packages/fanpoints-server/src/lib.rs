//! # Fanpoints Reward Service
//!
//! Listen-to-earn reward engine. Fans start listening sessions, report
//! progress, and on completion a qualifying session pays the campaign's
//! cost-per-listen into their wallet, exactly once, within the campaign
//! budget and the per-user fraud limits.
//!
//! ## Quick Start
//! ```bash
//! cargo run --bin fanpoints-server
//! ```
//!
//! ## Endpoints
//! - `GET /health` - Health check
//! - `GET /metrics` - Prometheus metrics
//! - `POST /api/player/start` - Open a listening session
//! - `POST /api/player/heartbeat` - Report progress
//! - `POST /api/player/complete` - Validate and settle a reward
//! - `GET /api/wallet` - Balance and recent ledger entries
//! - `/api/tracks`, `/api/creator/campaigns` - Catalog
//! - `/api/admin/*` - Fraud rules, campaign and track toggles, overview, bonuses

pub mod catalog;
pub mod clock;
pub mod config;
mod error;
pub mod fraud_rules;
mod handlers;
pub mod metrics;
pub mod middleware;
pub mod principal;
mod response;
pub mod rewards;
mod router;
pub mod sessions;
pub mod settlement;
mod state;
pub mod store;
pub mod validator;
pub mod wallet;

pub use clock::{Clock, SystemClock};
#[cfg(any(test, feature = "test-util"))]
pub use clock::ManualClock;
pub use config::Config;
pub use error::Error;
pub use principal::Principal;
pub use rewards::Completion;
pub use router::create as create_router;
pub use state::AppState;
