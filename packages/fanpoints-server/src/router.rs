//! HTTP router setup.

use crate::handlers::{self, admin, catalog, player};
use crate::middleware::{api_key_auth, inject_request_id};
use crate::state::AppState;
use axum::middleware;
use axum::routing::{get, patch, post};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/player/start", post(player::start))
        .route("/player/heartbeat", post(player::heartbeat))
        .route("/player/complete", post(player::complete))
        .route("/player/sessions/{id}", get(player::session))
        .route("/wallet", get(player::wallet))
        .route("/tracks", get(catalog::list_tracks).post(catalog::create_track))
        .route("/tracks/{id}", get(catalog::track_detail))
        .route(
            "/creator/campaigns",
            get(catalog::list_campaigns).post(catalog::create_campaign),
        )
        .route(
            "/admin/fraud-rules",
            get(admin::get_fraud_rules).patch(admin::patch_fraud_rules),
        )
        .route("/admin/campaigns/{id}", patch(admin::patch_campaign))
        .route("/admin/tracks/{id}", patch(admin::patch_track))
        .route("/admin/overview", get(admin::overview))
        .route("/admin/bonus", post(admin::grant_bonus))
        .route_layer(middleware::from_fn_with_state(state.clone(), api_key_auth));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(inject_request_id))
        .with_state(state)
}
