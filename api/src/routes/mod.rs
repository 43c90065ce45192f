use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

use crate::state::AppState;

pub mod account;
pub mod ai;
pub mod auth;
pub mod chat;
pub mod feed;
pub mod habits;
pub mod leaderboard;
pub mod notes;
pub mod portfolios;
pub mod stats;
pub mod strategies;
pub mod trades;
pub mod uploads;
pub mod watchlist;

pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .nest("/auth", auth::router())
        .nest("/account", account::router())
        .nest("/trades", trades::router())
        .nest("/portfolios", portfolios::router())
        .nest("/strategies", strategies::router())
        .nest("/notes", notes::router())
        .nest("/habits", habits::router())
        .nest("/watchlist", watchlist::router())
        .nest("/chat", chat::router())
        .nest("/leaderboard", leaderboard::router())
        .nest("/stats", stats::router())
        .nest("/uploads", uploads::router())
        .nest("/ai", ai::router())
        .merge(feed::router());

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(state.config.cors_origin.as_deref())),
        )
        .with_state(state)
}

/// Credentialed CORS needs an explicit origin; without one only same-origin
/// requests carry the session cookie.
fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    match origin.map(HeaderValue::from_str) {
        Some(Ok(origin)) => layer.allow_origin(origin).allow_credentials(true),
        Some(Err(_)) => {
            warn!("CORS_ORIGIN is not a valid header value, cross-origin requests are disabled");
            layer
        }
        None => layer,
    }
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
