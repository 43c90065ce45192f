use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};

use crate::error::AppResult;
use crate::services::leaderboard_service::{self, LeaderboardEntry};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(leaderboard))
}

async fn leaderboard(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<LeaderboardEntry>>> {
    Ok(Json(leaderboard_service::leaderboard(&state.db).await?))
}
