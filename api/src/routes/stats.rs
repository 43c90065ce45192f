use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};

use crate::auth::CurrentUser;
use crate::error::AppResult;
use crate::services::stats_service::{self, Overview};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/overview", get(overview))
}

async fn overview(State(state): State<Arc<AppState>>, user: CurrentUser) -> AppResult<Json<Overview>> {
    Ok(Json(stats_service::overview(&state.db, user.id).await?))
}
