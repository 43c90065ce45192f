use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use shared::entity::watchlist;

use crate::auth::CurrentUser;
use crate::error::AppResult;
use crate::services::watchlist_service::{self, WatchlistInput};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list).post(add))
        .route("/:id", delete(remove))
}

async fn list(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> AppResult<Json<Vec<watchlist::Model>>> {
    Ok(Json(watchlist_service::list_watchlist(&state.db, user.id).await?))
}

async fn add(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(input): Json<WatchlistInput>,
) -> AppResult<(StatusCode, Json<watchlist::Model>)> {
    let entry = watchlist_service::add_symbol(&state.db, user.id, input).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn remove(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<u64>,
) -> AppResult<StatusCode> {
    watchlist_service::remove_symbol(&state.db, user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
