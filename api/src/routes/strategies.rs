use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use shared::entity::strategies;

use crate::auth::CurrentUser;
use crate::error::AppResult;
use crate::services::strategy_service::{self, StrategyDetail, StrategyInput};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(show).put(update).delete(remove))
}

async fn list(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> AppResult<Json<Vec<strategies::Model>>> {
    Ok(Json(strategy_service::list_strategies(&state.db, user.id).await?))
}

async fn create(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(input): Json<StrategyInput>,
) -> AppResult<(StatusCode, Json<strategies::Model>)> {
    let strategy = strategy_service::create_strategy(&state.db, user.id, input).await?;
    Ok((StatusCode::CREATED, Json(strategy)))
}

async fn show(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<u64>,
) -> AppResult<Json<StrategyDetail>> {
    Ok(Json(strategy_service::get_strategy_detail(&state.db, user.id, id).await?))
}

async fn update(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<u64>,
    Json(input): Json<StrategyInput>,
) -> AppResult<Json<strategies::Model>> {
    Ok(Json(strategy_service::update_strategy(&state.db, user.id, id, input).await?))
}

async fn remove(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<u64>,
) -> AppResult<StatusCode> {
    strategy_service::delete_strategy(&state.db, user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
