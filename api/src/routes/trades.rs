use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use shared::entity::trades;

use crate::auth::CurrentUser;
use crate::error::AppResult;
use crate::services::trade_service::{self, TradeInput, TradeQuery};
use crate::services::Page;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(show).put(update).delete(remove))
}

async fn list(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(query): Query<TradeQuery>,
) -> AppResult<Json<Page<trades::Model>>> {
    Ok(Json(trade_service::list_trades(&state.db, user.id, query).await?))
}

async fn create(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(input): Json<TradeInput>,
) -> AppResult<(StatusCode, Json<trades::Model>)> {
    let trade = trade_service::create_trade(&state.db, user.id, input).await?;
    Ok((StatusCode::CREATED, Json(trade)))
}

async fn show(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<u64>,
) -> AppResult<Json<trades::Model>> {
    Ok(Json(trade_service::get_trade(&state.db, user.id, id).await?))
}

async fn update(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<u64>,
    Json(input): Json<TradeInput>,
) -> AppResult<Json<trades::Model>> {
    Ok(Json(trade_service::update_trade(&state.db, user.id, id, input).await?))
}

async fn remove(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<u64>,
) -> AppResult<StatusCode> {
    trade_service::delete_trade(&state.db, user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
