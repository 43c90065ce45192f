use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use shared::entity::portfolios;

use crate::auth::CurrentUser;
use crate::error::AppResult;
use crate::services::portfolio_service::{self, AmountInput, PortfolioInput};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(show).put(update).delete(remove))
        .route("/:id/deposit", post(deposit))
        .route("/:id/withdraw", post(withdraw))
}

async fn list(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> AppResult<Json<Vec<portfolios::Model>>> {
    Ok(Json(portfolio_service::list_portfolios(&state.db, user.id).await?))
}

async fn create(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(input): Json<PortfolioInput>,
) -> AppResult<(StatusCode, Json<portfolios::Model>)> {
    let portfolio = portfolio_service::create_portfolio(&state.db, user.id, input).await?;
    Ok((StatusCode::CREATED, Json(portfolio)))
}

async fn show(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<u64>,
) -> AppResult<Json<portfolios::Model>> {
    Ok(Json(portfolio_service::get_portfolio(&state.db, user.id, id).await?))
}

async fn update(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<u64>,
    Json(input): Json<PortfolioInput>,
) -> AppResult<Json<portfolios::Model>> {
    Ok(Json(portfolio_service::update_portfolio(&state.db, user.id, id, input).await?))
}

async fn remove(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<u64>,
) -> AppResult<StatusCode> {
    portfolio_service::delete_portfolio(&state.db, user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn deposit(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<u64>,
    Json(input): Json<AmountInput>,
) -> AppResult<Json<portfolios::Model>> {
    Ok(Json(portfolio_service::deposit(&state.db, user.id, id, input.amount).await?))
}

async fn withdraw(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<u64>,
    Json(input): Json<AmountInput>,
) -> AppResult<Json<portfolios::Model>> {
    Ok(Json(portfolio_service::withdraw(&state.db, user.id, id, input.amount).await?))
}
