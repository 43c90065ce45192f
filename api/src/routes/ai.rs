use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::error::{AppError, AppResult};
use crate::extract::OptionalJson;
use crate::services::ai_assist::{
    CoachReply, JournalPrompts, JournalPromptsInput, RiskCheck, RiskCheckInput, StrategyReview,
    StrategyReviewInput, TradeDigest, TradeInsights,
};
use crate::services::stats_service::PerformanceSummary;
use crate::services::{strategy_service, trade_service};
use crate::state::AppState;

const DEFAULT_INSIGHT_TRADES: u64 = 20;
const MAX_INSIGHT_TRADES: u64 = 50;
const MAX_QUESTION_LENGTH: usize = 2000;

#[derive(Debug, Default, Deserialize)]
struct TradeInsightsRequest {
    symbol: Option<String>,
    limit: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct StrategyReviewRequest {
    strategy_id: Option<u64>,
    #[serde(flatten)]
    inline: Option<StrategyReviewInput>,
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/trade-insights", post(trade_insights))
        .route("/strategy-review", post(strategy_review))
        .route("/risk-check", post(risk_check))
        .route("/journal-prompts", post(journal_prompts))
        .route("/chat", post(chat))
}

async fn trade_insights(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    OptionalJson(request): OptionalJson<TradeInsightsRequest>,
) -> AppResult<Json<TradeInsights>> {
    let limit = request
        .limit
        .unwrap_or(DEFAULT_INSIGHT_TRADES)
        .clamp(1, MAX_INSIGHT_TRADES);
    let symbol = request.symbol.filter(|s| !s.trim().is_empty());

    let recent = trade_service::recent_trades(&state.db, user.id, symbol.as_deref(), limit).await?;
    let digests: Vec<TradeDigest> = recent.iter().map(TradeDigest::from).collect();
    Ok(Json(state.ai.trade_insights(&digests).await))
}

/// Reviews a saved strategy (`strategy_id`) or one sent inline.
async fn strategy_review(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(request): Json<StrategyReviewRequest>,
) -> AppResult<Json<StrategyReview>> {
    let input = match (request.strategy_id, request.inline) {
        (Some(id), _) => StrategyReviewInput::from(strategy_service::get_strategy(&state.db, user.id, id).await?),
        (None, Some(inline)) if !inline.name.trim().is_empty() => inline,
        _ => return Err(AppError::validation("Provide a strategy_id or a strategy name")),
    };
    Ok(Json(state.ai.strategy_review(&input).await))
}

async fn risk_check(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Json(input): Json<RiskCheckInput>,
) -> AppResult<Json<RiskCheck>> {
    if input.symbol.trim().is_empty() {
        return Err(AppError::validation("Symbol is required"));
    }
    if input.entry_price <= 0.0 || input.stop_loss <= 0.0 {
        return Err(AppError::validation("Entry and stop loss must be positive"));
    }
    if input.account_balance <= 0.0 {
        return Err(AppError::validation("Account balance must be positive"));
    }
    Ok(Json(state.ai.risk_check(&input).await))
}

/// Fills in recent context from the journal when the caller sends none.
async fn journal_prompts(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    OptionalJson(mut input): OptionalJson<JournalPromptsInput>,
) -> AppResult<Json<JournalPrompts>> {
    if input.recent_summary.as_deref().map_or(true, |s| s.trim().is_empty()) {
        let recent = trade_service::recent_trades(&state.db, user.id, None, 10).await?;
        if !recent.is_empty() {
            let summary = PerformanceSummary::from_trades(&recent);
            let last = &recent[0];
            input.recent_summary = Some(format!(
                "{} recent trades, {} closed, win rate {:.0}%, net P&L {:.2}; last trade {} {} ({})",
                summary.total_trades,
                summary.closed_trades,
                summary.win_rate,
                summary.total_pnl,
                last.direction,
                last.symbol,
                last.pnl.to_f64().unwrap_or(0.0),
            ));
        }
    }
    Ok(Json(state.ai.journal_prompts(&input).await))
}

async fn chat(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Json(request): Json<ChatRequest>,
) -> AppResult<Json<CoachReply>> {
    let message = request.message.trim();
    if message.is_empty() {
        return Err(AppError::validation("Message cannot be empty"));
    }
    if message.chars().count() > MAX_QUESTION_LENGTH {
        return Err(AppError::validation(format!(
            "Message must be at most {} characters",
            MAX_QUESTION_LENGTH
        )));
    }
    Ok(Json(state.ai.coach(message).await))
}
