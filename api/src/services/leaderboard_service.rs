//! Leaderboard ranking over every account's trades.

use std::collections::HashMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, QueryFilter,
    QueryOrder, QuerySelect,
};
use serde::Serialize;
use shared::entity::{trades, users};

use super::feed_service::Author;
use crate::error::AppResult;

pub const LEADERBOARD_SIZE: usize = 20;
/// Added to the trade count inside the log so a single trade still weighs in.
pub const CONFIDENCE_OFFSET: f64 = 1.718;

pub const PLACEHOLDER_NAME: &str = "Anonymous Trader";
pub const PLACEHOLDER_USERNAME: &str = "anonymous";
pub const PLACEHOLDER_AVATAR: &str = "/default-avatar.png";

/// Per-account totals as produced by the group-by query.
#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct TraderTotals {
    pub user_id: i64,
    pub total_pnl: Option<Decimal>,
    pub trade_count: i64,
    pub win_count: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedTrader {
    pub user_id: i64,
    pub total_pnl: f64,
    pub trade_count: i64,
    pub win_count: i64,
    pub win_rate: f64,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub user_id: i64,
    pub name: String,
    pub username: String,
    pub avatar_url: String,
    pub total_pnl: f64,
    pub trade_count: i64,
    pub win_rate: f64,
    pub score: f64,
}

/// `win_count / max(trade_count, 1)`
pub fn win_rate(win_count: i64, trade_count: i64) -> f64 {
    (win_count.max(0) as f64 / trade_count.max(1) as f64).min(1.0)
}

/// `win_rate × total_pnl × ln(trade_count + 1.718)`
pub fn composite_score(win_rate: f64, total_pnl: f64, trade_count: i64) -> f64 {
    win_rate * total_pnl * (trade_count as f64 + CONFIDENCE_OFFSET).ln()
}

/// Scores every account and sorts by descending score. The sort is stable, so
/// equal scores keep their input order.
pub fn rank_traders(totals: Vec<TraderTotals>) -> Vec<RankedTrader> {
    let mut ranked: Vec<RankedTrader> = totals
        .into_iter()
        .map(|t| {
            let total_pnl = t.total_pnl.and_then(|p| p.to_f64()).unwrap_or(0.0);
            let win_count = t.win_count.unwrap_or(0);
            let rate = win_rate(win_count, t.trade_count);
            RankedTrader {
                user_id: t.user_id,
                total_pnl,
                trade_count: t.trade_count,
                win_count,
                win_rate: rate,
                score: composite_score(rate, total_pnl, t.trade_count),
            }
        })
        .collect();

    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked
}

/// Joins display fields onto the ranked rows, falling back to placeholders.
pub fn decorate(ranked: Vec<RankedTrader>, accounts: &HashMap<i64, users::Model>) -> Vec<LeaderboardEntry> {
    ranked
        .into_iter()
        .enumerate()
        .map(|(idx, r)| {
            let author = Author::of(r.user_id, accounts.get(&r.user_id));
            LeaderboardEntry {
                rank: idx + 1,
                user_id: r.user_id,
                name: author.name,
                username: author.username,
                avatar_url: author.avatar_url,
                total_pnl: r.total_pnl,
                trade_count: r.trade_count,
                win_rate: r.win_rate,
                score: r.score,
            }
        })
        .collect()
}

pub async fn trader_totals(db: &DatabaseConnection) -> AppResult<Vec<TraderTotals>> {
    let totals = trades::Entity::find()
        .select_only()
        .column(trades::Column::UserId)
        .column_as(trades::Column::Pnl.sum(), "total_pnl")
        .column_as(trades::Column::Id.count(), "trade_count")
        .column_as(
            Expr::cust("CAST(SUM(CASE WHEN pnl > 0 THEN 1 ELSE 0 END) AS SIGNED)"),
            "win_count",
        )
        .group_by(trades::Column::UserId)
        .order_by_asc(trades::Column::UserId)
        .into_model::<TraderTotals>()
        .all(db)
        .await?;
    Ok(totals)
}

pub async fn leaderboard(db: &DatabaseConnection) -> AppResult<Vec<LeaderboardEntry>> {
    let mut ranked = rank_traders(trader_totals(db).await?);
    ranked.truncate(LEADERBOARD_SIZE);

    let ids: Vec<i64> = ranked.iter().map(|r| r.user_id).collect();
    let accounts: HashMap<i64, users::Model> = if ids.is_empty() {
        HashMap::new()
    } else {
        users::Entity::find()
            .filter(users::Column::Id.is_in(ids))
            .all(db)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect()
    };

    Ok(decorate(ranked, &accounts))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn totals(user_id: i64, pnl: i64, trades: i64, wins: i64) -> TraderTotals {
        TraderTotals {
            user_id,
            total_pnl: Some(Decimal::from(pnl)),
            trade_count: trades,
            win_count: Some(wins),
        }
    }

    #[test]
    fn worked_example_matches_formula() {
        // P&L [+100, -20, +50]
        let ranked = rank_traders(vec![totals(7, 130, 3, 2)]);
        let r = &ranked[0];
        assert!((r.win_rate - 2.0 / 3.0).abs() < 1e-12);
        let expected = (2.0 / 3.0) * 130.0 * (3.0_f64 + 1.718).ln();
        assert!((r.score - expected).abs() < 1e-9);
        assert!((r.score - 134.453).abs() < 0.001);
    }

    #[test]
    fn win_rate_stays_in_unit_interval() {
        assert_eq!(win_rate(0, 0), 0.0);
        assert_eq!(win_rate(3, 0), 1.0);
        for (wins, count) in [(0, 5), (5, 5), (2, 3), (0, 1)] {
            let rate = win_rate(wins, count);
            assert!((0.0..=1.0).contains(&rate));
        }
    }

    #[test]
    fn ordering_is_descending_and_stable() {
        let ranked = rank_traders(vec![
            totals(1, 100, 2, 1),
            totals(2, 500, 4, 3),
            totals(3, 100, 2, 1),
            totals(4, -50, 3, 1),
        ]);
        let ids: Vec<i64> = ranked.iter().map(|r| r.user_id).collect();
        assert_eq!(ids, vec![2, 1, 3, 4]);
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn missing_accounts_get_placeholders() {
        let ranked = rank_traders(vec![totals(9, 10, 1, 1)]);
        let entries = decorate(ranked, &HashMap::new());
        assert_eq!(entries[0].rank, 1);
        assert_eq!(entries[0].name, PLACEHOLDER_NAME);
        assert_eq!(entries[0].username, PLACEHOLDER_USERNAME);
        assert_eq!(entries[0].avatar_url, PLACEHOLDER_AVATAR);
    }
}
