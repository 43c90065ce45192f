//! Dashboard aggregates over an account's journal.

use std::collections::BTreeMap;

use rust_decimal::prelude::ToPrimitive;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use shared::entity::{habits, notes, portfolios, strategies, trades, watchlist};

use crate::error::AppResult;

/// Realized performance of a set of trades. Open trades are counted but do not
/// contribute P&L.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PerformanceSummary {
    pub total_trades: usize,
    pub open_trades: usize,
    pub closed_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64, // percent of closed trades
    pub total_pnl: f64,
    pub average_pnl: f64,
    pub average_win: f64,
    pub average_loss: f64,
    pub profit_factor: Option<f64>,
    pub average_r_multiple: Option<f64>,
    pub best_trade: Option<f64>,
    pub worst_trade: Option<f64>,
}

impl PerformanceSummary {
    pub fn from_trades(list: &[trades::Model]) -> Self {
        let mut summary = PerformanceSummary {
            total_trades: list.len(),
            ..Default::default()
        };

        let mut gross_profit = 0.0;
        let mut gross_loss = 0.0;
        let mut r_total = 0.0;
        let mut r_count = 0usize;

        for trade in list {
            if trade.status != "closed" {
                summary.open_trades += 1;
                continue;
            }
            summary.closed_trades += 1;

            let pnl = trade.pnl.to_f64().unwrap_or(0.0);
            summary.total_pnl += pnl;
            if pnl > 0.0 {
                summary.winning_trades += 1;
                gross_profit += pnl;
            } else if pnl < 0.0 {
                summary.losing_trades += 1;
                gross_loss += -pnl;
            }
            summary.best_trade = Some(summary.best_trade.map_or(pnl, |b| b.max(pnl)));
            summary.worst_trade = Some(summary.worst_trade.map_or(pnl, |w| w.min(pnl)));

            if let Some(r) = trade.r_multiple.and_then(|r| r.to_f64()) {
                r_total += r;
                r_count += 1;
            }
        }

        if summary.closed_trades > 0 {
            summary.win_rate =
                (summary.winning_trades as f64 / summary.closed_trades as f64) * 100.0;
            summary.average_pnl = summary.total_pnl / summary.closed_trades as f64;
        }
        if summary.winning_trades > 0 {
            summary.average_win = gross_profit / summary.winning_trades as f64;
        }
        if summary.losing_trades > 0 {
            summary.average_loss = -gross_loss / summary.losing_trades as f64;
        }
        if gross_loss > 0.0 {
            summary.profit_factor = Some(gross_profit / gross_loss);
        }
        if r_count > 0 {
            summary.average_r_multiple = Some(r_total / r_count as f64);
        }
        summary
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SymbolBreakdown {
    pub symbol: String,
    pub trades: usize,
    pub pnl: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyPnl {
    pub month: String, // YYYY-MM of the exit date
    pub pnl: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub performance: PerformanceSummary,
    pub by_symbol: Vec<SymbolBreakdown>,
    pub monthly: Vec<MonthlyPnl>,
    pub portfolio_count: u64,
    pub total_balance: f64,
    pub strategy_count: u64,
    pub note_count: u64,
    pub habit_count: u64,
    pub watchlist_count: u64,
}

/// Closed-trade P&L per symbol, largest first.
pub fn symbol_breakdown(list: &[trades::Model]) -> Vec<SymbolBreakdown> {
    let mut by_symbol: BTreeMap<&str, (usize, f64)> = BTreeMap::new();
    for trade in list.iter().filter(|t| t.status == "closed") {
        let entry = by_symbol.entry(trade.symbol.as_str()).or_default();
        entry.0 += 1;
        entry.1 += trade.pnl.to_f64().unwrap_or(0.0);
    }
    let mut rows: Vec<SymbolBreakdown> = by_symbol
        .into_iter()
        .map(|(symbol, (count, pnl))| SymbolBreakdown {
            symbol: symbol.to_string(),
            trades: count,
            pnl,
        })
        .collect();
    rows.sort_by(|a, b| b.pnl.total_cmp(&a.pnl));
    rows
}

/// Closed-trade P&L bucketed by exit month, oldest first.
pub fn monthly_pnl(list: &[trades::Model]) -> Vec<MonthlyPnl> {
    let mut months: BTreeMap<String, f64> = BTreeMap::new();
    for trade in list.iter().filter(|t| t.status == "closed") {
        let closed_at = trade.exit_date.unwrap_or(trade.entry_date);
        *months.entry(closed_at.format("%Y-%m").to_string()).or_default() +=
            trade.pnl.to_f64().unwrap_or(0.0);
    }
    months
        .into_iter()
        .map(|(month, pnl)| MonthlyPnl { month, pnl })
        .collect()
}

pub async fn overview(db: &DatabaseConnection, user_id: i64) -> AppResult<Overview> {
    let all_trades = trades::Entity::find()
        .filter(trades::Column::UserId.eq(user_id))
        .order_by_asc(trades::Column::EntryDate)
        .all(db)
        .await?;

    let user_portfolios = portfolios::Entity::find()
        .filter(portfolios::Column::UserId.eq(user_id))
        .all(db)
        .await?;
    let total_balance = user_portfolios
        .iter()
        .map(|p| p.current_balance.to_f64().unwrap_or(0.0))
        .sum();

    let strategy_count = strategies::Entity::find()
        .filter(strategies::Column::UserId.eq(user_id))
        .count(db)
        .await?;
    let note_count = notes::Entity::find()
        .filter(notes::Column::UserId.eq(user_id))
        .filter(notes::Column::IsArchived.eq(false))
        .count(db)
        .await?;
    let habit_count = habits::Entity::find()
        .filter(habits::Column::UserId.eq(user_id))
        .count(db)
        .await?;
    let watchlist_count = watchlist::Entity::find()
        .filter(watchlist::Column::UserId.eq(user_id))
        .count(db)
        .await?;

    Ok(Overview {
        performance: PerformanceSummary::from_trades(&all_trades),
        by_symbol: symbol_breakdown(&all_trades),
        monthly: monthly_pnl(&all_trades),
        portfolio_count: user_portfolios.len() as u64,
        total_balance,
        strategy_count,
        note_count,
        habit_count,
        watchlist_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use shared::StringList;

    fn trade(id: u64, symbol: &str, pnl: i64, status: &str, month: u32) -> trades::Model {
        let at = Utc.with_ymd_and_hms(2024, month, 10, 12, 0, 0).unwrap();
        trades::Model {
            id,
            user_id: 1,
            portfolio_id: None,
            strategy_id: None,
            symbol: symbol.to_string(),
            direction: "long".to_string(),
            status: status.to_string(),
            entry_price: Decimal::from(100),
            exit_price: None,
            quantity: Decimal::ONE,
            fees: Decimal::ZERO,
            pnl: Decimal::from(pnl),
            pnl_percent: Decimal::ZERO,
            stop_loss: None,
            take_profit: None,
            risk_amount: None,
            risk_reward: None,
            r_multiple: None,
            tags: StringList::default(),
            setup: None,
            notes: None,
            screenshot_url: None,
            entry_date: at,
            exit_date: Some(at),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn summary_counts_only_closed_trades() {
        let list = vec![
            trade(1, "AAPL", 100, "closed", 1),
            trade(2, "AAPL", -20, "closed", 1),
            trade(3, "MSFT", 50, "closed", 2),
            trade(4, "TSLA", 0, "open", 2),
        ];
        let s = PerformanceSummary::from_trades(&list);
        assert_eq!(s.total_trades, 4);
        assert_eq!(s.open_trades, 1);
        assert_eq!(s.closed_trades, 3);
        assert_eq!(s.winning_trades, 2);
        assert_eq!(s.losing_trades, 1);
        assert!((s.total_pnl - 130.0).abs() < 1e-9);
        assert!((s.win_rate - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(s.profit_factor, Some(7.5));
        assert_eq!(s.best_trade, Some(100.0));
        assert_eq!(s.worst_trade, Some(-20.0));
    }

    #[test]
    fn empty_journal_has_zeroed_summary() {
        let s = PerformanceSummary::from_trades(&[]);
        assert_eq!(s, PerformanceSummary::default());
    }

    #[test]
    fn breakdowns_group_by_symbol_and_month() {
        let list = vec![
            trade(1, "AAPL", 100, "closed", 1),
            trade(2, "AAPL", -20, "closed", 3),
            trade(3, "MSFT", 150, "closed", 3),
        ];
        let symbols = symbol_breakdown(&list);
        assert_eq!(symbols[0].symbol, "MSFT");
        assert_eq!(symbols[1].trades, 2);

        let months = monthly_pnl(&list);
        assert_eq!(months.len(), 2);
        assert_eq!(months[0].month, "2024-01");
        assert!((months[1].pnl - 130.0).abs() < 1e-9);
    }
}
