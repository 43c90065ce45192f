//! Trade journal entries and their derived P&L / risk metrics.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait,
    ModelTrait, PaginatorTrait, QueryFilter, QueryOrder,
};
use serde::Deserialize;
use shared::entity::trades;
use shared::StringList;

use super::{portfolio_service, strategy_service, Page, PageQuery};
use crate::error::{owned_by, AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "long" | "buy" => Some(Direction::Long),
            "short" | "sell" => Some(Direction::Short),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "long",
            Direction::Short => "short",
        }
    }

    fn sign(&self) -> Decimal {
        match self {
            Direction::Long => Decimal::ONE,
            Direction::Short => Decimal::NEGATIVE_ONE,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TradeInput {
    pub symbol: String,
    pub direction: String,
    pub status: Option<String>,
    pub entry_price: Decimal,
    pub exit_price: Option<Decimal>,
    pub quantity: Decimal,
    pub fees: Option<Decimal>,
    /// Overrides the computed P&L (e.g. partial exits booked elsewhere).
    pub pnl: Option<Decimal>,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub setup: Option<String>,
    pub notes: Option<String>,
    pub screenshot_url: Option<String>,
    pub entry_date: Option<DateTime<Utc>>,
    pub exit_date: Option<DateTime<Utc>>,
    pub portfolio_id: Option<u64>,
    pub strategy_id: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TradeQuery {
    pub symbol: Option<String>,
    pub direction: Option<String>,
    pub status: Option<String>,
    pub portfolio_id: Option<u64>,
    pub strategy_id: Option<u64>,
    pub tag: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// Values derived from a validated input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeMetrics {
    pub direction: Direction,
    pub status: &'static str,
    pub pnl: Decimal,
    pub pnl_percent: Decimal,
    pub risk_amount: Option<Decimal>,
    pub risk_reward: Option<Decimal>,
    pub r_multiple: Option<Decimal>,
}

pub fn validate(input: &TradeInput) -> AppResult<Direction> {
    if input.symbol.trim().is_empty() {
        return Err(AppError::validation("Symbol is required"));
    }
    let direction = Direction::parse(&input.direction)
        .ok_or_else(|| AppError::validation("Direction must be 'long' or 'short'"))?;
    if input.entry_price <= Decimal::ZERO {
        return Err(AppError::validation("Entry price must be positive"));
    }
    if input.quantity <= Decimal::ZERO {
        return Err(AppError::validation("Quantity must be positive"));
    }
    if input.exit_price.is_some_and(|p| p <= Decimal::ZERO) {
        return Err(AppError::validation("Exit price must be positive"));
    }
    if input.fees.is_some_and(|f| f.is_sign_negative()) {
        return Err(AppError::validation("Fees cannot be negative"));
    }
    check_amount(Some(input.entry_price), "Entry price")?;
    check_amount(input.exit_price, "Exit price")?;
    check_amount(Some(input.quantity), "Quantity")?;
    check_amount(input.fees, "Fees")?;
    check_amount(input.pnl, "P&L")?;
    check_amount(input.stop_loss, "Stop loss")?;
    check_amount(input.take_profit, "Take profit")?;
    if let Some(status) = input.status.as_deref() {
        if status != "open" && status != "closed" {
            return Err(AppError::validation("Status must be 'open' or 'closed'"));
        }
    }
    if let (Some(entry), Some(exit)) = (input.entry_date, input.exit_date) {
        if exit < entry {
            return Err(AppError::validation("Exit date cannot be before entry date"));
        }
    }
    Ok(direction)
}

/// Largest magnitude a `DECIMAL(20, 8)` column holds (exclusive).
fn amount_limit() -> Decimal {
    Decimal::from(1_000_000_000_000i64)
}

/// Largest magnitude a `DECIMAL(10, 4)` column holds (exclusive).
fn ratio_limit() -> Decimal {
    Decimal::from(1_000_000i64)
}

fn check_amount(value: Option<Decimal>, field: &str) -> AppResult<()> {
    match value {
        Some(v) if v.abs() >= amount_limit() => Err(AppError::validation(format!(
            "{} must be below {}",
            field,
            amount_limit()
        ))),
        _ => Ok(()),
    }
}

fn out_of_range() -> AppError {
    AppError::validation("Trade figures are out of range")
}

fn within(value: Decimal, limit: Decimal) -> AppResult<Decimal> {
    if value.abs() >= limit {
        return Err(out_of_range());
    }
    Ok(value)
}

/// Realized P&L, percent return and risk figures.
///
/// A trade with an exit price is closed and its P&L is
/// `(exit - entry) × quantity × side - fees` unless overridden. Results that
/// do not fit their columns are a validation error.
pub fn compute_metrics(input: &TradeInput, direction: Direction) -> AppResult<TradeMetrics> {
    let fees = input.fees.unwrap_or(Decimal::ZERO);
    let status = match (input.exit_price, input.status.as_deref()) {
        (Some(_), _) => "closed",
        (None, Some("closed")) => "closed",
        _ => "open",
    };

    let pnl = match (input.pnl, input.exit_price) {
        (Some(manual), _) => manual,
        (None, Some(exit)) => exit
            .checked_sub(input.entry_price)
            .and_then(|diff| diff.checked_mul(input.quantity))
            .and_then(|gross| gross.checked_mul(direction.sign()))
            .and_then(|gross| gross.checked_sub(fees))
            .ok_or_else(out_of_range)?,
        (None, None) => Decimal::ZERO,
    };
    let pnl = within(pnl, amount_limit())?;

    let cost = input
        .entry_price
        .checked_mul(input.quantity)
        .ok_or_else(out_of_range)?;
    let pnl_percent = if cost.is_zero() {
        Decimal::ZERO
    } else {
        pnl.checked_div(cost)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .ok_or_else(out_of_range)?
            .round_dp(4)
    };
    let pnl_percent = within(pnl_percent, ratio_limit())?;

    let risk_per_unit = input
        .stop_loss
        .map(|stop| (input.entry_price - stop).abs())
        .filter(|r| !r.is_zero());
    let risk_amount = match risk_per_unit {
        Some(risk) => {
            let amount = risk.checked_mul(input.quantity).ok_or_else(out_of_range)?;
            Some(within(amount, amount_limit())?)
        }
        None => None,
    };
    let risk_reward = match (risk_per_unit, input.take_profit) {
        (Some(risk), Some(tp)) => {
            let ratio = (tp - input.entry_price)
                .abs()
                .checked_div(risk)
                .ok_or_else(out_of_range)?
                .round_dp(4);
            Some(within(ratio, ratio_limit())?)
        }
        _ => None,
    };
    let r_multiple = match risk_amount {
        Some(risk) if status == "closed" => {
            let ratio = pnl.checked_div(risk).ok_or_else(out_of_range)?.round_dp(4);
            Some(within(ratio, ratio_limit())?)
        }
        _ => None,
    };

    Ok(TradeMetrics {
        direction,
        status,
        pnl,
        pnl_percent,
        risk_amount,
        risk_reward,
        r_multiple,
    })
}

fn apply_input(active: &mut trades::ActiveModel, input: TradeInput, metrics: &TradeMetrics) {
    let exit_date = match (input.exit_date, metrics.status) {
        (Some(date), _) => Some(date),
        (None, "closed") => Some(Utc::now()),
        _ => None,
    };

    active.symbol = ActiveValue::Set(input.symbol.trim().to_uppercase());
    active.direction = ActiveValue::Set(metrics.direction.as_str().to_string());
    active.status = ActiveValue::Set(metrics.status.to_string());
    active.entry_price = ActiveValue::Set(input.entry_price);
    active.exit_price = ActiveValue::Set(input.exit_price);
    active.quantity = ActiveValue::Set(input.quantity);
    active.fees = ActiveValue::Set(input.fees.unwrap_or(Decimal::ZERO));
    active.pnl = ActiveValue::Set(metrics.pnl);
    active.pnl_percent = ActiveValue::Set(metrics.pnl_percent);
    active.stop_loss = ActiveValue::Set(input.stop_loss);
    active.take_profit = ActiveValue::Set(input.take_profit);
    active.risk_amount = ActiveValue::Set(metrics.risk_amount);
    active.risk_reward = ActiveValue::Set(metrics.risk_reward);
    active.r_multiple = ActiveValue::Set(metrics.r_multiple);
    active.tags = ActiveValue::Set(StringList::normalized(&input.tags));
    active.setup = ActiveValue::Set(input.setup);
    active.notes = ActiveValue::Set(input.notes);
    active.screenshot_url = ActiveValue::Set(input.screenshot_url);
    active.entry_date = ActiveValue::Set(input.entry_date.unwrap_or_else(Utc::now));
    active.exit_date = ActiveValue::Set(exit_date);
    active.portfolio_id = ActiveValue::Set(input.portfolio_id);
    active.strategy_id = ActiveValue::Set(input.strategy_id);
    active.updated_at = ActiveValue::Set(Some(Utc::now()));
}

/// Linked portfolio and strategy must belong to the caller too.
async fn check_links(db: &DatabaseConnection, user_id: i64, input: &TradeInput) -> AppResult<()> {
    if let Some(portfolio_id) = input.portfolio_id {
        portfolio_service::get_portfolio(db, user_id, portfolio_id).await?;
    }
    if let Some(strategy_id) = input.strategy_id {
        strategy_service::get_strategy(db, user_id, strategy_id).await?;
    }
    Ok(())
}

pub async fn get_trade(db: &DatabaseConnection, user_id: i64, id: u64) -> AppResult<trades::Model> {
    let trade = trades::Entity::find_by_id(id).one(db).await?;
    owned_by(trade, user_id, |t| t.user_id, "trade")
}

pub async fn list_trades(
    db: &DatabaseConnection,
    user_id: i64,
    query: TradeQuery,
) -> AppResult<Page<trades::Model>> {
    let mut select = trades::Entity::find().filter(trades::Column::UserId.eq(user_id));

    if let Some(symbol) = query.symbol.filter(|s| !s.trim().is_empty()) {
        select = select.filter(trades::Column::Symbol.eq(symbol.trim().to_uppercase()));
    }
    if let Some(direction) = query.direction.as_deref().and_then(Direction::parse) {
        select = select.filter(trades::Column::Direction.eq(direction.as_str()));
    }
    if let Some(status) = query.status.filter(|s| s == "open" || s == "closed") {
        select = select.filter(trades::Column::Status.eq(status));
    }
    if let Some(portfolio_id) = query.portfolio_id {
        select = select.filter(trades::Column::PortfolioId.eq(portfolio_id));
    }
    if let Some(strategy_id) = query.strategy_id {
        select = select.filter(trades::Column::StrategyId.eq(strategy_id));
    }
    if let Some(tag) = query.tag.map(|t| t.trim().to_lowercase()).filter(|t| !t.is_empty()) {
        let needle = serde_json::Value::String(tag).to_string();
        select = select.filter(Expr::cust_with_values("JSON_CONTAINS(tags, ?)", [needle]));
    }
    if let Some(from) = query.from {
        select = select.filter(trades::Column::EntryDate.gte(from));
    }
    if let Some(to) = query.to {
        select = select.filter(trades::Column::EntryDate.lte(to));
    }

    let (page, limit) = PageQuery {
        page: query.page,
        limit: query.limit,
    }
    .resolve();
    let paginator = select
        .order_by_desc(trades::Column::EntryDate)
        .order_by_desc(trades::Column::Id)
        .paginate(db, limit);
    let total = paginator.num_items().await?;
    let items = paginator.fetch_page(page - 1).await?;

    Ok(Page::new(items, total, page, limit))
}

pub async fn create_trade(
    db: &DatabaseConnection,
    user_id: i64,
    input: TradeInput,
) -> AppResult<trades::Model> {
    let direction = validate(&input)?;
    check_links(db, user_id, &input).await?;
    let metrics = compute_metrics(&input, direction)?;

    let mut active = trades::ActiveModel {
        user_id: ActiveValue::Set(user_id),
        created_at: ActiveValue::Set(Some(Utc::now())),
        ..Default::default()
    };
    apply_input(&mut active, input, &metrics);
    let trade = active.insert(db).await?;

    if let Some(portfolio_id) = trade.portfolio_id {
        portfolio_service::apply_pnl(db, portfolio_id, trade.pnl).await?;
    }
    Ok(trade)
}

pub async fn update_trade(
    db: &DatabaseConnection,
    user_id: i64,
    id: u64,
    input: TradeInput,
) -> AppResult<trades::Model> {
    let direction = validate(&input)?;
    let existing = get_trade(db, user_id, id).await?;
    check_links(db, user_id, &input).await?;
    let metrics = compute_metrics(&input, direction)?;

    let old_portfolio = existing.portfolio_id;
    let old_pnl = existing.pnl;
    let mut active: trades::ActiveModel = existing.into();
    apply_input(&mut active, input, &metrics);
    let trade = active.update(db).await?;

    // move the booked P&L between portfolios when the link or result changed
    if old_portfolio != trade.portfolio_id || old_pnl != trade.pnl {
        if let Some(portfolio_id) = old_portfolio {
            portfolio_service::apply_pnl(db, portfolio_id, -old_pnl).await?;
        }
        if let Some(portfolio_id) = trade.portfolio_id {
            portfolio_service::apply_pnl(db, portfolio_id, trade.pnl).await?;
        }
    }
    Ok(trade)
}

pub async fn delete_trade(db: &DatabaseConnection, user_id: i64, id: u64) -> AppResult<()> {
    let trade = get_trade(db, user_id, id).await?;
    let portfolio_id = trade.portfolio_id;
    let pnl = trade.pnl;
    trade.delete(db).await?;

    if let Some(portfolio_id) = portfolio_id {
        portfolio_service::apply_pnl(db, portfolio_id, -pnl).await?;
    }
    Ok(())
}

/// Most recent trades first, for summaries and AI prompts.
pub async fn recent_trades(
    db: &DatabaseConnection,
    user_id: i64,
    symbol: Option<&str>,
    limit: u64,
) -> AppResult<Vec<trades::Model>> {
    let mut select = trades::Entity::find().filter(trades::Column::UserId.eq(user_id));
    if let Some(symbol) = symbol {
        select = select.filter(trades::Column::Symbol.eq(symbol.trim().to_uppercase()));
    }
    let list = select
        .order_by_desc(trades::Column::EntryDate)
        .paginate(db, limit)
        .fetch_page(0)
        .await?;
    Ok(list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(v: &str) -> Decimal {
        Decimal::from_str(v).unwrap()
    }

    fn input() -> TradeInput {
        TradeInput {
            symbol: " aapl ".to_string(),
            direction: "long".to_string(),
            entry_price: d("100"),
            quantity: d("10"),
            ..Default::default()
        }
    }

    #[test]
    fn long_trade_with_exit_is_closed() {
        let mut t = input();
        t.exit_price = Some(d("110"));
        t.fees = Some(d("2"));
        t.stop_loss = Some(d("95"));
        t.take_profit = Some(d("115"));
        let dir = validate(&t).unwrap();
        let m = compute_metrics(&t, dir).unwrap();
        assert_eq!(m.status, "closed");
        assert_eq!(m.pnl, d("98"));
        assert_eq!(m.pnl_percent, d("9.8"));
        assert_eq!(m.risk_amount, Some(d("50")));
        assert_eq!(m.risk_reward, Some(d("3")));
        assert_eq!(m.r_multiple, Some(d("1.96")));
    }

    #[test]
    fn short_trade_profits_when_price_falls() {
        let mut t = input();
        t.direction = "sell".to_string();
        t.exit_price = Some(d("90"));
        let m = compute_metrics(&t, validate(&t).unwrap()).unwrap();
        assert_eq!(m.direction, Direction::Short);
        assert_eq!(m.pnl, d("100"));
    }

    #[test]
    fn open_trade_has_no_realized_result() {
        let t = input();
        let m = compute_metrics(&t, validate(&t).unwrap()).unwrap();
        assert_eq!(m.status, "open");
        assert_eq!(m.pnl, Decimal::ZERO);
        assert_eq!(m.r_multiple, None);
    }

    #[test]
    fn manual_pnl_wins_over_computed() {
        let mut t = input();
        t.exit_price = Some(d("110"));
        t.pnl = Some(d("-5"));
        let m = compute_metrics(&t, validate(&t).unwrap()).unwrap();
        assert_eq!(m.pnl, d("-5"));
    }

    #[test]
    fn validation_rejects_bad_payloads() {
        let mut t = input();
        t.symbol = "  ".to_string();
        assert!(matches!(validate(&t), Err(AppError::Validation(_))));

        let mut t = input();
        t.direction = "sideways".to_string();
        assert!(matches!(validate(&t), Err(AppError::Validation(_))));

        let mut t = input();
        t.quantity = Decimal::ZERO;
        assert!(matches!(validate(&t), Err(AppError::Validation(_))));

        let mut t = input();
        t.status = Some("pending".to_string());
        assert!(matches!(validate(&t), Err(AppError::Validation(_))));
    }

    #[test]
    fn oversized_figures_are_rejected_not_panicking() {
        let mut t = input();
        t.entry_price = d("100000000000000000");
        t.quantity = d("100000000000000000");
        t.exit_price = Some(d("200000000000000000"));
        assert!(matches!(validate(&t), Err(AppError::Validation(_))));
        assert!(matches!(compute_metrics(&t, Direction::Long), Err(AppError::Validation(_))));

        // every input fits its column but the P&L does not
        let mut t = input();
        t.entry_price = d("1");
        t.quantity = d("999999999999");
        t.exit_price = Some(d("999999999999"));
        let dir = validate(&t).unwrap();
        assert!(matches!(compute_metrics(&t, dir), Err(AppError::Validation(_))));
    }

    #[test]
    fn ratio_outside_column_range_is_rejected() {
        let mut t = input();
        t.stop_loss = Some(d("99.99999999"));
        t.take_profit = Some(d("200"));
        let dir = validate(&t).unwrap();
        assert!(matches!(compute_metrics(&t, dir), Err(AppError::Validation(_))));
    }
}
