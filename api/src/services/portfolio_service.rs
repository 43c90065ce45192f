//! Portfolio balance bookkeeping.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait,
    ModelTrait, PaginatorTrait, QueryFilter, QueryOrder,
};
use serde::Deserialize;
use shared::entity::portfolios;

use crate::error::{owned_by, AppError, AppResult};

#[derive(Debug, Clone, Deserialize)]
pub struct PortfolioInput {
    pub name: String,
    pub description: Option<String>,
    pub currency: Option<String>,
    pub initial_balance: Option<Decimal>,
    pub goal: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AmountInput {
    pub amount: Decimal,
}

fn validate(input: &PortfolioInput) -> AppResult<()> {
    if input.name.trim().is_empty() {
        return Err(AppError::validation("Portfolio name is required"));
    }
    if input.initial_balance.is_some_and(|b| b.is_sign_negative()) {
        return Err(AppError::validation("Initial balance cannot be negative"));
    }
    if input.goal.is_some_and(|g| g <= Decimal::ZERO) {
        return Err(AppError::validation("Goal must be positive"));
    }
    Ok(())
}

fn normalize_currency(currency: Option<String>) -> String {
    currency
        .map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| "USD".to_string())
}

async fn ensure_name_free(
    db: &DatabaseConnection,
    user_id: i64,
    name: &str,
    except_id: Option<u64>,
) -> AppResult<()> {
    let mut query = portfolios::Entity::find()
        .filter(portfolios::Column::UserId.eq(user_id))
        .filter(portfolios::Column::Name.eq(name));
    if let Some(id) = except_id {
        query = query.filter(portfolios::Column::Id.ne(id));
    }
    if query.count(db).await? > 0 {
        return Err(AppError::Conflict(format!(
            "A portfolio named '{}' already exists",
            name
        )));
    }
    Ok(())
}

pub async fn list_portfolios(db: &DatabaseConnection, user_id: i64) -> AppResult<Vec<portfolios::Model>> {
    let list = portfolios::Entity::find()
        .filter(portfolios::Column::UserId.eq(user_id))
        .order_by_asc(portfolios::Column::Name)
        .all(db)
        .await?;
    Ok(list)
}

pub async fn get_portfolio(db: &DatabaseConnection, user_id: i64, id: u64) -> AppResult<portfolios::Model> {
    let portfolio = portfolios::Entity::find_by_id(id).one(db).await?;
    owned_by(portfolio, user_id, |p| p.user_id, "portfolio")
}

pub async fn create_portfolio(
    db: &DatabaseConnection,
    user_id: i64,
    input: PortfolioInput,
) -> AppResult<portfolios::Model> {
    validate(&input)?;
    let name = input.name.trim().to_string();
    ensure_name_free(db, user_id, &name, None).await?;

    let initial = input.initial_balance.unwrap_or(Decimal::ZERO);
    let now = Utc::now();
    let portfolio = portfolios::ActiveModel {
        user_id: ActiveValue::Set(user_id),
        name: ActiveValue::Set(name),
        description: ActiveValue::Set(input.description),
        currency: ActiveValue::Set(normalize_currency(input.currency)),
        initial_balance: ActiveValue::Set(initial),
        current_balance: ActiveValue::Set(initial),
        total_deposits: ActiveValue::Set(Decimal::ZERO),
        total_withdrawals: ActiveValue::Set(Decimal::ZERO),
        goal: ActiveValue::Set(input.goal),
        created_at: ActiveValue::Set(Some(now)),
        updated_at: ActiveValue::Set(Some(now)),
        ..Default::default()
    };
    Ok(portfolio.insert(db).await?)
}

/// Renames / re-describes a portfolio. Changing the initial balance shifts the
/// current balance by the same difference.
pub async fn update_portfolio(
    db: &DatabaseConnection,
    user_id: i64,
    id: u64,
    input: PortfolioInput,
) -> AppResult<portfolios::Model> {
    validate(&input)?;
    let portfolio = get_portfolio(db, user_id, id).await?;
    let name = input.name.trim().to_string();
    if name != portfolio.name {
        ensure_name_free(db, user_id, &name, Some(id)).await?;
    }

    let old_initial = portfolio.initial_balance;
    let old_current = portfolio.current_balance;
    let mut update: portfolios::ActiveModel = portfolio.into();
    update.name = ActiveValue::Set(name);
    update.description = ActiveValue::Set(input.description);
    update.currency = ActiveValue::Set(normalize_currency(input.currency));
    if let Some(initial) = input.initial_balance {
        update.initial_balance = ActiveValue::Set(initial);
        update.current_balance = ActiveValue::Set(old_current + (initial - old_initial));
    }
    update.goal = ActiveValue::Set(input.goal);
    update.updated_at = ActiveValue::Set(Some(Utc::now()));
    Ok(update.update(db).await?)
}

pub async fn delete_portfolio(db: &DatabaseConnection, user_id: i64, id: u64) -> AppResult<()> {
    let portfolio = get_portfolio(db, user_id, id).await?;
    portfolio.delete(db).await?;
    Ok(())
}

pub async fn deposit(
    db: &DatabaseConnection,
    user_id: i64,
    id: u64,
    amount: Decimal,
) -> AppResult<portfolios::Model> {
    if amount <= Decimal::ZERO {
        return Err(AppError::validation("Deposit amount must be positive"));
    }
    let portfolio = get_portfolio(db, user_id, id).await?;

    let current = portfolio.current_balance;
    let deposits = portfolio.total_deposits;
    let mut update: portfolios::ActiveModel = portfolio.into();
    update.current_balance = ActiveValue::Set(current + amount);
    update.total_deposits = ActiveValue::Set(deposits + amount);
    update.updated_at = ActiveValue::Set(Some(Utc::now()));
    Ok(update.update(db).await?)
}

pub async fn withdraw(
    db: &DatabaseConnection,
    user_id: i64,
    id: u64,
    amount: Decimal,
) -> AppResult<portfolios::Model> {
    if amount <= Decimal::ZERO {
        return Err(AppError::validation("Withdrawal amount must be positive"));
    }
    let portfolio = get_portfolio(db, user_id, id).await?;
    if amount > portfolio.current_balance {
        return Err(AppError::validation("Withdrawal exceeds the current balance"));
    }

    let current = portfolio.current_balance;
    let withdrawals = portfolio.total_withdrawals;
    let mut update: portfolios::ActiveModel = portfolio.into();
    update.current_balance = ActiveValue::Set(current - amount);
    update.total_withdrawals = ActiveValue::Set(withdrawals + amount);
    update.updated_at = ActiveValue::Set(Some(Utc::now()));
    Ok(update.update(db).await?)
}

/// Adds realized P&L to a portfolio in a single UPDATE statement.
pub async fn apply_pnl(db: &DatabaseConnection, portfolio_id: u64, delta: Decimal) -> AppResult<()> {
    if delta.is_zero() {
        return Ok(());
    }
    portfolios::Entity::update_many()
        .col_expr(
            portfolios::Column::CurrentBalance,
            Expr::col(portfolios::Column::CurrentBalance).add(delta),
        )
        .filter(portfolios::Column::Id.eq(portfolio_id))
        .exec(db)
        .await?;
    Ok(())
}
