use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder,
};
use serde::Deserialize;
use shared::entity::watchlist;

use crate::error::{owned_by, AppError, AppResult};

#[derive(Debug, Clone, Deserialize)]
pub struct WatchlistInput {
    pub symbol: String,
    pub target_price: Option<Decimal>,
    pub notes: Option<String>,
}

fn normalize_symbol(symbol: &str) -> AppResult<String> {
    let symbol = symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(AppError::validation("Symbol is required"));
    }
    if symbol.len() > 32 {
        return Err(AppError::validation("Symbol must be at most 32 characters"));
    }
    Ok(symbol)
}

pub async fn list_watchlist(db: &DatabaseConnection, user_id: i64) -> AppResult<Vec<watchlist::Model>> {
    let list = watchlist::Entity::find()
        .filter(watchlist::Column::UserId.eq(user_id))
        .order_by_asc(watchlist::Column::Symbol)
        .all(db)
        .await?;
    Ok(list)
}

pub async fn add_symbol(
    db: &DatabaseConnection,
    user_id: i64,
    input: WatchlistInput,
) -> AppResult<watchlist::Model> {
    let symbol = normalize_symbol(&input.symbol)?;
    if input.target_price.is_some_and(|p| p <= Decimal::ZERO) {
        return Err(AppError::validation("Target price must be positive"));
    }

    let existing = watchlist::Entity::find()
        .filter(watchlist::Column::UserId.eq(user_id))
        .filter(watchlist::Column::Symbol.eq(symbol.as_str()))
        .count(db)
        .await?;
    if existing > 0 {
        return Err(AppError::Conflict(format!("{} is already on your watchlist", symbol)));
    }

    let entry = watchlist::ActiveModel {
        user_id: ActiveValue::Set(user_id),
        symbol: ActiveValue::Set(symbol),
        target_price: ActiveValue::Set(input.target_price),
        notes: ActiveValue::Set(input.notes.filter(|n| !n.trim().is_empty())),
        created_at: ActiveValue::Set(Some(Utc::now())),
        ..Default::default()
    };
    Ok(entry.insert(db).await?)
}

pub async fn remove_symbol(db: &DatabaseConnection, user_id: i64, id: u64) -> AppResult<()> {
    let entry = watchlist::Entity::find_by_id(id).one(db).await?;
    let entry = owned_by(entry, user_id, |w| w.user_id, "watchlist entry")?;
    entry.delete(db).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_are_upper_cased() {
        assert_eq!(normalize_symbol(" btcusdt ").unwrap(), "BTCUSDT");
        assert!(matches!(normalize_symbol("  "), Err(AppError::Validation(_))));
    }
}
