use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder,
};
use serde::{Deserialize, Serialize};
use shared::entity::{strategies, trades};
use shared::StringList;

use super::stats_service::PerformanceSummary;
use crate::error::{owned_by, AppError, AppResult};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StrategyInput {
    pub name: String,
    pub description: Option<String>,
    pub market_bias: Option<String>,
    pub setup_rules: Option<String>,
    pub entry_rules: Option<String>,
    pub exit_rules: Option<String>,
    pub risk_rules: Option<String>,
    pub timeframe: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub canvas: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StrategyDetail {
    #[serde(flatten)]
    pub strategy: strategies::Model,
    pub performance: PerformanceSummary,
}

fn validate(input: &StrategyInput) -> AppResult<()> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Strategy name is required"));
    }
    if name.chars().count() > 120 {
        return Err(AppError::validation("Strategy name must be at most 120 characters"));
    }
    Ok(())
}

fn apply_input(active: &mut strategies::ActiveModel, input: StrategyInput) {
    active.name = ActiveValue::Set(input.name.trim().to_string());
    active.description = ActiveValue::Set(input.description);
    active.market_bias = ActiveValue::Set(input.market_bias);
    active.setup_rules = ActiveValue::Set(input.setup_rules);
    active.entry_rules = ActiveValue::Set(input.entry_rules);
    active.exit_rules = ActiveValue::Set(input.exit_rules);
    active.risk_rules = ActiveValue::Set(input.risk_rules);
    active.timeframe = ActiveValue::Set(input.timeframe);
    active.tags = ActiveValue::Set(StringList::normalized(&input.tags));
    active.canvas = ActiveValue::Set(input.canvas);
    active.updated_at = ActiveValue::Set(Some(Utc::now()));
}

pub async fn list_strategies(db: &DatabaseConnection, user_id: i64) -> AppResult<Vec<strategies::Model>> {
    let list = strategies::Entity::find()
        .filter(strategies::Column::UserId.eq(user_id))
        .order_by_desc(strategies::Column::UpdatedAt)
        .all(db)
        .await?;
    Ok(list)
}

pub async fn get_strategy(db: &DatabaseConnection, user_id: i64, id: u64) -> AppResult<strategies::Model> {
    let strategy = strategies::Entity::find_by_id(id).one(db).await?;
    owned_by(strategy, user_id, |s| s.user_id, "strategy")
}

/// The strategy plus realized performance of the caller's trades linked to it.
pub async fn get_strategy_detail(
    db: &DatabaseConnection,
    user_id: i64,
    id: u64,
) -> AppResult<StrategyDetail> {
    let strategy = get_strategy(db, user_id, id).await?;
    let linked = trades::Entity::find()
        .filter(trades::Column::UserId.eq(user_id))
        .filter(trades::Column::StrategyId.eq(id))
        .all(db)
        .await?;
    Ok(StrategyDetail {
        strategy,
        performance: PerformanceSummary::from_trades(&linked),
    })
}

pub async fn create_strategy(
    db: &DatabaseConnection,
    user_id: i64,
    input: StrategyInput,
) -> AppResult<strategies::Model> {
    validate(&input)?;
    let mut active = strategies::ActiveModel {
        user_id: ActiveValue::Set(user_id),
        created_at: ActiveValue::Set(Some(Utc::now())),
        ..Default::default()
    };
    apply_input(&mut active, input);
    Ok(active.insert(db).await?)
}

pub async fn update_strategy(
    db: &DatabaseConnection,
    user_id: i64,
    id: u64,
    input: StrategyInput,
) -> AppResult<strategies::Model> {
    validate(&input)?;
    let strategy = get_strategy(db, user_id, id).await?;
    let mut active: strategies::ActiveModel = strategy.into();
    apply_input(&mut active, input);
    Ok(active.update(db).await?)
}

/// Linked trades keep their data; their reference is nulled by the foreign key.
pub async fn delete_strategy(db: &DatabaseConnection, user_id: i64, id: u64) -> AppResult<()> {
    let strategy = get_strategy(db, user_id, id).await?;
    strategy.delete(db).await?;
    Ok(())
}
