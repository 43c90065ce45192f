//! `SeaORM` Entity, @generated manually

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::StringList;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "strategies")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: u64,
    pub user_id: i64,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub market_bias: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub setup_rules: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub entry_rules: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub exit_rules: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub risk_rules: Option<String>,
    pub timeframe: Option<String>,
    #[sea_orm(column_type = "Json")]
    pub tags: StringList,
    #[sea_orm(column_type = "Json", nullable)]
    pub canvas: Option<Json>, // freeform annotations, stored as the client sends them
    pub created_at: Option<DateTimeUtc>,
    pub updated_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
    #[sea_orm(has_many = "super::trades::Entity")]
    Trades,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::trades::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Trades.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
