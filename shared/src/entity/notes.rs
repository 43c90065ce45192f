//! `SeaORM` Entity, @generated manually

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::StringList;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "notes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: u64,
    pub user_id: i64,
    #[sea_orm(column_type = "BigUnsigned", nullable)]
    pub trade_id: Option<u64>,
    pub title: String,
    pub kind: String, // "document" or "canvas"
    #[sea_orm(column_type = "Json")]
    pub blocks: Json, // array of rich content blocks
    #[sea_orm(column_type = "Json", nullable)]
    pub canvas: Option<Json>, // freeform canvas elements
    pub category: Option<String>,
    #[sea_orm(column_type = "Json")]
    pub tags: StringList,
    pub is_pinned: bool,
    pub is_archived: bool,
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
    #[sea_orm(
        belongs_to = "super::trades::Entity",
        from = "Column::TradeId",
        to = "super::trades::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Trades,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
