use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Trades::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Trades::Id).big_unsigned().auto_increment().primary_key())
                    .col(ColumnDef::new(Trades::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Trades::PortfolioId).big_unsigned().null())
                    .col(ColumnDef::new(Trades::StrategyId).big_unsigned().null())
                    .col(ColumnDef::new(Trades::Symbol).string().not_null())
                    .col(ColumnDef::new(Trades::Direction).string_len(8).not_null()) // "long" or "short"
                    .col(ColumnDef::new(Trades::Status).string_len(8).not_null().default("open"))
                    .col(ColumnDef::new(Trades::EntryPrice).decimal_len(20, 8).not_null())
                    .col(ColumnDef::new(Trades::ExitPrice).decimal_len(20, 8).null())
                    .col(ColumnDef::new(Trades::Quantity).decimal_len(20, 8).not_null())
                    .col(ColumnDef::new(Trades::Fees).decimal_len(20, 8).not_null().default(0.0))
                    .col(ColumnDef::new(Trades::Pnl).decimal_len(20, 8).not_null().default(0.0)) // Realized P&L
                    .col(ColumnDef::new(Trades::PnlPercent).decimal_len(10, 4).not_null().default(0.0))
                    .col(ColumnDef::new(Trades::StopLoss).decimal_len(20, 8).null())
                    .col(ColumnDef::new(Trades::TakeProfit).decimal_len(20, 8).null())
                    .col(ColumnDef::new(Trades::RiskAmount).decimal_len(20, 8).null())
                    .col(ColumnDef::new(Trades::RiskReward).decimal_len(10, 4).null())
                    .col(ColumnDef::new(Trades::RMultiple).decimal_len(10, 4).null())
                    .col(ColumnDef::new(Trades::Tags).json().not_null())
                    .col(ColumnDef::new(Trades::Setup).text().null())
                    .col(ColumnDef::new(Trades::Notes).text().null())
                    .col(ColumnDef::new(Trades::ScreenshotUrl).text().null())
                    .col(ColumnDef::new(Trades::EntryDate).timestamp().not_null())
                    .col(ColumnDef::new(Trades::ExitDate).timestamp().null())
                    .col(ColumnDef::new(Trades::CreatedAt).timestamp().default(Expr::cust("CURRENT_TIMESTAMP")))
                    .col(ColumnDef::new(Trades::UpdatedAt).timestamp().default(Expr::cust("CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP")))
                    .index(
                        Index::create()
                            .name("idx_trades_user_entry_date")
                            .table(Trades::Table)
                            .col(Trades::UserId)
                            .col(Trades::EntryDate)
                    )
                    .index(
                        Index::create()
                            .name("idx_trades_user_symbol")
                            .table(Trades::Table)
                            .col(Trades::UserId)
                            .col(Trades::Symbol)
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_trades_user")
                            .from(Trades::Table, Trades::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_trades_portfolio")
                            .from(Trades::Table, Trades::PortfolioId)
                            .to(Portfolios::Table, Portfolios::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_trades_strategy")
                            .from(Trades::Table, Trades::StrategyId)
                            .to(Strategies::Table, Strategies::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Trades::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Trades {
    Table,
    Id,
    UserId,
    PortfolioId,
    StrategyId,
    Symbol,
    Direction,
    Status,
    EntryPrice,
    ExitPrice,
    Quantity,
    Fees,
    Pnl,
    PnlPercent,
    StopLoss,
    TakeProfit,
    RiskAmount,
    RiskReward,
    RMultiple,
    Tags,
    Setup,
    Notes,
    ScreenshotUrl,
    EntryDate,
    ExitDate,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Portfolios {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Strategies {
    Table,
    Id,
}
