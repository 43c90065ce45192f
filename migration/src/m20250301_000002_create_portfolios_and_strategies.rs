use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Portfolios::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Portfolios::Id).big_unsigned().auto_increment().primary_key())
                    .col(ColumnDef::new(Portfolios::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Portfolios::Name).string().not_null())
                    .col(ColumnDef::new(Portfolios::Description).text().null())
                    .col(ColumnDef::new(Portfolios::Currency).string_len(8).not_null().default("USD"))
                    .col(ColumnDef::new(Portfolios::InitialBalance).decimal_len(20, 8).not_null().default(0.0))
                    .col(ColumnDef::new(Portfolios::CurrentBalance).decimal_len(20, 8).not_null().default(0.0))
                    .col(ColumnDef::new(Portfolios::TotalDeposits).decimal_len(20, 8).not_null().default(0.0))
                    .col(ColumnDef::new(Portfolios::TotalWithdrawals).decimal_len(20, 8).not_null().default(0.0))
                    .col(ColumnDef::new(Portfolios::Goal).decimal_len(20, 8).null())
                    .col(ColumnDef::new(Portfolios::CreatedAt).timestamp().default(Expr::cust("CURRENT_TIMESTAMP")))
                    .col(ColumnDef::new(Portfolios::UpdatedAt).timestamp().default(Expr::cust("CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP")))
                    .index(
                        Index::create()
                            .name("uq_portfolios_user_name")
                            .table(Portfolios::Table)
                            .col(Portfolios::UserId)
                            .col(Portfolios::Name)
                            .unique()
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_portfolios_user")
                            .from(Portfolios::Table, Portfolios::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Strategies::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Strategies::Id).big_unsigned().auto_increment().primary_key())
                    .col(ColumnDef::new(Strategies::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Strategies::Name).string().not_null())
                    .col(ColumnDef::new(Strategies::Description).text().null())
                    .col(ColumnDef::new(Strategies::MarketBias).text().null())
                    .col(ColumnDef::new(Strategies::SetupRules).text().null())
                    .col(ColumnDef::new(Strategies::EntryRules).text().null())
                    .col(ColumnDef::new(Strategies::ExitRules).text().null())
                    .col(ColumnDef::new(Strategies::RiskRules).text().null())
                    .col(ColumnDef::new(Strategies::Timeframe).string().null())
                    .col(ColumnDef::new(Strategies::Tags).json().not_null())
                    .col(ColumnDef::new(Strategies::Canvas).json().null())
                    .col(ColumnDef::new(Strategies::CreatedAt).timestamp().default(Expr::cust("CURRENT_TIMESTAMP")))
                    .col(ColumnDef::new(Strategies::UpdatedAt).timestamp().default(Expr::cust("CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP")))
                    .index(
                        Index::create()
                            .name("idx_strategies_user")
                            .table(Strategies::Table)
                            .col(Strategies::UserId)
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_strategies_user")
                            .from(Strategies::Table, Strategies::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Strategies::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Portfolios::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Portfolios {
    Table,
    Id,
    UserId,
    Name,
    Description,
    Currency,
    InitialBalance,
    CurrentBalance,
    TotalDeposits,
    TotalWithdrawals,
    Goal,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Strategies {
    Table,
    Id,
    UserId,
    Name,
    Description,
    MarketBias,
    SetupRules,
    EntryRules,
    ExitRules,
    RiskRules,
    Timeframe,
    Tags,
    Canvas,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
