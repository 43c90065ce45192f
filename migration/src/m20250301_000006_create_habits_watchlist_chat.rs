use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Habits::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Habits::Id).big_unsigned().auto_increment().primary_key())
                    .col(ColumnDef::new(Habits::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Habits::Name).string().not_null())
                    .col(ColumnDef::new(Habits::Description).text().null())
                    .col(ColumnDef::new(Habits::TargetPerDay).unsigned().not_null().default(1))
                    .col(ColumnDef::new(Habits::Color).string_len(16).null())
                    .col(ColumnDef::new(Habits::Completions).json().not_null()) // [{date, count, note}]
                    .col(ColumnDef::new(Habits::CurrentStreak).unsigned().not_null().default(0))
                    .col(ColumnDef::new(Habits::LongestStreak).unsigned().not_null().default(0))
                    .col(ColumnDef::new(Habits::CreatedAt).timestamp().default(Expr::cust("CURRENT_TIMESTAMP")))
                    .col(ColumnDef::new(Habits::UpdatedAt).timestamp().default(Expr::cust("CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP")))
                    .index(
                        Index::create()
                            .name("idx_habits_user")
                            .table(Habits::Table)
                            .col(Habits::UserId)
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_habits_user")
                            .from(Habits::Table, Habits::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Watchlist::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Watchlist::Id).big_unsigned().auto_increment().primary_key())
                    .col(ColumnDef::new(Watchlist::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Watchlist::Symbol).string_len(32).not_null())
                    .col(ColumnDef::new(Watchlist::TargetPrice).decimal_len(20, 8).null())
                    .col(ColumnDef::new(Watchlist::Notes).text().null())
                    .col(ColumnDef::new(Watchlist::CreatedAt).timestamp().default(Expr::cust("CURRENT_TIMESTAMP")))
                    .index(
                        Index::create()
                            .name("uq_watchlist_user_symbol")
                            .table(Watchlist::Table)
                            .col(Watchlist::UserId)
                            .col(Watchlist::Symbol)
                            .unique()
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_watchlist_user")
                            .from(Watchlist::Table, Watchlist::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ChatMessages::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ChatMessages::Id).big_unsigned().auto_increment().primary_key())
                    .col(ColumnDef::new(ChatMessages::UserId).big_integer().not_null())
                    .col(ColumnDef::new(ChatMessages::Content).text().not_null())
                    .col(ColumnDef::new(ChatMessages::CreatedAt).timestamp().default(Expr::cust("CURRENT_TIMESTAMP")))
                    .index(
                        Index::create()
                            .name("idx_chat_messages_created_at")
                            .table(ChatMessages::Table)
                            .col(ChatMessages::CreatedAt)
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_chat_messages_user")
                            .from(ChatMessages::Table, ChatMessages::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ChatMessages::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Watchlist::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Habits::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Habits {
    Table,
    Id,
    UserId,
    Name,
    Description,
    TargetPerDay,
    Color,
    Completions,
    CurrentStreak,
    LongestStreak,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Watchlist {
    Table,
    Id,
    UserId,
    Symbol,
    TargetPrice,
    Notes,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ChatMessages {
    Table,
    Id,
    UserId,
    Content,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
