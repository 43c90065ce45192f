use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Notes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Notes::Id).big_unsigned().auto_increment().primary_key())
                    .col(ColumnDef::new(Notes::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Notes::TradeId).big_unsigned().null())
                    .col(ColumnDef::new(Notes::Title).string().not_null())
                    .col(ColumnDef::new(Notes::Kind).string_len(16).not_null().default("document"))
                    .col(ColumnDef::new(Notes::Blocks).json().not_null())
                    .col(ColumnDef::new(Notes::Canvas).json().null())
                    .col(ColumnDef::new(Notes::Category).string().null())
                    .col(ColumnDef::new(Notes::Tags).json().not_null())
                    .col(ColumnDef::new(Notes::IsPinned).boolean().not_null().default(false))
                    .col(ColumnDef::new(Notes::IsArchived).boolean().not_null().default(false))
                    .col(ColumnDef::new(Notes::CreatedAt).timestamp().default(Expr::cust("CURRENT_TIMESTAMP")))
                    .col(ColumnDef::new(Notes::UpdatedAt).timestamp().default(Expr::cust("CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP")))
                    .index(
                        Index::create()
                            .name("idx_notes_user_archived")
                            .table(Notes::Table)
                            .col(Notes::UserId)
                            .col(Notes::IsArchived)
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notes_user")
                            .from(Notes::Table, Notes::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notes_trade")
                            .from(Notes::Table, Notes::TradeId)
                            .to(Trades::Table, Trades::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Notes::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Notes {
    Table,
    Id,
    UserId,
    TradeId,
    Title,
    Kind,
    Blocks,
    Canvas,
    Category,
    Tags,
    IsPinned,
    IsArchived,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Trades {
    Table,
    Id,
}
