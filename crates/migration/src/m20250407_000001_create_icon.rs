//! Create `icon` table.
//!
//! `htmlCode` carries the storage-level uniqueness constraint; `name` is only
//! checked for duplicates by the service before insert.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Icon::Table)
                    .if_not_exists()
                    .col(integer(Icon::Id).primary_key().auto_increment())
                    .col(
                        // VARCHAR, not CHAR: Postgres pads bpchar values on read
                        ColumnDef::new(Icon::HtmlCode)
                            .string_len(6)
                            .not_null()
                            .unique_key(),
                    )
                    .col(text(Icon::Name).not_null())
                    .col(
                        timestamp_with_time_zone(Icon::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Icon::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Icon::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Icon::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Icon {
    Table,
    Id,
    #[sea_orm(iden = "htmlCode")]
    HtmlCode,
    Name,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}
