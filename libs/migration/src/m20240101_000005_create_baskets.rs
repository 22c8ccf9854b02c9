use crate::common::{add_touch_trigger, drop_touch_trigger, pk_bigint, with_stamps};
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                with_stamps(
                    Table::create()
                        .table(Baskets::Table)
                        .if_not_exists()
                        .col(pk_bigint(Baskets::Id))
                        .col(big_integer_null(Baskets::UserId))
                        .col(string_len(Baskets::Currency, 3))
                        .col(json_binary(Baskets::Lines).default("[]"))
                        .col(big_integer_null(Baskets::MergedId)),
                )
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_baskets_merged_id")
                        .from(Baskets::Table, Baskets::MergedId)
                        .to(Baskets::Table, Baskets::Id)
                        .on_delete(ForeignKeyAction::SetNull),
                )
                .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_baskets_user_id")
                    .table(Baskets::Table)
                    .col(Baskets::UserId)
                    .to_owned(),
            )
            .await?;

        add_touch_trigger(manager, "baskets").await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_touch_trigger(manager, "baskets").await?;

        manager
            .drop_table(Table::drop().table(Baskets::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Baskets {
    Table,
    Id,
    UserId,
    Currency,
    Lines,
    MergedId,
}
