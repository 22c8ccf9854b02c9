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
                        .table(SavedBaskets::Table)
                        .if_not_exists()
                        .col(pk_bigint(SavedBaskets::Id))
                        .col(big_integer(SavedBaskets::BasketId))
                        .col(string(SavedBaskets::Name))
                        .col(big_integer(SavedBaskets::UserId)),
                )
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_saved_baskets_basket_id")
                        .from(SavedBaskets::Table, SavedBaskets::BasketId)
                        .to(Baskets::Table, Baskets::Id)
                        .on_delete(ForeignKeyAction::Cascade),
                )
                .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_saved_baskets_user_id")
                    .table(SavedBaskets::Table)
                    .col(SavedBaskets::UserId)
                    .to_owned(),
            )
            .await?;

        add_touch_trigger(manager, "saved_baskets").await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_touch_trigger(manager, "saved_baskets").await?;

        manager
            .drop_table(Table::drop().table(SavedBaskets::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum SavedBaskets {
    Table,
    Id,
    BasketId,
    Name,
    UserId,
}

#[derive(DeriveIden)]
enum Baskets {
    Table,
    Id,
}
