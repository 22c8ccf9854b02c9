use crate::common::{add_touch_trigger, create_live_index, drop_touch_trigger, pk_bigint, with_stamps};
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
                        .table(Categories::Table)
                        .if_not_exists()
                        .col(pk_bigint(Categories::Id))
                        .col(json_binary(Categories::Name))
                        .col(string(Categories::Slug))
                        .col(big_integer_null(Categories::ParentId))
                        .col(integer(Categories::Position).default(0))
                        .col(string(Categories::Channel)),
                )
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_categories_parent_id")
                        .from(Categories::Table, Categories::ParentId)
                        .to(Categories::Table, Categories::Id)
                        .on_delete(ForeignKeyAction::Restrict),
                )
                .to_owned(),
            )
            .await?;

        // sibling lookups: (channel, parent) ordered by position
        manager
            .create_index(
                Index::create()
                    .name("idx_categories_channel_parent_position")
                    .table(Categories::Table)
                    .col(Categories::Channel)
                    .col(Categories::ParentId)
                    .col(Categories::Position)
                    .to_owned(),
            )
            .await?;

        create_live_index(
            manager,
            "uq_categories_channel_slug",
            "categories",
            "channel, slug",
            true,
        )
        .await?;

        add_touch_trigger(manager, "categories").await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_touch_trigger(manager, "categories").await?;

        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Categories {
    Table,
    Id,
    Name,
    Slug,
    ParentId,
    Position,
    Channel,
}
