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
                        .table(AssetSources::Table)
                        .if_not_exists()
                        .col(pk_bigint(AssetSources::Id))
                        .col(string(AssetSources::Name))
                        .col(string(AssetSources::Handle))
                        .col(string(AssetSources::Disk))
                        .col(boolean(AssetSources::Default).default(false))
                        .col(string_null(AssetSources::Bucket))
                        .col(string_null(AssetSources::Path))
                        .col(timestamp_with_time_zone_null(AssetSources::DisabledAt)),
                )
                .to_owned(),
            )
            .await?;

        create_live_index(
            manager,
            "uq_asset_sources_handle",
            "asset_sources",
            "handle",
            true,
        )
        .await?;

        // at most one default per disk
        manager
            .get_connection()
            .execute_unprepared(
                r#"CREATE UNIQUE INDEX IF NOT EXISTS uq_asset_sources_default_disk ON asset_sources (disk) WHERE "default" AND deleted_at IS NULL"#,
            )
            .await?;

        add_touch_trigger(manager, "asset_sources").await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_touch_trigger(manager, "asset_sources").await?;

        manager
            .drop_table(Table::drop().table(AssetSources::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum AssetSources {
    Table,
    Id,
    Name,
    Handle,
    Disk,
    Default,
    Bucket,
    Path,
    DisabledAt,
}
