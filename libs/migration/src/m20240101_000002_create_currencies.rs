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
                        .table(Currencies::Table)
                        .if_not_exists()
                        .col(pk_bigint(Currencies::Id))
                        .col(string_len(Currencies::Code, 3))
                        .col(string(Currencies::Name))
                        .col(boolean(Currencies::Enabled).default(true))
                        .col(decimal_len(Currencies::ExchangeRate, 10, 4))
                        .col(string(Currencies::Format))
                        .col(string_len(Currencies::DecimalPoint, 4).default("."))
                        .col(string_len(Currencies::ThousandPoint, 4).default(","))
                        .col(boolean(Currencies::Default).default(false)),
                )
                .to_owned(),
            )
            .await?;

        create_live_index(manager, "uq_currencies_code", "currencies", "code", true).await?;

        // at most one default currency
        manager
            .get_connection()
            .execute_unprepared(
                r#"CREATE UNIQUE INDEX IF NOT EXISTS uq_currencies_default ON currencies ("default") WHERE "default" AND deleted_at IS NULL"#,
            )
            .await?;

        add_touch_trigger(manager, "currencies").await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_touch_trigger(manager, "currencies").await?;

        manager
            .drop_table(Table::drop().table(Currencies::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Currencies {
    Table,
    Id,
    Code,
    Name,
    Enabled,
    ExchangeRate,
    Format,
    DecimalPoint,
    ThousandPoint,
    Default,
}
