use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Insertion order is the listing order
        manager
            .get_connection()
            .execute_unprepared(
                r#"
            INSERT INTO currencies (
                code, name, enabled, exchange_rate, format, decimal_point, thousand_point, "default"
            )
            VALUES
                ('GBP', 'British Pound', true, 10, '&#xa3;{price}', '.', ',', true),
                ('EUR', 'Euro', true, 8.7260, '&euro;{price}', '.', ',', false),
                ('USD', 'US Dollars', true, 7.1, '&euro;{price}', '.', ',', false)
            ON CONFLICT DO NOTHING
            "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DELETE FROM currencies WHERE code IN ('GBP', 'EUR', 'USD')")
            .await?;

        Ok(())
    }
}
