use sea_orm_migration::{prelude::*, schema::*};

/// Columns shared by every catalog table
#[derive(DeriveIden)]
pub enum Stamp {
    CreatedBy,
    CreatedIp,
    UpdatedBy,
    UpdatedIp,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

/// `BIGSERIAL` primary key
pub fn pk_bigint<T: IntoIden>(name: T) -> ColumnDef {
    big_integer(name).auto_increment().primary_key().take()
}

/// Append creator/updater, timestamps and the soft delete marker
pub fn with_stamps(table: &mut TableCreateStatement) -> &mut TableCreateStatement {
    table
        .col(big_integer_null(Stamp::CreatedBy))
        .col(string_null(Stamp::CreatedIp))
        .col(big_integer_null(Stamp::UpdatedBy))
        .col(string_null(Stamp::UpdatedIp))
        .col(timestamp_with_time_zone(Stamp::CreatedAt).default(Expr::current_timestamp()))
        .col(timestamp_with_time_zone(Stamp::UpdatedAt).default(Expr::current_timestamp()))
        .col(timestamp_with_time_zone_null(Stamp::DeletedAt))
}

pub async fn add_touch_trigger(manager: &SchemaManager<'_>, table: &str) -> Result<(), DbErr> {
    manager
        .get_connection()
        .execute_unprepared(&format!(
            r#"
            CREATE TRIGGER {table}_touch_updated_at
                BEFORE UPDATE ON {table}
                FOR EACH ROW
                EXECUTE FUNCTION util.touch_updated_at()
            "#
        ))
        .await?;
    Ok(())
}

pub async fn drop_touch_trigger(manager: &SchemaManager<'_>, table: &str) -> Result<(), DbErr> {
    manager
        .get_connection()
        .execute_unprepared(&format!(
            "DROP TRIGGER IF EXISTS {table}_touch_updated_at ON {table}"
        ))
        .await?;
    Ok(())
}

/// Index over live rows only
pub async fn create_live_index(
    manager: &SchemaManager<'_>,
    name: &str,
    table: &str,
    columns: &str,
    unique: bool,
) -> Result<(), DbErr> {
    let unique = if unique { "UNIQUE " } else { "" };
    manager
        .get_connection()
        .execute_unprepared(&format!(
            "CREATE {unique}INDEX IF NOT EXISTS {name} ON {table} ({columns}) WHERE deleted_at IS NULL"
        ))
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn exec_ok() -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }
    }

    #[tokio::test]
    async fn helpers_run_against_a_schema_manager() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec_ok(), exec_ok(), exec_ok()])
            .into_connection();
        let manager = SchemaManager::new(&db);

        add_touch_trigger(&manager, "currencies").await.unwrap();
        create_live_index(&manager, "currencies_code_live", "currencies", "code", true)
            .await
            .unwrap();
        drop_touch_trigger(&manager, "currencies").await.unwrap();

        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains("CREATE TRIGGER currencies_touch_updated_at"));
        assert!(log.contains(
            "CREATE UNIQUE INDEX IF NOT EXISTS currencies_code_live ON currencies (code) WHERE deleted_at IS NULL"
        ));
        assert!(log.contains("DROP TRIGGER IF EXISTS currencies_touch_updated_at ON currencies"));
    }
}
