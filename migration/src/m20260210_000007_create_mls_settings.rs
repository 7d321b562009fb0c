//! # MLS Settings Migration
//!
//! A plain key/value table for the handful of operator-tunable knobs that must change
//! without a redeploy — the media governor's `min_interval` is the current sole
//! consumer, read back by `RateGovernor::wait_for_slot` at a throttled cadence.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MlsSettings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MlsSettings::Key)
                            .string_len(128)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MlsSettings::Value).text().not_null())
                    .col(
                        ColumnDef::new(MlsSettings::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TRIGGER update_mls_settings_updated_at
                BEFORE UPDATE ON mls_settings
                FOR EACH ROW
                EXECUTE FUNCTION update_updated_at_column();
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MlsSettings::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
pub enum MlsSettings {
    #[sea_orm(iden = "mls_settings")]
    Table,
    Key,
    Value,
    UpdatedAt,
}
