//! # MLS Sync State Migration
//!
//! One row per `(resource, originating_system)` pair, holding the high-water mark a
//! resource's sync driver has advanced to and the wall-clock time of its last run. This
//! is the sole source of resumability across process restarts — a driver that crashes
//! mid-cycle resumes from whatever `high_water_mark` the last completed batch wrote.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MlsSyncState::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(MlsSyncState::Resource).string_len(64).not_null())
                    .col(
                        ColumnDef::new(MlsSyncState::OriginatingSystem)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MlsSyncState::HighWaterMark)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(MlsSyncState::LastRunAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(MlsSyncState::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .primary_key(
                        Index::create()
                            .col(MlsSyncState::Resource)
                            .col(MlsSyncState::OriginatingSystem),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TRIGGER update_mls_sync_state_updated_at
                BEFORE UPDATE ON mls_sync_state
                FOR EACH ROW
                EXECUTE FUNCTION update_updated_at_column();
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MlsSyncState::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
pub enum MlsSyncState {
    #[sea_orm(iden = "mls_sync_state")]
    Table,
    Resource,
    OriginatingSystem,
    HighWaterMark,
    LastRunAt,
    UpdatedAt,
}
