//! # MLS Progress History Migration
//!
//! One row per progress snapshot taken by the recorder. Pruned to the trailing 7 days
//! on every insert (`src/modules/progress/recorder.rs`), so the table stays small
//! without needing a separate cron or partitioning scheme.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MlsProgressHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MlsProgressHistory::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(MlsProgressHistory::RecordedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(MlsProgressHistory::TotalListings).big_integer().not_null())
                    .col(ColumnDef::new(MlsProgressHistory::ActiveListings).big_integer().not_null())
                    .col(ColumnDef::new(MlsProgressHistory::TotalMedia).big_integer().not_null())
                    .col(ColumnDef::new(MlsProgressHistory::HydratedMedia).big_integer().not_null())
                    .col(ColumnDef::new(MlsProgressHistory::MissingMedia).big_integer().not_null())
                    .col(ColumnDef::new(MlsProgressHistory::PctHydrated).decimal_len(5, 2).not_null())
                    .col(
                        ColumnDef::new(MlsProgressHistory::ListingsWithMissingMedia)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MlsProgressHistory::DownloadsCompleted)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MlsProgressHistory::ApiRateLimited)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(MlsProgressHistory::MediaRateLimited)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r#"CREATE INDEX idx_mls_progress_history_recorded_at ON mls_progress_history (recorded_at);"#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MlsProgressHistory::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
pub enum MlsProgressHistory {
    #[sea_orm(iden = "mls_progress_history")]
    Table,
    Id,
    RecordedAt,
    TotalListings,
    ActiveListings,
    TotalMedia,
    HydratedMedia,
    MissingMedia,
    PctHydrated,
    ListingsWithMissingMedia,
    DownloadsCompleted,
    ApiRateLimited,
    MediaRateLimited,
}
