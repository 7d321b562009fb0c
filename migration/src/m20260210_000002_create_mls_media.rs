//! # MLS Media Table Migration
//!
//! `mls_media` mirrors the upstream `Media` resource: one row per photo/document
//! attached to a listing. `local_url` is populated by the media-hydration worker once
//! the asset has been downloaded and re-uploaded to the object store; until then it is
//! `NULL` and the worker is expected to retry.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MlsMedia::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MlsMedia::MediaKey)
                            .string_len(64)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MlsMedia::ResourceRecordKey).string_len(64).not_null())
                    .col(ColumnDef::new(MlsMedia::MediaCategory).string_len(64))
                    .col(ColumnDef::new(MlsMedia::MediaOrder).integer())
                    .col(ColumnDef::new(MlsMedia::MediaUrl).text())
                    .col(ColumnDef::new(MlsMedia::LocalUrl).text())
                    .col(ColumnDef::new(MlsMedia::ImageWidth).integer())
                    .col(ColumnDef::new(MlsMedia::ImageHeight).integer())
                    .col(
                        ColumnDef::new(MlsMedia::MediaModificationTimestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MlsMedia::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(MlsMedia::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_mls_media_listing")
                            .from(MlsMedia::Table, MlsMedia::ResourceRecordKey)
                            .to(Properties::Table, Properties::ListingKey)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r#"CREATE INDEX idx_mls_media_listing ON mls_media (resource_record_key, media_order);"#,
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r#"CREATE INDEX idx_mls_media_pending_local ON mls_media (resource_record_key) WHERE local_url IS NULL;"#,
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TRIGGER update_mls_media_updated_at
                BEFORE UPDATE ON mls_media
                FOR EACH ROW
                EXECUTE FUNCTION update_updated_at_column();
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MlsMedia::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
pub enum MlsMedia {
    #[sea_orm(iden = "mls_media")]
    Table,
    MediaKey,
    ResourceRecordKey,
    MediaCategory,
    MediaOrder,
    MediaUrl,
    LocalUrl,
    ImageWidth,
    ImageHeight,
    MediaModificationTimestamp,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Properties {
    #[sea_orm(iden = "mls_properties")]
    Table,
    ListingKey,
}
