//! # MLS Open Houses Migration
//!
//! Deduplicated on `(listing_key, open_house_start_time, open_house_end_time)` — the
//! upstream `OpenHouse` resource has its own `OpenHouseKey`, but re-scheduled events are
//! sometimes republished under a new key for the same listing/window, so the unique
//! constraint guards against the duplicate the key alone would miss.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MlsOpenHouses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MlsOpenHouses::OpenHouseKey)
                            .string_len(64)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MlsOpenHouses::ListingKey).string_len(64).not_null())
                    .col(
                        ColumnDef::new(MlsOpenHouses::OpenHouseStartTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MlsOpenHouses::OpenHouseEndTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(MlsOpenHouses::OpenHouseRemarks).text())
                    .col(
                        ColumnDef::new(MlsOpenHouses::ModificationTimestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MlsOpenHouses::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(MlsOpenHouses::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_mls_open_houses_listing")
                            .from(MlsOpenHouses::Table, MlsOpenHouses::ListingKey)
                            .to(Properties::Table, Properties::ListingKey)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE UNIQUE INDEX idx_mls_open_houses_dedupe
                ON mls_open_houses (listing_key, open_house_start_time, open_house_end_time);
                "#,
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TRIGGER update_mls_open_houses_updated_at
                BEFORE UPDATE ON mls_open_houses
                FOR EACH ROW
                EXECUTE FUNCTION update_updated_at_column();
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MlsOpenHouses::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
pub enum MlsOpenHouses {
    #[sea_orm(iden = "mls_open_houses")]
    Table,
    OpenHouseKey,
    ListingKey,
    OpenHouseStartTime,
    OpenHouseEndTime,
    OpenHouseRemarks,
    ModificationTimestamp,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Properties {
    #[sea_orm(iden = "mls_properties")]
    Table,
    ListingKey,
}
