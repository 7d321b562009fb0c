//! # MLS Properties Table Migration
//!
//! Creates `mls_properties`: the authoritative row per upstream `Property` (Listing).
//! Tables owned by the replication core are prefixed `mls_` rather than placed in a
//! separate Postgres schema — same namespacing intent as the source system's `mls`
//! schema, without the cross-schema search_path wiring that buys nothing here (see
//! DESIGN.md).
//!
//! A `geog` column is maintained by trigger from `latitude`/`longitude` rather than
//! computed at read time, so that a spatial index on `geog` stays usable without every
//! query re-deriving the point.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(r#"CREATE EXTENSION IF NOT EXISTS postgis;"#)
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE OR REPLACE FUNCTION update_updated_at_column()
                RETURNS TRIGGER AS $$
                BEGIN
                    NEW.updated_at = CURRENT_TIMESTAMP;
                    RETURN NEW;
                END;
                $$ language 'plpgsql';
                "#,
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Properties::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Properties::ListingKey)
                            .string_len(64)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Properties::OriginatingSystem)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Properties::StandardStatus).string_len(32))
                    .col(ColumnDef::new(Properties::PropertyType).string_len(64))
                    .col(ColumnDef::new(Properties::PropertySubType).string_len(64))
                    .col(ColumnDef::new(Properties::ListPrice).decimal_len(14, 2))
                    .col(ColumnDef::new(Properties::OriginalListPrice).decimal_len(14, 2))
                    .col(ColumnDef::new(Properties::BedroomsTotal).integer())
                    .col(ColumnDef::new(Properties::BathroomsTotalInteger).integer())
                    .col(ColumnDef::new(Properties::LivingArea).integer())
                    .col(ColumnDef::new(Properties::YearBuilt).integer())
                    .col(ColumnDef::new(Properties::LotSizeArea).decimal_len(14, 2))
                    .col(ColumnDef::new(Properties::GarageSpaces).integer())
                    .col(ColumnDef::new(Properties::ParkingTotal).integer())
                    .col(ColumnDef::new(Properties::Latitude).double())
                    .col(ColumnDef::new(Properties::Longitude).double())
                    .col(ColumnDef::new(Properties::UnparsedAddress).string_len(512))
                    .col(ColumnDef::new(Properties::City).string_len(128))
                    .col(ColumnDef::new(Properties::StateOrProvince).string_len(64))
                    .col(ColumnDef::new(Properties::PostalCode).string_len(16))
                    .col(ColumnDef::new(Properties::CountyOrParish).string_len(128))
                    .col(ColumnDef::new(Properties::SubdivisionName).string_len(128))
                    .col(ColumnDef::new(Properties::PublicRemarks).text())
                    .col(ColumnDef::new(Properties::MlgCanView).boolean().not_null())
                    .col(
                        ColumnDef::new(Properties::PermittedUse)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    .col(
                        ColumnDef::new(Properties::ModificationTimestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Properties::PhotosChangeTimestamp).timestamp_with_time_zone())
                    .col(ColumnDef::new(Properties::OriginalEntryTimestamp).timestamp_with_time_zone())
                    .col(ColumnDef::new(Properties::PriceChangeTimestamp).timestamp_with_time_zone())
                    .col(ColumnDef::new(Properties::MajorChangeTimestamp).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Properties::Raw)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'{}'::jsonb")),
                    )
                    .col(
                        ColumnDef::new(Properties::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Properties::UpdatedAt)
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
                r#"ALTER TABLE mls_properties ADD COLUMN geog geography(Point, 4326);"#,
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE INDEX idx_mls_properties_modification_timestamp
                ON mls_properties (originating_system, modification_timestamp);
                "#,
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r#"CREATE INDEX idx_mls_properties_geog ON mls_properties USING GIST (geog);"#,
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE OR REPLACE FUNCTION mls_properties_sync_geog()
                RETURNS TRIGGER AS $$
                BEGIN
                    IF NEW.latitude IS NOT NULL AND NEW.longitude IS NOT NULL THEN
                        NEW.geog = ST_SetSRID(ST_MakePoint(NEW.longitude, NEW.latitude), 4326)::geography;
                    ELSE
                        NEW.geog = NULL;
                    END IF;
                    RETURN NEW;
                END;
                $$ language 'plpgsql';
                "#,
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TRIGGER mls_properties_geog_trigger
                BEFORE INSERT OR UPDATE ON mls_properties
                FOR EACH ROW
                EXECUTE FUNCTION mls_properties_sync_geog();
                "#,
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TRIGGER update_mls_properties_updated_at
                BEFORE UPDATE ON mls_properties
                FOR EACH ROW
                EXECUTE FUNCTION update_updated_at_column();
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Properties::Table).to_owned())
            .await?;
        manager
            .get_connection()
            .execute_unprepared("DROP FUNCTION IF EXISTS mls_properties_sync_geog();")
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
pub enum Properties {
    #[sea_orm(iden = "mls_properties")]
    Table,
    ListingKey,
    OriginatingSystem,
    StandardStatus,
    PropertyType,
    PropertySubType,
    ListPrice,
    OriginalListPrice,
    BedroomsTotal,
    BathroomsTotalInteger,
    LivingArea,
    YearBuilt,
    LotSizeArea,
    GarageSpaces,
    ParkingTotal,
    Latitude,
    Longitude,
    UnparsedAddress,
    City,
    StateOrProvince,
    PostalCode,
    CountyOrParish,
    SubdivisionName,
    PublicRemarks,
    MlgCanView,
    PermittedUse,
    ModificationTimestamp,
    PhotosChangeTimestamp,
    OriginalEntryTimestamp,
    PriceChangeTimestamp,
    MajorChangeTimestamp,
    Raw,
    CreatedAt,
    UpdatedAt,
}
