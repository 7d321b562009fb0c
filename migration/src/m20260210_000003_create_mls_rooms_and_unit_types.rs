//! # MLS Rooms + Unit Types Migration
//!
//! Both tables are wholesale-replaced per listing on every sync cycle (no upstream
//! `ModificationTimestamp` at the child level to diff against), so neither needs its own
//! `updated_at` trigger — rows are deleted and reinserted as a unit inside one
//! transaction rather than individually updated.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MlsRooms::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MlsRooms::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MlsRooms::ListingKey).string_len(64).not_null())
                    .col(ColumnDef::new(MlsRooms::RoomType).string_len(64))
                    .col(ColumnDef::new(MlsRooms::RoomLevel).string_len(64))
                    .col(ColumnDef::new(MlsRooms::RoomLength).decimal_len(10, 2))
                    .col(ColumnDef::new(MlsRooms::RoomWidth).decimal_len(10, 2))
                    .col(
                        ColumnDef::new(MlsRooms::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_mls_rooms_listing")
                            .from(MlsRooms::Table, MlsRooms::ListingKey)
                            .to(Properties::Table, Properties::ListingKey)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(r#"CREATE INDEX idx_mls_rooms_listing ON mls_rooms (listing_key);"#)
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MlsUnitTypes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MlsUnitTypes::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MlsUnitTypes::ListingKey).string_len(64).not_null())
                    .col(ColumnDef::new(MlsUnitTypes::UnitTypeType).string_len(64))
                    .col(ColumnDef::new(MlsUnitTypes::BedsTotal).integer())
                    .col(ColumnDef::new(MlsUnitTypes::BathsTotal).decimal_len(5, 2))
                    .col(ColumnDef::new(MlsUnitTypes::ActualRent).decimal_len(14, 2))
                    .col(
                        ColumnDef::new(MlsUnitTypes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_mls_unit_types_listing")
                            .from(MlsUnitTypes::Table, MlsUnitTypes::ListingKey)
                            .to(Properties::Table, Properties::ListingKey)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r#"CREATE INDEX idx_mls_unit_types_listing ON mls_unit_types (listing_key);"#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MlsUnitTypes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MlsRooms::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
pub enum MlsRooms {
    #[sea_orm(iden = "mls_rooms")]
    Table,
    Id,
    ListingKey,
    RoomType,
    RoomLevel,
    RoomLength,
    RoomWidth,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum MlsUnitTypes {
    #[sea_orm(iden = "mls_unit_types")]
    Table,
    Id,
    ListingKey,
    UnitTypeType,
    BedsTotal,
    BathsTotal,
    ActualRent,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Properties {
    #[sea_orm(iden = "mls_properties")]
    Table,
    ListingKey,
}
