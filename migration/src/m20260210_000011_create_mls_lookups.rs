//! # MLS Lookups Migration
//!
//! Schema-only placeholder for the upstream `Lookup` resource (enumerated field value
//! translations). No component in this core reads or writes it yet — it exists so the
//! public read API this core feeds can join against it without a schema change. Not
//! populated by any sync driver.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MlsLookups::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MlsLookups::LookupKey)
                            .string_len(64)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MlsLookups::LookupName).string_len(128).not_null())
                    .col(ColumnDef::new(MlsLookups::LookupValue).string_len(255).not_null())
                    .col(ColumnDef::new(MlsLookups::StandardLookupValue).string_len(255))
                    .col(
                        ColumnDef::new(MlsLookups::CreatedAt)
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
                r#"CREATE INDEX idx_mls_lookups_name ON mls_lookups (lookup_name);"#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MlsLookups::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
pub enum MlsLookups {
    #[sea_orm(iden = "mls_lookups")]
    Table,
    LookupKey,
    LookupName,
    LookupValue,
    StandardLookupValue,
    CreatedAt,
}
