//! # MLS Problematic Properties Migration
//!
//! Durable quarantine record for listings the media worker has repeatedly failed to
//! hydrate. Mirrors the in-memory quarantine map the worker keeps for fast lookups —
//! this table is what survives a process restart and what the progress recorder reads
//! to report how many listings are currently sitting out a cooldown.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MlsProblematicProperties::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MlsProblematicProperties::ListingKey)
                            .string_len(64)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(MlsProblematicProperties::ConsecutiveFails)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(MlsProblematicProperties::LastFailAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(MlsProblematicProperties::CooldownUntil).timestamp_with_time_zone())
                    .col(ColumnDef::new(MlsProblematicProperties::LastFailReason).text())
                    .col(
                        ColumnDef::new(MlsProblematicProperties::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_mls_problematic_properties_listing")
                            .from(MlsProblematicProperties::Table, MlsProblematicProperties::ListingKey)
                            .to(Properties::Table, Properties::ListingKey)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r#"CREATE INDEX idx_mls_problematic_properties_cooldown ON mls_problematic_properties (cooldown_until);"#,
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TRIGGER update_mls_problematic_properties_updated_at
                BEFORE UPDATE ON mls_problematic_properties
                FOR EACH ROW
                EXECUTE FUNCTION update_updated_at_column();
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MlsProblematicProperties::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
pub enum MlsProblematicProperties {
    #[sea_orm(iden = "mls_problematic_properties")]
    Table,
    ListingKey,
    ConsecutiveFails,
    LastFailAt,
    CooldownUntil,
    LastFailReason,
    UpdatedAt,
}
