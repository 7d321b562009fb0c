//! # MLS Offices + Members Migration
//!
//! `mls_offices`/`mls_members` mirror the upstream `Office` and `Member` (agent)
//! resources. Both are synced independently of `Listing` on their own HWM (see
//! `mls_sync_state`), so each carries its own `modification_timestamp` for incremental
//! diffing rather than depending on a listing FK.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MlsOffices::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MlsOffices::OfficeKey)
                            .string_len(64)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MlsOffices::OriginatingSystem).string_len(64).not_null())
                    .col(ColumnDef::new(MlsOffices::OfficeName).string_len(255))
                    .col(ColumnDef::new(MlsOffices::OfficePhone).string_len(32))
                    .col(ColumnDef::new(MlsOffices::OfficeEmail).string_len(255))
                    .col(ColumnDef::new(MlsOffices::OfficeAddress1).string_len(255))
                    .col(ColumnDef::new(MlsOffices::OfficeCity).string_len(128))
                    .col(ColumnDef::new(MlsOffices::OfficeStateOrProvince).string_len(64))
                    .col(ColumnDef::new(MlsOffices::OfficePostalCode).string_len(16))
                    .col(
                        ColumnDef::new(MlsOffices::Raw)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'{}'::jsonb")),
                    )
                    .col(
                        ColumnDef::new(MlsOffices::ModificationTimestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MlsOffices::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(MlsOffices::UpdatedAt)
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
                r#"CREATE INDEX idx_mls_offices_modification_timestamp ON mls_offices (originating_system, modification_timestamp);"#,
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TRIGGER update_mls_offices_updated_at
                BEFORE UPDATE ON mls_offices
                FOR EACH ROW
                EXECUTE FUNCTION update_updated_at_column();
                "#,
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MlsMembers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MlsMembers::MemberKey)
                            .string_len(64)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MlsMembers::OriginatingSystem).string_len(64).not_null())
                    .col(ColumnDef::new(MlsMembers::MemberFullName).string_len(255))
                    .col(ColumnDef::new(MlsMembers::MemberEmail).string_len(255))
                    .col(ColumnDef::new(MlsMembers::MemberPhone).string_len(32))
                    .col(ColumnDef::new(MlsMembers::OfficeKey).string_len(64))
                    .col(ColumnDef::new(MlsMembers::MemberStatus).string_len(32))
                    .col(
                        ColumnDef::new(MlsMembers::Raw)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'{}'::jsonb")),
                    )
                    .col(
                        ColumnDef::new(MlsMembers::ModificationTimestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MlsMembers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(MlsMembers::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_mls_members_office")
                            .from(MlsMembers::Table, MlsMembers::OfficeKey)
                            .to(MlsOffices::Table, MlsOffices::OfficeKey)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r#"CREATE INDEX idx_mls_members_modification_timestamp ON mls_members (originating_system, modification_timestamp);"#,
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TRIGGER update_mls_members_updated_at
                BEFORE UPDATE ON mls_members
                FOR EACH ROW
                EXECUTE FUNCTION update_updated_at_column();
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MlsMembers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MlsOffices::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
pub enum MlsOffices {
    #[sea_orm(iden = "mls_offices")]
    Table,
    OfficeKey,
    OriginatingSystem,
    OfficeName,
    OfficePhone,
    OfficeEmail,
    OfficeAddress1,
    OfficeCity,
    OfficeStateOrProvince,
    OfficePostalCode,
    Raw,
    ModificationTimestamp,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum MlsMembers {
    #[sea_orm(iden = "mls_members")]
    Table,
    MemberKey,
    OriginatingSystem,
    MemberFullName,
    MemberEmail,
    MemberPhone,
    OfficeKey,
    MemberStatus,
    Raw,
    ModificationTimestamp,
    CreatedAt,
    UpdatedAt,
}
