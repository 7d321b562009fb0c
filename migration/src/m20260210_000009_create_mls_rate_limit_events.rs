//! # MLS Rate Limit Events Migration
//!
//! An append-only log of 429/Retry-After responses observed from the upstream feed, one
//! row per occurrence. The progress recorder surfaces a recent count from this table;
//! nothing else reads it, so it carries no update trigger.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MlsRateLimitEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MlsRateLimitEvents::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MlsRateLimitEvents::Endpoint).string_len(64).not_null())
                    .col(ColumnDef::new(MlsRateLimitEvents::RetryAfterSeconds).integer())
                    .col(
                        ColumnDef::new(MlsRateLimitEvents::OccurredAt)
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
                r#"CREATE INDEX idx_mls_rate_limit_events_occurred_at ON mls_rate_limit_events (occurred_at);"#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MlsRateLimitEvents::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
pub enum MlsRateLimitEvents {
    #[sea_orm(iden = "mls_rate_limit_events")]
    Table,
    Id,
    Endpoint,
    RetryAfterSeconds,
    OccurredAt,
}
