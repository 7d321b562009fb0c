pub use sea_orm_migration::prelude::*;

mod m20260210_000001_create_mls_schema_and_properties;
mod m20260210_000002_create_mls_media;
mod m20260210_000003_create_mls_rooms_and_unit_types;
mod m20260210_000004_create_mls_offices_and_members;
mod m20260210_000005_create_mls_open_houses;
mod m20260210_000006_create_mls_sync_state;
mod m20260210_000007_create_mls_settings;
mod m20260210_000008_create_mls_problematic_properties;
mod m20260210_000009_create_mls_rate_limit_events;
mod m20260210_000010_create_mls_progress_history;
mod m20260210_000011_create_mls_lookups;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260210_000001_create_mls_schema_and_properties::Migration),
            Box::new(m20260210_000002_create_mls_media::Migration),
            Box::new(m20260210_000003_create_mls_rooms_and_unit_types::Migration),
            Box::new(m20260210_000004_create_mls_offices_and_members::Migration),
            Box::new(m20260210_000005_create_mls_open_houses::Migration),
            Box::new(m20260210_000006_create_mls_sync_state::Migration),
            Box::new(m20260210_000007_create_mls_settings::Migration),
            Box::new(m20260210_000008_create_mls_problematic_properties::Migration),
            Box::new(m20260210_000009_create_mls_rate_limit_events::Migration),
            Box::new(m20260210_000010_create_mls_progress_history::Migration),
            Box::new(m20260210_000011_create_mls_lookups::Migration),
        ]
    }
}
