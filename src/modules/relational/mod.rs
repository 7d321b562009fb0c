//! Relational store port + adapters: domain models, numeric coercion, sea-orm
//! entities, and the Postgres adapter implementing `RelationalStore`.

pub mod coercion;
pub mod domain;
pub mod entity;
pub mod postgres_store;
pub mod store;

pub use postgres_store::PostgresMlsStore;
pub use store::{
    ProblematicListingState, ProgressCounts, RelationalStore, RelationalStoreError, SyncResource,
};
