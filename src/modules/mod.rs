//! The replication core's modules: configuration, the outbound upstream client and
//! rate governor, the three owned stores (relational, object, search), the resource
//! sync drivers, the media hydration worker, progress tracking, and startup reset.

pub mod config;
pub mod media_worker;
pub mod object_store;
pub mod progress;
pub mod rate_governor;
pub mod relational;
pub mod search_indexer;
pub mod sync;
pub mod upstream_client;
