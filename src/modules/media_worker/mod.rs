//! Media hydration: walks listings with missing assets one at a time and uploads
//! their photos, independent of (and concurrent with) the resource sync cycle.

pub mod failure_tracker;
pub mod quarantine;
pub mod url_expiry;
pub mod worker;

pub use worker::MediaWorker;
