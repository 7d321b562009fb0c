//! Resource sync drivers: one file per upstream resource, sharing the `SyncDriver`
//! trait and `run_paged_sync` page-follow loop.

pub mod deletions;
pub mod listing;
pub mod member;
pub mod odata;
pub mod office;
pub mod openhouse;
pub mod paging;

pub use deletions::DeletionsSyncDriver;
pub use listing::ListingSyncDriver;
pub use member::MemberSyncDriver;
pub use office::OfficeSyncDriver;
pub use openhouse::OpenHouseSyncDriver;
pub use paging::{run_paged_sync, SyncDriver, SyncDriverError};
