//! Progress snapshots and the startup reset operation.

pub mod recorder;
pub mod reset;

pub use recorder::{DownloadCounter, ProgressRecorder};
pub use reset::reset_all;
