//! Periodic progress snapshots: at most once per ~15 minutes, mirrors the current
//! counts plus the media worker's download tally into `progress_history`, then prunes
//! rows older than seven days.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::warn;

use crate::modules::relational::store::RelationalStore;

const SNAPSHOT_INTERVAL: Duration = Duration::from_secs(15 * 60);
const RETENTION: chrono::Duration = chrono::Duration::days(7);

/// Counts completed media downloads since the last snapshot. Shared with the media
/// worker via `Arc`; reset atomically on every read.
#[derive(Clone)]
pub struct DownloadCounter(Arc<AtomicU64>);

impl DownloadCounter {
    pub fn new() -> Self {
        Self(Arc::new(AtomicU64::new(0)))
    }

    pub fn handle(&self) -> Arc<AtomicU64> {
        self.0.clone()
    }

    fn take(&self) -> i64 {
        self.0.swap(0, Ordering::Relaxed) as i64
    }
}

impl Default for DownloadCounter {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ProgressRecorder {
    store: Arc<dyn RelationalStore>,
    downloads: DownloadCounter,
    last_snapshot_at: Mutex<Option<Instant>>,
}

impl ProgressRecorder {
    pub fn new(store: Arc<dyn RelationalStore>, downloads: DownloadCounter) -> Self {
        Self {
            store,
            downloads,
            last_snapshot_at: Mutex::new(None),
        }
    }

    /// Takes a snapshot if at least `SNAPSHOT_INTERVAL` has elapsed since the last one.
    /// `api_rate_limited`/`media_rate_limited` reflect whether either governor is
    /// currently in a cooldown at the moment this is called.
    pub async fn maybe_snapshot(&self, api_rate_limited: bool, media_rate_limited: bool) {
        {
            let mut last = self.last_snapshot_at.lock().await;
            match *last {
                Some(at) if at.elapsed() < SNAPSHOT_INTERVAL => return,
                _ => *last = Some(Instant::now()),
            }
        }

        let counts = match self.store.progress_counts().await {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "failed to read progress counts, skipping snapshot");
                return;
            }
        };

        let downloads_completed = self.downloads.take();

        if let Err(e) = self
            .store
            .insert_progress_sample(counts, downloads_completed, api_rate_limited, media_rate_limited)
            .await
        {
            warn!(error = %e, "failed to insert progress sample");
        }

        if let Err(e) = self.store.prune_progress_history(Utc::now() - RETENTION).await {
            warn!(error = %e, "failed to prune progress history");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_counter_take_resets_atomically() {
        let counter = DownloadCounter::new();
        counter.handle().fetch_add(3, Ordering::Relaxed);
        assert_eq!(counter.take(), 3);
        assert_eq!(counter.take(), 0);
    }
}
