//! Per-listing "chronic offender" quarantine: a listing whose manifest fetch keeps
//! drawing upstream 429s is progressively backed off (spec.md §4.7). The in-process
//! map is process-local scratch state; the durable record lives in
//! `problematic_properties` and is written alongside every transition here by the
//! caller (`MediaWorker`), not by this type itself.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, Default)]
struct ListingQuarantineState {
    consecutive_fails: i32,
    cooldown_until: Option<Instant>,
}

pub struct Quarantine {
    state: Mutex<HashMap<String, ListingQuarantineState>>,
}

impl Quarantine {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(HashMap::new()),
        }
    }

    pub async fn is_quarantined(&self, listing_key: &str) -> bool {
        let state = self.state.lock().await;
        match state.get(listing_key).and_then(|s| s.cooldown_until) {
            Some(until) => Instant::now() < until,
            None => false,
        }
    }

    /// Seeds the in-process map from a durably-persisted quarantine row, converting
    /// the wall-clock `cooldown_until` to an `Instant` deadline. Used to restore
    /// quarantine state across a process restart, since the in-memory map alone does
    /// not survive one (spec.md §4.7's `problematic_properties` row is the durable
    /// counterpart precisely so a chronic offender isn't hammered again immediately
    /// after a restart). A no-op if this listing already has fresher in-memory state.
    pub async fn hydrate_from_persisted(&self, listing_key: &str, consecutive_fails: i32, cooldown_until: Option<chrono::DateTime<chrono::Utc>>) {
        let mut state = self.state.lock().await;
        if state.contains_key(listing_key) {
            return;
        }
        let remaining = cooldown_until.and_then(|until| {
            let now = chrono::Utc::now();
            if until > now {
                (until - now).to_std().ok()
            } else {
                None
            }
        });
        state.insert(
            listing_key.to_string(),
            ListingQuarantineState {
                consecutive_fails,
                cooldown_until: remaining.map(|d| Instant::now() + d),
            },
        );
    }

    /// Records a manifest-fetch 429 for this listing, returning the new consecutive
    /// failure count and the cooldown it now carries (if any).
    pub async fn record_rate_limit(&self, listing_key: &str) -> (i32, Option<Duration>) {
        let mut state = self.state.lock().await;
        let entry = state.entry(listing_key.to_string()).or_default();
        entry.consecutive_fails += 1;
        let cooldown = cooldown_for(entry.consecutive_fails);
        entry.cooldown_until = cooldown.map(|d| Instant::now() + d);
        (entry.consecutive_fails, cooldown)
    }

    pub async fn clear(&self, listing_key: &str) {
        self.state.lock().await.remove(listing_key);
    }
}

impl Default for Quarantine {
    fn default() -> Self {
        Self::new()
    }
}

/// 2h at 2 consecutive fails, 4h at 3, 8h at 4, 7 days from 5 onward.
pub fn cooldown_for(consecutive_fails: i32) -> Option<Duration> {
    match consecutive_fails {
        0 | 1 => None,
        2 => Some(Duration::from_secs(2 * 3600)),
        3 => Some(Duration::from_secs(4 * 3600)),
        4 => Some(Duration::from_secs(8 * 3600)),
        n if n >= 5 => Some(Duration::from_secs(7 * 24 * 3600)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn escalates_cooldown_with_consecutive_fails() {
        let q = Quarantine::new();
        q.record_rate_limit("L1").await;
        let (fails, cooldown) = q.record_rate_limit("L1").await;
        assert_eq!(fails, 2);
        assert_eq!(cooldown, Some(Duration::from_secs(2 * 3600)));
        assert!(q.is_quarantined("L1").await);
    }

    #[tokio::test]
    async fn clear_removes_quarantine() {
        let q = Quarantine::new();
        q.record_rate_limit("L1").await;
        q.record_rate_limit("L1").await;
        q.clear("L1").await;
        assert!(!q.is_quarantined("L1").await);
    }

    #[tokio::test]
    async fn hydrates_active_cooldown_from_persisted_row() {
        let q = Quarantine::new();
        let until = chrono::Utc::now() + chrono::Duration::hours(1);
        q.hydrate_from_persisted("L1", 2, Some(until)).await;
        assert!(q.is_quarantined("L1").await);
    }

    #[tokio::test]
    async fn does_not_hydrate_an_expired_persisted_cooldown() {
        let q = Quarantine::new();
        let until = chrono::Utc::now() - chrono::Duration::hours(1);
        q.hydrate_from_persisted("L1", 5, Some(until)).await;
        assert!(!q.is_quarantined("L1").await);
    }

    #[tokio::test]
    async fn hydration_does_not_clobber_fresher_in_memory_state() {
        let q = Quarantine::new();
        q.record_rate_limit("L1").await;
        q.record_rate_limit("L1").await;
        let stale_until = chrono::Utc::now() - chrono::Duration::hours(1);
        q.hydrate_from_persisted("L1", 5, Some(stale_until)).await;
        assert!(q.is_quarantined("L1").await);
    }

    #[test]
    fn cooldown_table_matches_spec() {
        assert_eq!(cooldown_for(1), None);
        assert_eq!(cooldown_for(2), Some(Duration::from_secs(2 * 3600)));
        assert_eq!(cooldown_for(3), Some(Duration::from_secs(4 * 3600)));
        assert_eq!(cooldown_for(4), Some(Duration::from_secs(8 * 3600)));
        assert_eq!(cooldown_for(5), Some(Duration::from_secs(7 * 24 * 3600)));
        assert_eq!(cooldown_for(9), Some(Duration::from_secs(7 * 24 * 3600)));
    }
}
