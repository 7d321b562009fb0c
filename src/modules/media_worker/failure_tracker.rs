//! Per-asset failure accounting: attempts-this-cycle, last-attempt-time, and a
//! permanent-failure flag (spec.md §4.7). Single-writer (the media worker), so a plain
//! `tokio::sync::Mutex<HashMap<...>>` is enough — no cross-task contention to optimize
//! away.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const MAX_ATTEMPTS_PER_CYCLE: u32 = 3;
const ATTEMPT_COOLDOWN: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy)]
struct AssetFailureState {
    attempts_this_cycle: u32,
    last_attempt_at: Instant,
    permanent: bool,
}

pub struct FailureTracker {
    state: Mutex<HashMap<String, AssetFailureState>>,
}

impl FailureTracker {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(HashMap::new()),
        }
    }

    /// `true` if this asset should not be attempted right now: permanently failed, or
    /// mid cooldown after exhausting its per-cycle attempt budget.
    pub async fn should_skip(&self, asset_key: &str) -> bool {
        let mut state = self.state.lock().await;
        let Some(entry) = state.get_mut(asset_key) else {
            return false;
        };

        if entry.permanent {
            return true;
        }

        if entry.attempts_this_cycle >= MAX_ATTEMPTS_PER_CYCLE {
            if entry.last_attempt_at.elapsed() >= ATTEMPT_COOLDOWN {
                entry.attempts_this_cycle = 0;
                false
            } else {
                true
            }
        } else {
            false
        }
    }

    pub async fn record_failure(&self, asset_key: &str, permanent: bool) {
        let mut state = self.state.lock().await;
        let entry = state.entry(asset_key.to_string()).or_insert(AssetFailureState {
            attempts_this_cycle: 0,
            last_attempt_at: Instant::now(),
            permanent: false,
        });
        entry.attempts_this_cycle += 1;
        entry.last_attempt_at = Instant::now();
        entry.permanent = entry.permanent || permanent;
    }

    pub async fn record_success(&self, asset_key: &str) {
        self.state.lock().await.remove(asset_key);
    }
}

impl Default for FailureTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn permanent_failure_is_never_retried() {
        let tracker = FailureTracker::new();
        tracker.record_failure("M1", true).await;
        assert!(tracker.should_skip("M1").await);
    }

    #[tokio::test]
    async fn cools_down_after_three_attempts() {
        let tracker = FailureTracker::new();
        tracker.record_failure("M1", false).await;
        tracker.record_failure("M1", false).await;
        tracker.record_failure("M1", false).await;
        assert!(tracker.should_skip("M1").await);
    }

    #[tokio::test]
    async fn success_clears_tracked_state() {
        let tracker = FailureTracker::new();
        tracker.record_failure("M1", false).await;
        tracker.record_success("M1").await;
        assert!(!tracker.should_skip("M1").await);
    }
}
