//! The media hydration loop: a single long-lived task, independent of the sync-cycle
//! ticker, that walks listings with missing assets one at a time and uploads their
//! photos to the object store.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::modules::object_store::{cdn_url, extension_for_content_type, listing_prefix, media_key, ObjectStore};
use crate::modules::rate_governor::RateGovernor;
use crate::modules::relational::domain::MediaAsset;
use crate::modules::relational::entity::settings::MEDIA_MIN_INTERVAL_MS;
use crate::modules::relational::store::RelationalStore;
use crate::modules::search_indexer::SearchIndexer;
use crate::modules::upstream_client::{UpstreamClient, UpstreamError};

use super::failure_tracker::FailureTracker;
use super::quarantine::Quarantine;
use super::url_expiry;

/// How long to wait before retrying anything after an asset-upload 429. The upstream
/// contract only promises "a bounded future time"; fifteen minutes comfortably clears
/// a burst without stalling hydration for long.
const MEDIA_COOLDOWN: Duration = Duration::from_secs(15 * 60);

/// Cooldown applied after a manifest-fetch 429, distinct from (and longer than) the
/// per-asset upload cooldown, since a manifest 429 indicates the metadata endpoint
/// itself is under pressure.
const API_COOLDOWN: Duration = Duration::from_secs(30 * 60);

/// How long to sleep when there is nothing to hydrate or every candidate is quarantined.
const IDLE_SLEEP: Duration = Duration::from_secs(3 * 60);
const ALL_QUARANTINED_SLEEP: Duration = Duration::from_secs(60);

/// How many alternate listings to scan past a quarantined first pick.
const ALTERNATE_SCAN_LIMIT: usize = 10;

/// How often `refresh_media_interval` is allowed to hit the database — the setting
/// changes rarely, and `run_iteration` can loop far faster than that once listings are
/// quarantined or cooling down.
const SETTINGS_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

pub struct MediaWorker {
    store: Arc<dyn RelationalStore>,
    object_store: Arc<dyn ObjectStore>,
    search: Arc<dyn SearchIndexer>,
    manifest_client: Arc<UpstreamClient>,
    download_http: reqwest::Client,
    media_governor: Arc<RateGovernor>,
    originating_system: String,
    storage_env: String,
    gcs_cdn_base: String,

    failures: FailureTracker,
    quarantine: Quarantine,
    downloads_completed: Arc<AtomicU64>,

    media_cooldown_until: Mutex<Option<Instant>>,
    api_cooldown_until: Mutex<Option<Instant>>,
    last_interval_refresh: Mutex<Option<Instant>>,
}

impl MediaWorker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn RelationalStore>,
        object_store: Arc<dyn ObjectStore>,
        search: Arc<dyn SearchIndexer>,
        manifest_client: Arc<UpstreamClient>,
        media_governor: Arc<RateGovernor>,
        originating_system: String,
        storage_env: String,
        gcs_cdn_base: String,
        downloads_completed: Arc<AtomicU64>,
    ) -> Self {
        // spec.md §5: 30s for headers (approximated here as connect+time-to-first-byte
        // via `connect_timeout`), 60s for the full body read via the overall `timeout`.
        let download_http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .timeout(Duration::from_secs(60))
            .build()
            .expect("failed to build media download HTTP client");

        Self {
            store,
            object_store,
            search,
            manifest_client,
            download_http,
            media_governor,
            originating_system,
            storage_env,
            gcs_cdn_base,
            failures: FailureTracker::new(),
            quarantine: Quarantine::new(),
            downloads_completed,
            media_cooldown_until: Mutex::new(None),
            api_cooldown_until: Mutex::new(None),
            last_interval_refresh: Mutex::new(None),
        }
    }

    pub async fn run_forever(&self) -> ! {
        loop {
            self.run_iteration().await;
        }
    }

    async fn run_iteration(&self) {
        self.refresh_media_interval().await;

        if let Some(remaining) = self.remaining_cooldown(&self.media_cooldown_until).await {
            tokio::time::sleep(remaining).await;
            return;
        }
        if let Some(remaining) = self.remaining_cooldown(&self.api_cooldown_until).await {
            tokio::time::sleep(remaining).await;
            return;
        }

        let missing = match self.store.count_missing_media().await {
            Ok(n) => n,
            Err(e) => {
                warn!(error = %e, "failed to count missing media, will retry");
                tokio::time::sleep(IDLE_SLEEP).await;
                return;
            }
        };

        if missing == 0 {
            tokio::time::sleep(IDLE_SLEEP).await;
            return;
        }

        let Some(listing_key) = self.pick_unquarantined_listing().await else {
            tokio::time::sleep(ALL_QUARANTINED_SLEEP).await;
            return;
        };

        self.media_governor.wait_for_slot().await;

        let path = format!("/Property('{listing_key}')?$expand=Media&$select=ListingKey");
        let manifest = match self.manifest_client.fetch(&path).await {
            Ok(v) => v,
            Err(UpstreamError::RateLimited) => {
                self.quarantine_listing(&listing_key).await;
                return;
            }
            Err(UpstreamError::NotFound) => {
                self.delete_listing_everywhere(&listing_key).await;
                return;
            }
            Err(e) => {
                warn!(error = %e, listing_key = %listing_key, "manifest fetch failed, will retry next iteration");
                return;
            }
        };

        self.quarantine.clear(&listing_key).await;
        if let Err(e) = self.store.clear_problematic_listing(&listing_key).await {
            warn!(error = %e, listing_key = %listing_key, "failed to clear problematic-listing record");
        }

        self.hydrate_listing(&listing_key, &manifest).await;
    }

    /// Re-reads the media governor's minimum interval from the `Setting` entity on
    /// every iteration so an operator can retune pacing without a redeploy
    /// (spec.md §4.2). A missing or unparsable setting leaves the governor's current
    /// interval untouched rather than resetting it to a default.
    async fn refresh_media_interval(&self) {
        {
            let mut last = self.last_interval_refresh.lock().await;
            match *last {
                Some(at) if at.elapsed() < SETTINGS_REFRESH_INTERVAL => return,
                _ => *last = Some(Instant::now()),
            }
        }

        match self.store.get_setting(MEDIA_MIN_INTERVAL_MS).await {
            Ok(Some(raw)) => match raw.parse::<u64>() {
                Ok(ms) => self.media_governor.set_min_interval(Duration::from_millis(ms)).await,
                Err(_) => warn!(value = %raw, "ignoring unparsable media_min_interval_ms setting"),
            },
            Ok(None) => {}
            Err(e) => warn!(error = %e, "failed to read media_min_interval_ms setting"),
        }
    }

    async fn remaining_cooldown(&self, slot: &Mutex<Option<Instant>>) -> Option<Duration> {
        let mut guard = slot.lock().await;
        match *guard {
            Some(until) if until > Instant::now() => Some(until - Instant::now()),
            Some(_) => {
                *guard = None;
                None
            }
            None => None,
        }
    }

    /// Picks the listing with missing media preferring the most recently modified; if
    /// it is quarantined, scans up to ten alternates for the first unquarantined one.
    async fn pick_unquarantined_listing(&self) -> Option<String> {
        let candidates = self
            .store
            .pick_listing_with_missing_media(&[], ALTERNATE_SCAN_LIMIT)
            .await
            .unwrap_or_default();

        for candidate in candidates {
            self.hydrate_quarantine_from_db(&candidate).await;
            if !self.quarantine.is_quarantined(&candidate).await {
                return Some(candidate);
            }
        }
        None
    }

    /// Lazily seeds the in-process quarantine map from the durable
    /// `problematic_properties` row the first time a candidate is seen this process
    /// lifetime, so a restart doesn't immediately re-select a listing that was
    /// mid-cooldown when the process stopped.
    async fn hydrate_quarantine_from_db(&self, listing_key: &str) {
        match self.store.get_problematic_listing(listing_key).await {
            Ok(Some(state)) => {
                self.quarantine
                    .hydrate_from_persisted(listing_key, state.consecutive_fails, state.cooldown_until)
                    .await;
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, listing_key = %listing_key, "failed to read persisted quarantine state"),
        }
    }

    async fn quarantine_listing(&self, listing_key: &str) {
        let (consecutive_fails, cooldown) = self.quarantine.record_rate_limit(listing_key).await;
        *self.api_cooldown_until.lock().await = Some(Instant::now() + API_COOLDOWN);

        if let Err(e) = self.store.record_rate_limit_event("manifest_fetch", None).await {
            warn!(error = %e, "failed to record rate-limit event");
        }

        let db_cooldown_until = cooldown.and_then(|d| chrono::Duration::from_std(d).ok()).map(|d| chrono::Utc::now() + d);
        if let Err(e) = self
            .store
            .record_problematic_listing(listing_key, consecutive_fails, db_cooldown_until, "manifest_fetch_429")
            .await
        {
            warn!(error = %e, listing_key = %listing_key, "failed to persist quarantine state");
        }
    }

    async fn delete_listing_everywhere(&self, listing_key: &str) {
        let prefix = listing_prefix(&self.storage_env, &self.originating_system, listing_key);
        match self.object_store.list_under(&prefix).await {
            Ok(keys) if !keys.is_empty() => {
                if let Err(e) = self.object_store.delete_many(&keys).await {
                    warn!(error = %e, listing_key = %listing_key, "failed to delete listing's objects");
                }
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, listing_key = %listing_key, "failed to list listing's objects"),
        }

        if let Err(e) = self.search.delete(listing_key).await {
            warn!(error = %e, listing_key = %listing_key, "failed to delete listing from search index");
        }

        if let Err(e) = self.store.delete_listing(listing_key).await {
            warn!(error = %e, listing_key = %listing_key, "failed to delete listing from relational store");
        }
    }

    async fn hydrate_listing(&self, listing_key: &str, manifest: &serde_json::Value) {
        let fresh_assets: Vec<MediaAsset> = manifest
            .get("Media")
            .and_then(|v| v.as_array())
            .map(|items| items.iter().filter_map(|m| MediaAsset::from_upstream(m, listing_key)).collect())
            .unwrap_or_default();

        let fresh_keys: Vec<String> = fresh_assets.iter().map(|a| a.media_key.clone()).collect();
        if let Err(e) = self.store.delete_media_not_in(listing_key, &fresh_keys).await {
            warn!(error = %e, listing_key = %listing_key, "failed to reconcile orphaned media rows");
        }

        let needs_download = self
            .store
            .media_keys_missing_local_url(listing_key)
            .await
            .unwrap_or_default();
        let needs_download: std::collections::HashSet<String> = needs_download.into_iter().collect();

        for asset in &fresh_assets {
            if asset.is_video() {
                continue;
            }
            if !needs_download.contains(&asset.media_key) {
                continue;
            }
            if self.failures.should_skip(&asset.media_key).await {
                continue;
            }

            let Some(url) = asset.media_url.clone() else {
                continue;
            };

            if url_expiry::is_expired(&url, SystemTime::now()) {
                // Manifest is stale for this asset; the listing still has missing media
                // so it will be re-selected (and its manifest refetched) on a future tick.
                break;
            }

            if let Err(e) = self.store.update_media_url(&asset.media_key, &url, asset.media_modification_timestamp).await {
                warn!(error = %e, media_key = %asset.media_key, "failed to refresh media url/timestamp");
            }

            match self.download_and_upload(asset, &url).await {
                AssetOutcome::Success => {
                    self.failures.record_success(&asset.media_key).await;
                    self.downloads_completed.fetch_add(1, Ordering::Relaxed);
                    self.media_governor.wait_for_slot().await;
                }
                AssetOutcome::RateLimited => {
                    *self.media_cooldown_until.lock().await = Some(Instant::now() + MEDIA_COOLDOWN);
                    if let Err(e) = self.store.record_rate_limit_event("media_download", None).await {
                        warn!(error = %e, "failed to record media rate-limit event");
                    }
                    break;
                }
                AssetOutcome::Permanent => {
                    self.failures.record_failure(&asset.media_key, true).await;
                }
                AssetOutcome::Transient => {
                    self.failures.record_failure(&asset.media_key, false).await;
                }
            }
        }

        info!(listing_key = %listing_key, asset_count = fresh_assets.len(), "media manifest processed");
    }

    async fn download_and_upload(&self, asset: &MediaAsset, url: &str) -> AssetOutcome {
        self.media_governor.wait_for_slot().await;

        let response = match self.download_http.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, media_key = %asset.media_key, "media download request failed");
                return AssetOutcome::Transient;
            }
        };

        let status = response.status();
        if status.as_u16() == 429 {
            return AssetOutcome::RateLimited;
        }
        if status.as_u16() == 404 || status.as_u16() == 403 {
            return AssetOutcome::Permanent;
        }
        if !status.is_success() {
            return AssetOutcome::Transient;
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let bytes = match response.bytes().await {
            Ok(b) => b.to_vec(),
            Err(e) => {
                warn!(error = %e, media_key = %asset.media_key, "failed to read media response body");
                return AssetOutcome::Transient;
            }
        };

        let ext = extension_for_content_type(&content_type);
        let ordinal = asset.media_order.unwrap_or(0);
        let key = media_key(&self.storage_env, &self.originating_system, &asset.resource_record_key, ordinal, ext);

        match self.object_store.put(&key, bytes, &content_type).await {
            Ok(_) => {
                let local_url = cdn_url(&self.gcs_cdn_base, &key);
                if let Err(e) = self.store.mark_media_downloaded(&asset.media_key, &local_url).await {
                    warn!(error = %e, media_key = %asset.media_key, "failed to record hydrated asset");
                }
                AssetOutcome::Success
            }
            Err(e) => {
                warn!(error = %e, media_key = %asset.media_key, "object store upload failed");
                AssetOutcome::Transient
            }
        }
    }
}

enum AssetOutcome {
    Success,
    RateLimited,
    Permanent,
    Transient,
}
