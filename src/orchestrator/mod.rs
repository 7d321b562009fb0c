//! Composition root's runtime: wires every adapter, runs the optional startup reset,
//! spawns the media worker, and drives the sync-cycle ticker.

use std::sync::Arc;

use tracing::{error, info};

use crate::modules::config::AppConfig;
use crate::modules::media_worker::MediaWorker;
use crate::modules::object_store::ObjectStore;
use crate::modules::progress::{reset_all, DownloadCounter, ProgressRecorder};
use crate::modules::rate_governor::{GovernorConfig, RateGovernor};
use crate::modules::relational::store::RelationalStore;
use crate::modules::search_indexer::SearchIndexer;
use crate::modules::sync::{
    run_paged_sync, DeletionsSyncDriver, ListingSyncDriver, MemberSyncDriver, OfficeSyncDriver, OpenHouseSyncDriver, SyncDriver,
};
use crate::modules::upstream_client::UpstreamClient;

pub struct Orchestrator {
    config: AppConfig,
    store: Arc<dyn RelationalStore>,
    object_store: Arc<dyn ObjectStore>,
    search: Arc<dyn SearchIndexer>,
    sync_client: UpstreamClient,
    manifest_client: Arc<UpstreamClient>,
    api_governor: Arc<RateGovernor>,
    media_governor: Arc<RateGovernor>,
    downloads: DownloadCounter,
}

impl Orchestrator {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn RelationalStore>,
        object_store: Arc<dyn ObjectStore>,
        search: Arc<dyn SearchIndexer>,
    ) -> Self {
        let api_governor = RateGovernor::new(GovernorConfig::api_default());
        let media_governor = RateGovernor::new(GovernorConfig::media_default());

        let sync_client = UpstreamClient::new(config.upstream_base_url.clone(), config.upstream_token.clone(), api_governor.clone());
        let manifest_client = Arc::new(UpstreamClient::new(
            config.upstream_base_url.clone(),
            config.upstream_token.clone(),
            api_governor.clone(),
        ));

        Self {
            config,
            store,
            object_store,
            search,
            sync_client,
            manifest_client,
            api_governor,
            media_governor,
            downloads: DownloadCounter::new(),
        }
    }

    /// Startup ordering: optional reset, ensure the search index is configured, spawn
    /// the media worker, run one sync cycle immediately, then tick on the configured
    /// interval forever.
    pub async fn run(self) {
        if self.config.reset_on_start {
            info!("reset-on-start flag set, clearing all owned state");
            reset_all(
                &self.store,
                &self.object_store,
                &self.search,
                &self.config.storage_prefix,
                &self.config.originating_system,
            )
            .await;
        }

        if let Err(e) = self.search.ensure_configured().await {
            error!(error = %e, "failed to configure search index at startup");
        }

        let worker = MediaWorker::new(
            self.store.clone(),
            self.object_store.clone(),
            self.search.clone(),
            self.manifest_client.clone(),
            self.media_governor.clone(),
            self.config.originating_system.clone(),
            self.config.storage_prefix.clone(),
            self.config.gcs_cdn_base.clone(),
            self.downloads.handle(),
        );
        tokio::spawn(async move {
            worker.run_forever().await;
        });

        let recorder = ProgressRecorder::new(self.store.clone(), self.downloads.clone());

        let mut interval = tokio::time::interval(self.config.sync_interval());
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            self.run_cycle().await;

            let api_limited = self.api_governor.snapshot().await.window_count >= GovernorConfig::api_default().hourly_cap;
            let media_limited = self.media_governor.snapshot().await.window_count >= GovernorConfig::media_default().hourly_cap;
            recorder.maybe_snapshot(api_limited, media_limited).await;
        }
    }

    /// Runs every resource driver in turn: Listings, Deletions, Members, Offices,
    /// OpenHouses. A driver that errors is logged and skipped — it never aborts the
    /// cycle or the process.
    async fn run_cycle(&self) {
        let originating_system = self.config.originating_system.clone();

        let listings = ListingSyncDriver::new(
            self.store.clone(),
            self.search.clone(),
            originating_system.clone(),
            self.config.batch_size,
            self.config.max_properties,
        );
        self.run_driver(&listings).await;

        let deletions = DeletionsSyncDriver::new(
            self.store.clone(),
            self.search.clone(),
            self.object_store.clone(),
            originating_system.clone(),
            self.config.storage_prefix.clone(),
            self.config.batch_size,
            self.config.max_properties,
        );
        self.run_driver(&deletions).await;

        let members = MemberSyncDriver::new(self.store.clone(), originating_system.clone(), self.config.batch_size, self.config.max_members);
        self.run_driver(&members).await;

        let offices = OfficeSyncDriver::new(self.store.clone(), originating_system.clone(), self.config.batch_size, self.config.max_offices);
        self.run_driver(&offices).await;

        let open_houses = OpenHouseSyncDriver::new(self.store.clone(), self.config.batch_size, self.config.max_openhouses);
        self.run_driver(&open_houses).await;
    }

    async fn run_driver(&self, driver: &dyn SyncDriver) {
        if let Err(e) = run_paged_sync(driver, &self.sync_client, &*self.store, &self.config.originating_system).await {
            error!(resource = driver.resource().as_str(), error = %e, "sync driver failed, skipping until next cycle");
        }
    }
}
