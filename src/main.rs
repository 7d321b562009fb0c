pub mod health;
pub mod modules;
pub mod orchestrator;

use std::sync::Arc;

use sea_orm::{ConnectOptions, Database};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::modules::config::AppConfig;
use crate::modules::object_store::gcs::GcsObjectStore;
use crate::modules::relational::postgres_store::PostgresMlsStore;
use crate::modules::search_indexer::meili::MeiliSearchIndexer;
use crate::orchestrator::Orchestrator;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("starting mls replication core");

    let config = AppConfig::from_env();

    let mut opt = ConnectOptions::new(config.database_url.clone());
    opt.max_connections(20)
        .min_connections(2)
        .connect_timeout(std::time::Duration::from_secs(5))
        .acquire_timeout(std::time::Duration::from_secs(5))
        .idle_timeout(std::time::Duration::from_secs(300))
        .max_lifetime(std::time::Duration::from_secs(1800))
        .sqlx_logging(false);

    let db = Database::connect(opt)
        .await
        .expect("failed to connect to database");
    let db = Arc::new(db);

    let store = Arc::new(PostgresMlsStore::new(db.clone()));
    let object_store = Arc::new(GcsObjectStore::new(config.gcs_bucket.clone()));
    let search = Arc::new(
        MeiliSearchIndexer::new(&config.search_endpoint, &config.search_master_key, &config.search_index_name)
            .expect("failed to construct search indexer client"),
    );

    let health_host = config.health_host.clone();
    let health_port = config.health_port;

    let orchestrator = Orchestrator::new(config, store, object_store, search);

    let health_db = db.clone();
    tokio::spawn(async move {
        health::serve(health_host, health_port, health_db).await;
    });

    orchestrator.run().await;

    Ok(())
}
