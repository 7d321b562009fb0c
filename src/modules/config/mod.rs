//! Process-wide configuration, loaded once at startup from environment variables.
//!
//! Follows the same shape as `JwtConfig::from_env`: every required value is read
//! eagerly and a missing/invalid one is a startup-time panic, not a runtime surprise.

use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub upstream_base_url: String,
    pub upstream_token: String,
    pub originating_system: String,

    pub database_url: String,

    pub search_endpoint: String,
    pub search_master_key: String,
    pub search_index_name: String,

    pub gcs_bucket: String,
    pub gcs_cdn_base: String,
    pub storage_prefix: String,

    pub batch_size: u64,
    pub sync_interval_minutes: u64,

    pub max_properties: Option<u64>,
    pub max_members: Option<u64>,
    pub max_offices: Option<u64>,
    pub max_openhouses: Option<u64>,

    pub reset_on_start: bool,

    pub health_host: String,
    pub health_port: u16,
}

impl AppConfig {
    /// Loads configuration from the environment. Panics with a descriptive message on
    /// any missing required value — this is the one place in the daemon where
    /// panicking is the contract (spec.md §7: configuration errors are fatal).
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            upstream_base_url: required("UPSTREAM_BASE_URL"),
            upstream_token: required("UPSTREAM_TOKEN"),
            originating_system: required("ORIGINATING_SYSTEM"),

            database_url: required("DATABASE_URL"),

            search_endpoint: required("SEARCH_ENDPOINT"),
            search_master_key: required("SEARCH_MASTER_KEY"),
            search_index_name: env::var("SEARCH_INDEX_NAME").unwrap_or_else(|_| "listings".into()),

            gcs_bucket: required("GCS_BUCKET"),
            gcs_cdn_base: required("GCS_CDN_BASE"),
            storage_prefix: env::var("STORAGE_PREFIX").unwrap_or_else(|_| "production".into()),

            batch_size: parse_u64("BATCH_SIZE", "100"),
            sync_interval_minutes: parse_u64("SYNC_INTERVAL_MINUTES", "5"),

            max_properties: parse_optional_u64("MAX_PROPERTIES"),
            max_members: parse_optional_u64("MAX_MEMBERS"),
            max_offices: parse_optional_u64("MAX_OFFICES"),
            max_openhouses: parse_optional_u64("MAX_OPENHOUSES"),

            reset_on_start: env::var("RESET_ON_START")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),

            health_host: env::var("HEALTH_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            health_port: parse_u64("HEALTH_PORT", "8080") as u16,
        }
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_minutes * 60)
    }
}

fn required(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} must be set"))
}

fn parse_u64(key: &str, default: &str) -> u64 {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<u64>()
        .unwrap_or_else(|_| panic!("Invalid {key} value"))
}

fn parse_optional_u64(key: &str) -> Option<u64> {
    env::var(key)
        .ok()
        .map(|v| v.parse::<u64>().unwrap_or_else(|_| panic!("Invalid {key} value")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // env::set_var mutates process-global state; serialize the env-dependent tests.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn sync_interval_converts_minutes_to_duration() {
        let _guard = ENV_LOCK.lock().unwrap();
        let cfg = AppConfig {
            upstream_base_url: String::new(),
            upstream_token: String::new(),
            originating_system: String::new(),
            database_url: String::new(),
            search_endpoint: String::new(),
            search_master_key: String::new(),
            search_index_name: String::new(),
            gcs_bucket: String::new(),
            gcs_cdn_base: String::new(),
            storage_prefix: String::new(),
            batch_size: 100,
            sync_interval_minutes: 5,
            max_properties: None,
            max_members: None,
            max_offices: None,
            max_openhouses: None,
            reset_on_start: false,
            health_host: String::new(),
            health_port: 8080,
        };
        assert_eq!(cfg.sync_interval(), Duration::from_secs(300));
    }

    #[test]
    fn parse_optional_u64_returns_none_when_unset() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::remove_var("MAX_PROPERTIES_TEST_KEY");
        assert_eq!(parse_optional_u64("MAX_PROPERTIES_TEST_KEY"), None);
    }

    #[test]
    fn parse_optional_u64_parses_set_value() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("MAX_PROPERTIES_TEST_KEY2", "250");
        assert_eq!(parse_optional_u64("MAX_PROPERTIES_TEST_KEY2"), Some(250));
        env::remove_var("MAX_PROPERTIES_TEST_KEY2");
    }
}
