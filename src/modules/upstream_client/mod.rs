//! Upstream HTTP client: authenticated, rate-governed, gzip-decoding access to the
//! OData-flavored MLS feed.

pub mod backoff;

use crate::modules::rate_governor::RateGovernor;
use backoff::ExponentialBackoff;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, thiserror::Error)]
pub enum UpstreamError {
    #[error("transient upstream error: {0}")]
    Transient(String),

    #[error("upstream rate limit exhausted after internal retries")]
    RateLimited,

    #[error("upstream resource not found")]
    NotFound,

    #[error("permanent upstream error: {status} {body}")]
    Permanent { status: u16, body: String },
}

pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: String,
    bearer: String,
    governor: Arc<RateGovernor>,
    backoff: ExponentialBackoff,
}

impl UpstreamClient {
    pub fn new(base_url: String, token: String, governor: Arc<RateGovernor>) -> Self {
        let http = reqwest::Client::builder()
            .gzip(true)
            .build()
            .expect("failed to build upstream HTTP client");

        Self {
            http,
            base_url,
            bearer: format!("Bearer {token}"),
            governor,
            backoff: ExponentialBackoff::default(),
        }
    }

    /// Fetches a relative `path_and_query` (e.g. `/Property?$filter=...`) or an
    /// absolute `@odata.nextLink` URL (whose version prefix is stripped so it re-routes
    /// through the same base URL / auth as every other call).
    pub async fn fetch(&self, path_and_query: &str) -> Result<Value, UpstreamError> {
        let url = self.resolve_url(path_and_query);

        let mut attempt: u32 = 0;
        loop {
            self.governor.wait_for_slot().await;

            let response = self
                .http
                .get(&url)
                .header("Authorization", &self.bearer)
                .header("Accept-Encoding", "gzip")
                .send()
                .await
                .map_err(|e| UpstreamError::Transient(e.to_string()))?;

            let status = response.status();

            if status.is_success() {
                return response
                    .json::<Value>()
                    .await
                    .map_err(|e| UpstreamError::Transient(e.to_string()));
            }

            if status.as_u16() == 429 {
                attempt += 1;
                if attempt > self.backoff.max_attempts() {
                    return Err(UpstreamError::RateLimited);
                }

                let retry_after = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok());

                let wait = self.backoff.resolve_wait(attempt, retry_after);
                tokio::time::sleep(wait).await;
                continue;
            }

            if status.as_u16() == 404 {
                return Err(UpstreamError::NotFound);
            }

            if status.is_server_error() {
                return Err(UpstreamError::Transient(format!("status {status}")));
            }

            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Permanent {
                status: status.as_u16(),
                body,
            });
        }
    }

    /// Strips the version prefix off an absolute next-link URL so it re-routes through
    /// the same base URL this client was configured with, regardless of which host the
    /// upstream happened to put in `@odata.nextLink`.
    fn resolve_url(&self, path_and_query: &str) -> String {
        if !path_and_query.starts_with("http://") && !path_and_query.starts_with("https://") {
            let rest = path_and_query.trim_start_matches('/');
            return format!("{}/{}", self.base_url.trim_end_matches('/'), rest);
        }

        match find_resource_segment(path_and_query) {
            Some(idx) => format!(
                "{}{}",
                self.base_url.trim_end_matches('/'),
                &path_and_query[idx..]
            ),
            None => path_and_query.to_string(),
        }
    }

}

const KNOWN_RESOURCES: &[&str] = &["/Property", "/Media", "/Member", "/Office", "/OpenHouse"];

/// Finds the start of the known resource segment (`/Property`, `/Media`, ...) inside an
/// absolute next-link URL, so everything before it (scheme, host, API-version path) can
/// be discarded in favor of this client's own configured base URL.
fn find_resource_segment(url: &str) -> Option<usize> {
    KNOWN_RESOURCES
        .iter()
        .filter_map(|r| url.find(r))
        .min()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::rate_governor::GovernorConfig;

    fn client() -> UpstreamClient {
        let gov = RateGovernor::new(GovernorConfig {
            min_interval: Duration::from_millis(0),
            hourly_cap: 100_000,
        });
        UpstreamClient::new("https://api.example.com/v2".to_string(), "tok".to_string(), gov)
    }

    #[test]
    fn resolves_relative_path_against_base_url() {
        let c = client();
        assert_eq!(
            c.resolve_url("/Property?$top=10"),
            "https://api.example.com/v2/Property?$top=10"
        );
    }

    #[test]
    fn resolves_next_link_with_matching_base_url() {
        let c = client();
        let next = "https://api.example.com/v2/Property?$skiptoken=abc";
        assert_eq!(c.resolve_url(next), next);
    }

    #[test]
    fn strips_foreign_host_and_version_prefix_keeping_resource_path() {
        let c = client();
        let next = "https://cdn.upstream.example/odata/v3/Property?$skiptoken=abc";
        assert_eq!(
            c.resolve_url(next),
            "https://api.example.com/v2/Property?$skiptoken=abc"
        );
    }
}
