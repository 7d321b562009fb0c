//! Upstream media URLs carry an `expires=<unix>` query parameter. Treat a URL as
//! expired slightly before it actually is, so a download never starts against a URL
//! that will lapse mid-transfer (spec.md §4.7).

use std::time::{Duration, SystemTime, UNIX_EPOCH};

const EXPIRY_BUFFER: Duration = Duration::from_secs(5 * 60);

pub fn is_expired(url: &str, now: SystemTime) -> bool {
    match expires_at(url) {
        Some(expires) => {
            let now_secs = now.duration_since(UNIX_EPOCH).map(|d| d.as_secs() as i64).unwrap_or(0);
            expires - now_secs < EXPIRY_BUFFER.as_secs() as i64
        }
        None => false,
    }
}

fn expires_at(url: &str) -> Option<i64> {
    let query = url.split_once('?')?.1;
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        if key == "expires" {
            value.parse::<i64>().ok()
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_without_expires_param_is_never_expired() {
        assert!(!is_expired("https://example.com/1.jpg", SystemTime::now()));
    }

    #[test]
    fn url_expiring_soon_is_treated_as_expired() {
        let now = SystemTime::now();
        let now_secs = now.duration_since(UNIX_EPOCH).unwrap().as_secs() as i64;
        let url = format!("https://example.com/1.jpg?expires={}", now_secs + 60);
        assert!(is_expired(&url, now));
    }

    #[test]
    fn url_with_ample_time_left_is_not_expired() {
        let now = SystemTime::now();
        let now_secs = now.duration_since(UNIX_EPOCH).unwrap().as_secs() as i64;
        let url = format!("https://example.com/1.jpg?expires={}", now_secs + 3600);
        assert!(!is_expired(&url, now));
    }

    #[test]
    fn already_expired_url_is_expired() {
        let now = SystemTime::now();
        let now_secs = now.duration_since(UNIX_EPOCH).unwrap().as_secs() as i64;
        let url = format!("https://example.com/1.jpg?expires={}", now_secs - 60);
        assert!(is_expired(&url, now));
    }
}
