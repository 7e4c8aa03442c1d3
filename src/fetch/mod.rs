mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use std::time::Duration;

use anyhow::{Result, anyhow};
use tracing::warn;

/// Transport-level retries after the first attempt.
pub const RETRIES: u32 = 2;
const BACKOFF_MS: f64 = 400.0;
const BACKOFF_FACTOR: f64 = 1.8;

/// Delay before retry `attempt` (0-based): `400ms * 1.8^attempt`.
pub fn backoff(attempt: u32) -> Duration {
    Duration::from_millis((BACKOFF_MS * BACKOFF_FACTOR.powi(attempt as i32)).round() as u64)
}

/// GETs `url`, retrying transport errors. A non-success status is an error, not retried.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let url: reqwest::Url = url.parse()?;
    let mut attempt = 0;

    let resp = loop {
        let req = reqwest::Request::new(reqwest::Method::GET, url.clone());
        match client.execute(req).await {
            Ok(resp) => break resp,
            Err(e) if attempt < RETRIES => {
                warn!(attempt, error = %e, "Fetch failed, retrying");
                tokio::time::sleep(backoff(attempt)).await;
                attempt += 1;
            }
            Err(e) => return Err(e.into()),
        }
    };

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(anyhow!("GET {url} failed with status {status}: {body}"));
    }

    Ok(resp.bytes().await?.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_schedule() {
        assert_eq!(backoff(0), Duration::from_millis(400));
        assert_eq!(backoff(1), Duration::from_millis(720));
        assert_eq!(backoff(2), Duration::from_millis(1296));
    }

    #[tokio::test]
    async fn test_invalid_url_is_error() {
        let client = BasicClient::new().unwrap();
        assert!(fetch_bytes(&client, "not a url").await.is_err());
    }
}
