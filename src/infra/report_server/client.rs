use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

use crate::fetch::{BasicClient, HttpClient, fetch_bytes};
use crate::services::condition_api::{ConditionApi, RoadConditionRecord};

/// Client for the report server's `road-conditions` endpoint.
pub struct ReportServerClient<C = BasicClient> {
    base_url: String,
    http: C,
}

impl ReportServerClient<BasicClient> {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self::with_client(base_url, BasicClient::new()?))
    }
}

impl<C: HttpClient> ReportServerClient<C> {
    pub fn with_client(base_url: impl Into<String>, http: C) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    /// `GET {base}/api/road-conditions?ids=a,b,c`
    pub fn conditions_url(&self, road_ids: &[String]) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/api/road-conditions", self.base_url))
            .with_context(|| format!("invalid report server url {}", self.base_url))?;
        url.query_pairs_mut().append_pair("ids", &road_ids.join(","));
        Ok(url)
    }
}

#[async_trait]
impl<C: HttpClient> ConditionApi for ReportServerClient<C> {
    async fn road_conditions(&self, road_ids: &[String]) -> Result<Vec<RoadConditionRecord>> {
        if road_ids.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.conditions_url(road_ids)?;
        let bytes = fetch_bytes(&self.http, url.as_str()).await?;
        let records: Vec<RoadConditionRecord> =
            serde_json::from_slice(&bytes).context("decoding road-condition records")?;

        debug!(requested = road_ids.len(), received = records.len(), "Road conditions fetched");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_conditions_url() {
        let client = ReportServerClient::new("http://localhost:3001/").unwrap();
        let url = client.conditions_url(&ids(&["osm-1", "osm-2"])).unwrap();
        assert_eq!(url.path(), "/api/road-conditions");
        assert_eq!(url.query(), Some("ids=osm-1%2Cosm-2"));
    }

    #[test]
    fn test_invalid_base_url() {
        let client = ReportServerClient::new("not a url").unwrap();
        assert!(client.conditions_url(&ids(&["a"])).is_err());
    }

    #[tokio::test]
    async fn test_empty_ids_skip_request() {
        // Unroutable base: any request would fail.
        let client = ReportServerClient::new("http://127.0.0.1:9").unwrap();
        assert!(client.road_conditions(&[]).await.unwrap().is_empty());
    }
}
