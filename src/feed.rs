// src/feed.rs
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// One feed item as returned by the aggregation API.
/// Rebuilt from scratch every poll; never persisted.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FeedEntry {
    /// Source-assigned id; can be empty or unstable in degenerate feeds.
    #[serde(default)]
    pub guid: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub title: String,
    /// Raw HTML body, only ever scanned for an image.
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
struct FeedResponse {
    // A response without `items` means zero entries, same as an empty feed.
    #[serde(default)]
    items: Vec<FeedEntry>,
}

#[async_trait]
pub trait FeedSource: Send + Sync {
    /// The newest entry of the feed (its own ordering, no re-sorting),
    /// or `None` when the feed is empty.
    async fn fetch_latest(&self) -> Result<Option<FeedEntry>>;
    fn name(&self) -> &'static str;
}

/// Build the rss2json API URL for a raw RSS feed URL.
pub fn aggregation_endpoint(rss_url: &str) -> String {
    format!(
        "https://api.rss2json.com/v1/api.json?rss_url={}",
        urlencoding::encode(rss_url)
    )
}

/// HTTP client for the rss2json aggregation API.
pub struct Rss2JsonClient {
    endpoint: String,
    client: Client,
}

impl Rss2JsonClient {
    pub fn new(endpoint: String) -> Self {
        Self {
            endpoint,
            client: Client::new(),
        }
    }

    pub fn parse_latest(body: &str) -> Result<Option<FeedEntry>> {
        let resp: FeedResponse = serde_json::from_str(body).context("parsing feed json")?;
        Ok(resp.items.into_iter().next())
    }
}

#[async_trait]
impl FeedSource for Rss2JsonClient {
    async fn fetch_latest(&self) -> Result<Option<FeedEntry>> {
        let body = self
            .client
            .get(&self.endpoint)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
            .context("feed http get")?
            .error_for_status()
            .context("feed http status")?
            .text()
            .await
            .context("feed http body")?;
        Self::parse_latest(&body)
    }

    fn name(&self) -> &'static str {
        "rss2json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_percent_encodes_the_feed_url() {
        let url = aggregation_endpoint("https://blog.google/waze/rss/");
        assert_eq!(
            url,
            "https://api.rss2json.com/v1/api.json?rss_url=https%3A%2F%2Fblog.google%2Fwaze%2Frss%2F"
        );
    }

    #[test]
    fn parse_returns_first_item() {
        let body = r#"{"items":[
            {"guid":"g1","link":"https://x/1","title":"A","description":"<p>a</p>"},
            {"guid":"g2","link":"https://x/2","title":"B","description":""}
        ]}"#;
        let latest = Rss2JsonClient::parse_latest(body).unwrap().unwrap();
        assert_eq!(latest.guid, "g1");
        assert_eq!(latest.title, "A");
    }

    #[test]
    fn missing_or_empty_items_mean_no_entry() {
        assert_eq!(Rss2JsonClient::parse_latest(r#"{"items":[]}"#).unwrap(), None);
        assert_eq!(
            Rss2JsonClient::parse_latest(r#"{"status":"ok"}"#).unwrap(),
            None
        );
    }

    #[test]
    fn item_fields_default_when_absent() {
        let body = r#"{"items":[{"title":"only a title"}]}"#;
        let latest = Rss2JsonClient::parse_latest(body).unwrap().unwrap();
        assert_eq!(latest.guid, "");
        assert_eq!(latest.link, "");
        assert_eq!(latest.description, "");
    }

    #[test]
    fn garbage_body_is_an_error() {
        assert!(Rss2JsonClient::parse_latest("<html>502</html>").is_err());
    }
}
