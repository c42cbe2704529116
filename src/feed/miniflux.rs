//! Miniflux REST client.
//!
//! Thin wrapper over the `/v1` API, authenticated with the `X-Auth-Token` header.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::types::{Category, Entry, Feed, FeedIcon};
use super::FeedSource;

const AUTH_HEADER: &str = "X-Auth-Token";

pub struct MinifluxClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

#[derive(Deserialize)]
struct EntriesPage {
    #[serde(default)]
    entries: Vec<Entry>,
}

#[derive(Deserialize)]
struct IconPayload {
    data: String,
}

impl MinifluxClient {
    pub fn new(host: &str, token: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("fluxdigest/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: host.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1{path}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        let response = self
            .http
            .get(&url)
            .header(AUTH_HEADER, &self.token)
            .send()
            .await
            .with_context(|| format!("HTTP request failed for {url}"))?;

        anyhow::ensure!(
            response.status().is_success(),
            "GET {path} failed with HTTP {}",
            response.status()
        );

        response
            .json::<T>()
            .await
            .with_context(|| format!("invalid JSON from {path}"))
    }
}

#[async_trait]
impl FeedSource for MinifluxClient {
    async fn categories(&self) -> Result<Vec<Category>> {
        self.get_json("/categories").await
    }

    async fn unread_entries(&self, category_id: i64) -> Result<Vec<Entry>> {
        let page: EntriesPage = self
            .get_json(&format!(
                "/categories/{category_id}/entries?status=unread&order=published_at&direction=asc&limit=0"
            ))
            .await?;
        Ok(page.entries)
    }

    async fn category_feeds(&self, category_id: i64) -> Result<Vec<Feed>> {
        self.get_json(&format!("/categories/{category_id}/feeds"))
            .await
    }

    async fn feed_icon(&self, feed_id: i64) -> Result<FeedIcon> {
        let payload: IconPayload = self.get_json(&format!("/feeds/{feed_id}/icon")).await?;
        Ok(FeedIcon::new(feed_id, payload.data))
    }

    async fn mark_category_as_read(&self, category_id: i64) -> Result<()> {
        let path = format!("/categories/{category_id}/mark-all-as-read");
        let url = self.url(&path);
        let response = self
            .http
            .put(&url)
            .header(AUTH_HEADER, &self.token)
            .send()
            .await
            .with_context(|| format!("HTTP request failed for {url}"))?;

        anyhow::ensure!(
            response.status().is_success(),
            "PUT {path} failed with HTTP {}",
            response.status()
        );
        Ok(())
    }
}
