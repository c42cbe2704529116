//! Feed-reader access.
//!
//! Provides the [`FeedSource`] trait and a Miniflux implementation. The digest
//! engine only ever sees the already-fetched [`CategoryData`] that
//! [`fetch_category_data`] assembles.

pub mod miniflux;
pub mod types;

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;

use types::{Category, Entry, Feed, FeedIcon};

/// Everything needed to build one category's digest.
#[derive(Debug, Clone)]
pub struct CategoryData {
    pub category: Category,
    pub entries: Vec<Entry>,
    pub icons: HashMap<i64, FeedIcon>,
}

/// Read side of the feed reader, plus the single write the pipeline needs.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn categories(&self) -> Result<Vec<Category>>;

    async fn unread_entries(&self, category_id: i64) -> Result<Vec<Entry>>;

    async fn category_feeds(&self, category_id: i64) -> Result<Vec<Feed>>;

    async fn feed_icon(&self, feed_id: i64) -> Result<FeedIcon>;

    async fn mark_category_as_read(&self, category_id: i64) -> Result<()>;
}

/// Create the feed source from config.
pub fn create_source(config: &crate::config::MinifluxConfig) -> Result<Box<dyn FeedSource>> {
    let client = miniflux::MinifluxClient::new(&config.host, &config.api_token)?;
    Ok(Box::new(client))
}

/// Fetch unread entries and feed icons for one category.
///
/// A missing icon is not fatal: the feed is logged and rendered without one.
pub async fn fetch_category_data(
    source: &dyn FeedSource,
    category: Category,
) -> Result<CategoryData> {
    let entries = source.unread_entries(category.id).await?;
    let feeds = source.category_feeds(category.id).await?;

    let mut icons = HashMap::with_capacity(feeds.len());
    for feed in &feeds {
        match source.feed_icon(feed.id).await {
            Ok(icon) => {
                icons.insert(feed.id, icon);
            }
            Err(e) => {
                tracing::warn!(feed_id = feed.id, feed = %feed.title, error = %e, "failed to fetch feed icon");
            }
        }
    }

    tracing::debug!(
        category = %category.title,
        entries = entries.len(),
        icons = icons.len(),
        "fetched category data"
    );

    Ok(CategoryData {
        category,
        entries,
        icons,
    })
}

/// Look up a category by ID.
pub async fn find_category(source: &dyn FeedSource, category_id: i64) -> Result<Category> {
    source
        .categories()
        .await?
        .into_iter()
        .find(|c| c.id == category_id)
        .ok_or_else(|| anyhow::anyhow!("category with ID {category_id} not found"))
}
