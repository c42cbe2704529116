//! Feed-reader record definitions.
//!
//! Defines [`Category`] (the unit of digest and archive generation), [`Feed`]
//! (the source an entry belongs to), [`Entry`] (one unread article) and
//! [`FeedIcon`] (a feed's icon as a data URI). Field names follow the Miniflux
//! JSON API so the records deserialize straight from responses.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// A user-defined bucket of feeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub title: String,
}

/// The origin publication of an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feed {
    pub id: i64,
    pub title: String,
    /// Homepage of the publication, if the reader knows it.
    #[serde(default)]
    pub site_url: String,
}

/// A single feed article. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: i64,
    pub feed_id: i64,
    pub title: String,
    #[serde(default)]
    pub url: String,
    /// Article body; may contain markup.
    #[serde(default)]
    pub content: String,
    /// Publication time, kept in the zone the reader reported it in.
    pub published_at: DateTime<FixedOffset>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub comments_url: Option<String>,
    /// The owning feed, embedded by the reader in every entry.
    pub feed: Feed,
}

/// A feed's icon, already encoded as a `data:` URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedIcon {
    pub feed_id: i64,
    pub data: String,
}

impl FeedIcon {
    /// Build an icon, normalizing the reader's `image/png;base64,...` payload
    /// into a full `data:` URI.
    pub fn new(feed_id: i64, data: impl Into<String>) -> Self {
        let data = data.into();
        let data = if data.starts_with("data:") {
            data
        } else {
            format!("data:{data}")
        };
        Self { feed_id, data }
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}
