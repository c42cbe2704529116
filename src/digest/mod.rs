//! Digest assembly.
//!
//! A digest is one category's unread entries split into titled groups plus a
//! one-line summary. Grouping is pluggable through [`EntryGrouper`]; the three
//! strategies are selected by [`GroupingStrategy`] and built by [`create_grouper`].
//! [`DigestAssembler`] runs the selected grouper and stamps the result into a
//! [`DigestData`] render model.

pub mod ai;
pub mod source;
pub mod temporal;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::feed::types::{Category, Entry, FeedIcon};
use crate::llm::ContentGenerator;

/// How entries are clustered into groups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingStrategy {
    /// One group per publication day, oldest day first.
    #[default]
    Day,
    /// One group per feed, alphabetical by feed title.
    Feed,
    /// Topic groups proposed by the content-generation service.
    Ai,
}

impl GroupingStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Feed => "feed",
            Self::Ai => "ai",
        }
    }
}

impl std::fmt::Display for GroupingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for GroupingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(Self::Day),
            "feed" => Ok(Self::Feed),
            "ai" => Ok(Self::Ai),
            _ => Err(format!("unknown grouping strategy: {s} (expected day, feed or ai)")),
        }
    }
}

/// A titled, ordered run of entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryGroup {
    pub title: String,
    pub entries: Vec<Entry>,
}

/// Output of a grouper: ordered groups and the one-line summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grouping {
    pub groups: Vec<EntryGroup>,
    pub summary: String,
}

/// Clusters a category's entries into groups.
///
/// Implementations never fail: every input entry lands in exactly one group.
#[async_trait]
pub trait EntryGrouper: Send + Sync {
    async fn group_entries(&self, entries: &[Entry]) -> Grouping;
}

/// Create the grouper for a strategy.
///
/// `generator` and `ai_timeout` are only used by [`GroupingStrategy::Ai`].
pub fn create_grouper(
    strategy: GroupingStrategy,
    generator: Arc<dyn ContentGenerator>,
    ai_timeout: Duration,
) -> Box<dyn EntryGrouper> {
    match strategy {
        GroupingStrategy::Day => Box::new(temporal::DayGrouper),
        GroupingStrategy::Feed => Box::new(source::FeedGrouper),
        GroupingStrategy::Ai => Box::new(ai::AiGrouper::new(generator, ai_timeout)),
    }
}

/// Everything the archive renderer and the notifier need for one category.
#[derive(Debug, Clone, Serialize)]
pub struct DigestData {
    pub category: Category,
    pub entries: Vec<Entry>,
    /// When the digest was assembled; keys the archive file's date.
    pub generated_at: DateTime<Local>,
    pub icons: Vec<FeedIcon>,
    pub groups: Vec<EntryGroup>,
    pub summary: String,
}

impl DigestData {
    /// Icon data URI for a feed, if one was fetched.
    pub fn icon_for(&self, feed_id: i64) -> Option<&str> {
        self.icons
            .iter()
            .find(|icon| icon.feed_id == feed_id)
            .map(|icon| icon.data.as_str())
    }
}

/// Builds [`DigestData`] from fetched category data.
#[derive(Clone)]
pub struct DigestAssembler {
    generator: Arc<dyn ContentGenerator>,
    ai_timeout: Duration,
}

impl DigestAssembler {
    pub fn new(generator: Arc<dyn ContentGenerator>, ai_timeout: Duration) -> Self {
        Self {
            generator,
            ai_timeout,
        }
    }

    /// Group the entries with the selected strategy and stamp the render model.
    ///
    /// The generation time is taken when this is called, not when the entries
    /// were fetched. Grouping failures never surface here; the AI grouper
    /// absorbs them by falling back to day grouping.
    pub async fn build_digest_data(
        &self,
        category: Category,
        entries: Vec<Entry>,
        icons: HashMap<i64, FeedIcon>,
        strategy: GroupingStrategy,
    ) -> DigestData {
        let generated_at = Local::now();

        let mut icons: Vec<FeedIcon> = icons.into_values().collect();
        icons.sort_by_key(|icon| icon.feed_id);

        let grouper = create_grouper(strategy, Arc::clone(&self.generator), self.ai_timeout);
        let Grouping { groups, summary } = grouper.group_entries(&entries).await;

        tracing::info!(
            category = %category.title,
            strategy = %strategy,
            entries = entries.len(),
            groups = groups.len(),
            "digest assembled"
        );

        DigestData {
            category,
            entries,
            generated_at,
            icons,
            groups,
            summary,
        }
    }
}
