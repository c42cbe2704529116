#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{FixedOffset, TimeZone};

use fluxdigest::feed::types::{Category, Entry, Feed, FeedIcon};
use fluxdigest::feed::FeedSource;
use fluxdigest::llm::{ContentGenerator, GenerateError};
use fluxdigest::notify::{Notification, Notifier};

/// Build an entry published at `2024-01-{day} {hour}:00` in the given UTC offset.
pub fn entry_at(id: i64, feed_id: i64, day: u32, hour: u32, offset_hours: i32) -> Entry {
    Entry {
        id,
        feed_id,
        title: format!("Entry {id}"),
        url: format!("https://example.com/{id}"),
        content: format!("<p>Body of entry {id}</p>"),
        published_at: FixedOffset::east_opt(offset_hours * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 1, day, hour, 0, 0)
            .unwrap(),
        comments_url: None,
        feed: Feed {
            id: feed_id,
            title: format!("Feed {feed_id}"),
            site_url: String::new(),
        },
    }
}

/// Same as [`entry_at`] in UTC.
pub fn entry(id: i64, feed_id: i64, day: u32, hour: u32) -> Entry {
    entry_at(id, feed_id, day, hour, 0)
}

pub fn with_feed_title(mut entry: Entry, title: &str) -> Entry {
    entry.feed.title = title.to_string();
    entry
}

pub fn category(id: i64, title: &str) -> Category {
    Category {
        id,
        title: title.to_string(),
    }
}

// ── Content generators ───────────────────────────────────────────────────────

/// Always answers with the same text.
pub struct FixedGenerator(pub String);

#[async_trait]
impl ContentGenerator for FixedGenerator {
    async fn generate_content(
        &self,
        _prompt: &str,
        _schema: &serde_json::Value,
    ) -> Result<String, GenerateError> {
        Ok(self.0.clone())
    }
}

/// Always fails as if no API key were configured.
pub struct DisabledGenerator;

#[async_trait]
impl ContentGenerator for DisabledGenerator {
    async fn generate_content(
        &self,
        _prompt: &str,
        _schema: &serde_json::Value,
    ) -> Result<String, GenerateError> {
        Err(GenerateError::Disabled)
    }
}

/// Answers only after `delay`.
pub struct SlowGenerator {
    pub delay: Duration,
    pub answer: String,
}

#[async_trait]
impl ContentGenerator for SlowGenerator {
    async fn generate_content(
        &self,
        _prompt: &str,
        _schema: &serde_json::Value,
    ) -> Result<String, GenerateError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.answer.clone())
    }
}

// ── Feed source ──────────────────────────────────────────────────────────────

/// In-memory feed reader.
#[derive(Default)]
pub struct StubSource {
    pub categories: Vec<Category>,
    pub entries: HashMap<i64, Vec<Entry>>,
    pub icons: HashMap<i64, FeedIcon>,
    /// Categories whose entry listing fails.
    pub failing: Vec<i64>,
    /// Delay inside every entry listing, to make overlap observable.
    pub fetch_delay: Duration,
    pub marked_read: Mutex<Vec<i64>>,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl StubSource {
    pub fn with_category(mut self, category: Category, entries: Vec<Entry>) -> Self {
        self.entries.insert(category.id, entries);
        self.categories.push(category);
        self
    }

    pub fn marked(&self) -> Vec<i64> {
        let mut marked = self.marked_read.lock().unwrap().clone();
        marked.sort();
        marked
    }
}

#[async_trait]
impl FeedSource for StubSource {
    async fn categories(&self) -> Result<Vec<Category>> {
        Ok(self.categories.clone())
    }

    async fn unread_entries(&self, category_id: i64) -> Result<Vec<Entry>> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.fetch_delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(&category_id) {
            bail!("reader unavailable for category {category_id}");
        }
        Ok(self.entries.get(&category_id).cloned().unwrap_or_default())
    }

    async fn category_feeds(&self, category_id: i64) -> Result<Vec<Feed>> {
        let mut feeds: Vec<Feed> = self
            .entries
            .get(&category_id)
            .into_iter()
            .flatten()
            .map(|e| e.feed.clone())
            .collect();
        feeds.sort_by_key(|f| f.id);
        feeds.dedup_by_key(|f| f.id);
        Ok(feeds)
    }

    async fn feed_icon(&self, feed_id: i64) -> Result<FeedIcon> {
        match self.icons.get(&feed_id) {
            Some(icon) => Ok(icon.clone()),
            None => bail!("no icon for feed {feed_id}"),
        }
    }

    async fn mark_category_as_read(&self, category_id: i64) -> Result<()> {
        self.marked_read.lock().unwrap().push(category_id);
        Ok(())
    }
}

// ── Notifier ─────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn subjects(&self) -> Vec<String> {
        let mut subjects: Vec<String> = self
            .sent
            .lock()
            .unwrap()
            .iter()
            .map(|n| n.subject.clone())
            .collect();
        subjects.sort();
        subjects
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: &Notification) -> Result<()> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}
