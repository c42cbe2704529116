//! Feed grouping: one group per source feed.

use std::collections::BTreeMap;

use async_trait::async_trait;

use super::{EntryGroup, EntryGrouper, Grouping};
use crate::feed::types::Entry;

pub struct FeedGrouper;

#[async_trait]
impl EntryGrouper for FeedGrouper {
    async fn group_entries(&self, entries: &[Entry]) -> Grouping {
        group_by_feed(entries)
    }
}

/// Group entries by feed ID, titling each group with the feed's display title.
///
/// Groups sort alphabetically by title (feeds sharing a title fall back to
/// feed ID order); entries inside a group ascend by timestamp.
pub fn group_by_feed(entries: &[Entry]) -> Grouping {
    let mut by_feed: BTreeMap<i64, EntryGroup> = BTreeMap::new();
    for entry in entries {
        by_feed
            .entry(entry.feed_id)
            .or_insert_with(|| EntryGroup {
                title: entry.feed.title.clone(),
                entries: Vec::new(),
            })
            .entries
            .push(entry.clone());
    }

    let mut groups: Vec<EntryGroup> = by_feed
        .into_values()
        .map(|mut group| {
            group.entries.sort_by_key(|e| e.published_at);
            group
        })
        .collect();
    groups.sort_by(|a, b| a.title.cmp(&b.title));

    let summary = format!(
        "You have {} entries from {} feeds",
        entries.len(),
        groups.len()
    );

    Grouping { groups, summary }
}
