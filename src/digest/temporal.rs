//! Day grouping: one group per publication date.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;

use super::{EntryGroup, EntryGrouper, Grouping};
use crate::feed::types::Entry;

pub struct DayGrouper;

#[async_trait]
impl EntryGrouper for DayGrouper {
    async fn group_entries(&self, entries: &[Entry]) -> Grouping {
        group_by_day(entries)
    }
}

/// Group entries by the calendar day of their publication time, in the zone
/// each timestamp carries.
///
/// Groups ascend by date; entries inside a group ascend by timestamp, with
/// equal timestamps kept in input order.
pub fn group_by_day(entries: &[Entry]) -> Grouping {
    let mut by_day: BTreeMap<NaiveDate, Vec<Entry>> = BTreeMap::new();
    for entry in entries {
        by_day
            .entry(entry.published_at.date_naive())
            .or_default()
            .push(entry.clone());
    }

    let groups: Vec<EntryGroup> = by_day
        .into_iter()
        .map(|(day, mut members)| {
            members.sort_by_key(|e| e.published_at);
            EntryGroup {
                title: day_title(day),
                entries: members,
            }
        })
        .collect();

    let summary = format!(
        "You have {} entries from {} different days",
        entries.len(),
        groups.len()
    );

    Grouping { groups, summary }
}

/// Human-readable day title, e.g. `Jan 2, 2006`.
pub fn day_title(day: NaiveDate) -> String {
    day.format("%b %-d, %Y").to_string()
}
