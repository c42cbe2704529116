//! AI-assisted grouping.
//!
//! Sends every entry to the content-generation service and asks for topic
//! groups plus a summary. The service's answer is only trusted for entries it
//! was actually given: unknown IDs are dropped, repeated IDs keep their first
//! placement, and anything left over lands in an `Uncategorized` group. Any
//! failure (service error, timeout, unparseable answer) falls back to
//! [`group_by_day`] without surfacing an error.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::temporal::group_by_day;
use super::{EntryGroup, EntryGrouper, Grouping};
use crate::feed::types::Entry;
use crate::llm::{ContentGenerator, GenerateError};

/// Title of the catch-all group for entries the service left out.
pub const UNCATEGORIZED: &str = "Uncategorized";

const PROMPT: &str = "You are a personal news assistant that helps organize feeds from various news websites, status updates and link aggregators. Given a list of feed entries, your task is to:
1. provide a concise one paragraph 'summary' of the most important entries. it should be quick to read and informative.
2. provide a small number of 'groups' to organize each entry into. the groups could be a topic, theme or keyword relevant to the collection of entries. groups and entries have a 1 to 1 mapping.
3. a 'group.title' is the name of the group and 'group.entries' are a list of entry ids from the entry objects provided below.
4. rank the list of entry ids in each group by order of importance, relevance or interest.

Return the response as a JSON object according to the requested response schema.

Below are the entries and other relevant metadata for this task:
-----------------

";

/// JSON schema the service must answer with.
pub fn response_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "summary": {"type": "STRING"},
            "groups": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "title": {"type": "STRING"},
                        "entries": {"type": "ARRAY", "items": {"type": "INTEGER"}}
                    },
                    "required": ["title", "entries"]
                }
            }
        },
        "required": ["summary", "groups"]
    })
}

#[derive(Serialize)]
struct PromptEntry<'a> {
    id: i64,
    title: &'a str,
    url: &'a str,
    content: &'a str,
    feed_title: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct AiResponse {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub groups: Vec<AiGroup>,
}

#[derive(Debug, Deserialize)]
pub struct AiGroup {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub entries: Vec<i64>,
}

/// Why AI grouping fell back to day grouping.
#[derive(Debug)]
enum Fallback {
    Prompt(serde_json::Error),
    Service(GenerateError),
    Timeout(Duration),
    Malformed(String),
}

impl Fallback {
    /// Short tag for the log field, so service outages and bad answers can be
    /// told apart.
    fn kind(&self) -> &'static str {
        match self {
            Self::Prompt(_) => "prompt_encoding",
            Self::Service(_) => "service_error",
            Self::Timeout(_) => "timeout",
            Self::Malformed(_) => "malformed_response",
        }
    }
}

impl fmt::Display for Fallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prompt(e) => write!(f, "failed to encode entries: {e}"),
            Self::Service(e) => write!(f, "{e}"),
            Self::Timeout(limit) => write!(f, "no answer within {}s", limit.as_secs()),
            Self::Malformed(e) => write!(f, "malformed response: {e}"),
        }
    }
}

pub struct AiGrouper {
    generator: Arc<dyn ContentGenerator>,
    timeout: Duration,
}

impl AiGrouper {
    pub fn new(generator: Arc<dyn ContentGenerator>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    async fn request_grouping(&self, entries: &[Entry]) -> Result<AiResponse, Fallback> {
        let prompt = build_prompt(entries).map_err(Fallback::Prompt)?;
        let schema = response_schema();

        let answer = tokio::time::timeout(
            self.timeout,
            self.generator.generate_content(&prompt, &schema),
        )
        .await
        .map_err(|_| Fallback::Timeout(self.timeout))?
        .map_err(Fallback::Service)?;

        parse_answer(&answer).map_err(Fallback::Malformed)
    }
}

#[async_trait]
impl EntryGrouper for AiGrouper {
    async fn group_entries(&self, entries: &[Entry]) -> Grouping {
        if entries.is_empty() {
            return group_by_day(entries);
        }

        match self.request_grouping(entries).await {
            Ok(response) => {
                let grouping = resolve_groups(entries, response);
                tracing::debug!(groups = grouping.groups.len(), "AI grouping accepted");
                grouping
            }
            Err(reason) => {
                tracing::warn!(
                    reason = reason.kind(),
                    error = %reason,
                    "AI grouping failed, falling back to day grouping"
                );
                group_by_day(entries)
            }
        }
    }
}

/// Serialize the entries into the prompt sent to the service.
pub fn build_prompt(entries: &[Entry]) -> Result<String, serde_json::Error> {
    let payload: Vec<PromptEntry<'_>> = entries
        .iter()
        .map(|e| PromptEntry {
            id: e.id,
            title: &e.title,
            url: &e.url,
            content: &e.content,
            feed_title: &e.feed.title,
        })
        .collect();
    let json = serde_json::to_string_pretty(&payload)?;
    Ok(format!("{PROMPT}{json}"))
}

/// Parse the service's answer.
///
/// Only a JSON object whose `groups` is an array of objects is accepted;
/// serde alone would also take a positional array for the same structs.
pub fn parse_answer(answer: &str) -> Result<AiResponse, String> {
    let value: serde_json::Value = serde_json::from_str(answer).map_err(|e| e.to_string())?;
    let object = value.as_object().ok_or("answer is not a JSON object")?;
    let groups = object
        .get("groups")
        .and_then(|groups| groups.as_array())
        .ok_or("answer has no groups array")?;
    if !groups.iter().all(|group| group.is_object()) {
        return Err("every group must be a JSON object".into());
    }
    serde_json::from_value(value).map_err(|e| e.to_string())
}

/// Map the service's answer back onto the input entries.
///
/// Declared groups keep their order and title (duplicates stay distinct).
/// Entry IDs not in the input are ignored, and an ID already placed in an
/// earlier group is skipped. Entries the answer never mentions are appended to
/// the first group titled exactly `Uncategorized` (any case), or to a new one
/// at the end. Declared groups left with no entries are kept.
pub fn resolve_groups(entries: &[Entry], response: AiResponse) -> Grouping {
    let by_id: HashMap<i64, &Entry> = entries.iter().map(|e| (e.id, e)).collect();
    let mut placed: HashSet<i64> = HashSet::with_capacity(entries.len());
    let mut ignored = 0usize;

    let mut groups: Vec<EntryGroup> = response
        .groups
        .into_iter()
        .map(|declared| {
            let mut members = Vec::with_capacity(declared.entries.len());
            for id in declared.entries {
                match by_id.get(&id) {
                    Some(entry) if placed.insert(id) => members.push((*entry).clone()),
                    _ => ignored += 1,
                }
            }
            EntryGroup {
                title: declared.title,
                entries: members,
            }
        })
        .collect();

    if ignored > 0 {
        tracing::debug!(ignored, "AI answer referenced unknown or repeated entry IDs");
    }

    let leftovers: Vec<Entry> = entries
        .iter()
        .filter(|e| !placed.contains(&e.id))
        .cloned()
        .collect();

    if !leftovers.is_empty() {
        match groups
            .iter_mut()
            .find(|g| g.title.eq_ignore_ascii_case(UNCATEGORIZED))
        {
            Some(group) => group.entries.extend(leftovers),
            None => groups.push(EntryGroup {
                title: UNCATEGORIZED.to_string(),
                entries: leftovers,
            }),
        }
    }

    Grouping {
        groups,
        summary: response.summary,
    }
}
