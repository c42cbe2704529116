//! Archive page rendering.
//!
//! Pages are built with `maud`, so titles, summaries and URLs are escaped at
//! interpolation. Entry bodies come from the feed reader, which already
//! sanitizes them, and are inserted as-is.

use maud::{html, Markup, PreEscaped, DOCTYPE};

use crate::digest::{DigestData, EntryGroup};
use crate::feed::types::Entry;

const STYLE: &str = r#"
body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", sans-serif; max-width: 48rem; margin: 0 auto; padding: 1rem; color: #222; }
header.digest { border-bottom: 1px solid #ddd; margin-bottom: 1rem; }
p.generated { color: #777; font-size: 0.85rem; }
p.summary { font-size: 1.05rem; line-height: 1.5; }
nav ul { list-style: none; padding: 0; display: flex; flex-wrap: wrap; gap: 0.5rem 1rem; }
section.group h2 { border-bottom: 1px solid #eee; padding-bottom: 0.25rem; }
article.entry { margin: 1.5rem 0; }
article.entry .meta { display: flex; align-items: center; gap: 0.5rem; color: #666; font-size: 0.85rem; }
article.entry img.icon { width: 16px; height: 16px; }
article.entry .content img { max-width: 100%; height: auto; }
a.comments { font-size: 0.85rem; }
"#;

/// Render a complete HTML page for a digest.
pub fn render_digest(data: &DigestData) -> String {
    let generated = data.generated_at.format("%b %-d, %Y at %H:%M").to_string();

    let page = html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (data.category.title) " digest" }
                style { (PreEscaped(STYLE)) }
            }
            body {
                header.digest {
                    h1 { (data.category.title) }
                    p.generated { "Generated " (generated) " · " (data.entries.len()) " entries" }
                    @if !data.summary.is_empty() {
                        p.summary { (data.summary) }
                    }
                }
                @if data.groups.len() > 1 {
                    nav {
                        ul {
                            @for (index, group) in data.groups.iter().enumerate() {
                                li {
                                    a href=(format!("#group-{index}")) {
                                        (group.title) " (" (group.entries.len()) ")"
                                    }
                                }
                            }
                        }
                    }
                }
                main {
                    @for (index, group) in data.groups.iter().enumerate() {
                        (render_group(data, index, group))
                    }
                }
            }
        }
    };

    page.into_string()
}

fn render_group(data: &DigestData, index: usize, group: &EntryGroup) -> Markup {
    html! {
        section.group id=(format!("group-{index}")) {
            h2 { (group.title) }
            @for entry in &group.entries {
                (render_entry(data, entry))
            }
        }
    }
}

fn render_entry(data: &DigestData, entry: &Entry) -> Markup {
    html! {
        article.entry {
            div.meta {
                @if let Some(icon) = data.icon_for(entry.feed_id) {
                    img.icon src=(icon) alt="";
                }
                span.feed { (entry.feed.title) }
                time datetime=(entry.published_at.to_rfc3339()) {
                    (entry.published_at.format("%b %-d, %Y %H:%M").to_string())
                }
            }
            h3 {
                @if entry.url.is_empty() {
                    (entry.title)
                } @else {
                    a href=(entry.url) { (entry.title) }
                }
            }
            @if let Some(comments) = &entry.comments_url {
                a.comments href=(comments) { "Comments" }
            }
            div.content { (PreEscaped(entry.content.as_str())) }
        }
    }
}
