use anyhow::Result;

use crate::archive::render;
use crate::config::DigestConfig;
use crate::digest::GroupingStrategy;
use crate::feed;
use crate::pipeline::Pipeline;

/// Fetch and group one category, then print the rendered page to stdout.
///
/// Nothing is archived, no notification is sent and nothing is marked read.
pub async fn preview(
    config: &DigestConfig,
    category_id: i64,
    group_by: Option<GroupingStrategy>,
) -> Result<()> {
    let pipeline = Pipeline::from_config(config)?;
    let strategy = group_by.unwrap_or(pipeline.settings().strategy);

    let category = feed::find_category(pipeline.source(), category_id).await?;
    let data = feed::fetch_category_data(pipeline.source(), category).await?;

    if data.entries.is_empty() {
        eprintln!("Category \"{}\" has no unread entries.", data.category.title);
        return Ok(());
    }

    let digest = pipeline
        .assembler()
        .build_digest_data(data.category, data.entries, data.icons, strategy)
        .await;

    println!("{}", render::render_digest(&digest));
    Ok(())
}
