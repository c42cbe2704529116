use std::time::Duration;

use anyhow::Result;

use crate::config::DigestConfig;
use crate::pipeline::Pipeline;

/// Run one digest batch for every category right away, then exit.
pub async fn run_once(config: &DigestConfig) -> Result<()> {
    let pipeline = Pipeline::from_config(config)?;

    println!(
        "Running digest batch (group by {}, {} workers)...",
        pipeline.settings().strategy,
        pipeline.settings().workers
    );
    let report = pipeline.run_batch(Duration::ZERO).await?;

    println!("  Archived:  {}", report.processed);
    println!("  Skipped:   {} (no unread entries)", report.skipped);
    println!("  Failed:    {}", report.failed);

    anyhow::ensure!(
        report.failed == 0,
        "{} categor{} failed, see log for details",
        report.failed,
        if report.failed == 1 { "y" } else { "ies" }
    );
    Ok(())
}
