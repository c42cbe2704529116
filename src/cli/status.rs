use anyhow::Result;

use crate::archive::inventory;
use crate::config::DigestConfig;

/// Display what is currently in the archive.
pub fn status(config: &DigestConfig) -> Result<()> {
    let base_dir = config.resolved_archive_dir();
    let report = inventory::scan(&base_dir)?;

    println!("Archive Status");
    println!("{}", "=".repeat(40));
    println!("  Location:        {}", base_dir.display());
    println!("  Retention:       {} days", config.archive.max_age_days);
    println!("  Total files:     {}", report.total_files);
    println!("  Total size:      {} bytes", report.total_bytes);
    println!();

    if report.categories.is_empty() {
        println!("No archived digests yet.");
        return Ok(());
    }

    println!(
        "{:<30} {:>6} {:>12} {:<12} {:<12}",
        "Category", "Files", "Bytes", "Oldest", "Newest"
    );
    println!("{}", "-".repeat(76));
    for c in &report.categories {
        let oldest = c.oldest.map(|d| d.to_string()).unwrap_or_else(|| "-".into());
        let newest = c.newest.map(|d| d.to_string()).unwrap_or_else(|| "-".into());
        println!(
            "{:<30} {:>6} {:>12} {:<12} {:<12}",
            c.slug, c.files, c.bytes, oldest, newest
        );
    }

    Ok(())
}
