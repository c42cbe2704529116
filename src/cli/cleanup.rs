use anyhow::Result;

use crate::archive::retention::RetentionManager;
use crate::config::DigestConfig;

/// Run one retention sweep over the archive.
pub fn cleanup(config: &DigestConfig, dry_run: bool) -> Result<()> {
    let manager = RetentionManager::new(config.resolved_archive_dir(), config.max_archive_age());
    let report = manager.sweep(dry_run)?;

    if report.expired.is_empty() && report.dirs_removed.is_empty() {
        println!(
            "No archive files older than {} days in {}.",
            config.archive.max_age_days,
            manager.base_dir().display()
        );
        return Ok(());
    }

    if dry_run {
        println!(
            "Found {} expired file(s) (dry run, nothing deleted):\n",
            report.expired.len()
        );
        println!("{:<20} {}", "Modified", "Path");
        println!("{}", "-".repeat(80));
        for file in &report.expired {
            println!(
                "{:<20} {}",
                file.modified.format("%Y-%m-%d %H:%M"),
                file.path.display()
            );
        }
        for dir in &report.dirs_removed {
            println!("{:<20} {}/", "(empty dir)", dir.display());
        }
    } else {
        println!(
            "Deleted {} expired file(s) and {} empty director{}.",
            report.files_deleted,
            report.dirs_removed.len(),
            if report.dirs_removed.len() == 1 { "y" } else { "ies" }
        );
    }

    if report.errors > 0 {
        println!("{} item(s) could not be processed, see log for details.", report.errors);
    }

    Ok(())
}
