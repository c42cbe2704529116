use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;
use walkdir::WalkDir;

use super::ArchiveError;

/// Bucket name used for digests written directly under the base directory.
pub const UNBUCKETED: &str = "(root)";

#[derive(Debug, Default, Serialize)]
pub struct ArchiveInventory {
    pub categories: Vec<CategoryInventory>,
    pub total_files: usize,
    pub total_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryInventory {
    pub slug: String,
    pub files: usize,
    pub bytes: u64,
    /// Digest dates parsed from `YYYY-MM-DD.html` file names.
    pub oldest: Option<NaiveDate>,
    pub newest: Option<NaiveDate>,
}

impl CategoryInventory {
    fn new(slug: String) -> Self {
        Self {
            slug,
            files: 0,
            bytes: 0,
            oldest: None,
            newest: None,
        }
    }

    fn record(&mut self, bytes: u64, date: Option<NaiveDate>) {
        self.files += 1;
        self.bytes += bytes;
        if let Some(date) = date {
            self.oldest = Some(self.oldest.map_or(date, |d| d.min(date)));
            self.newest = Some(self.newest.map_or(date, |d| d.max(date)));
        }
    }
}

/// Summarize what is currently archived under `base_dir`, one entry per
/// category directory, sorted by slug.
pub fn scan(base_dir: &Path) -> Result<ArchiveInventory, ArchiveError> {
    let mut inventory = ArchiveInventory::default();

    if let Err(source) = std::fs::read_dir(base_dir) {
        if source.kind() == std::io::ErrorKind::NotFound {
            return Ok(inventory);
        }
        return Err(ArchiveError::ListBase {
            path: base_dir.to_path_buf(),
            source,
        });
    }

    let mut by_slug: BTreeMap<String, CategoryInventory> = BTreeMap::new();

    for item in WalkDir::new(base_dir).min_depth(1) {
        let entry = match item {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read archive entry, skipping");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let bytes = entry.metadata().map(|m| m.len()).unwrap_or(0);
        let slug = entry
            .path()
            .strip_prefix(base_dir)
            .ok()
            .and_then(|rel| {
                let mut parts = rel.components();
                let first = parts.next()?;
                // a file directly under the base has no category directory
                parts.next()?;
                Some(first.as_os_str().to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| UNBUCKETED.to_string());

        by_slug
            .entry(slug.clone())
            .or_insert_with(|| CategoryInventory::new(slug))
            .record(bytes, digest_date(entry.path()));

        inventory.total_files += 1;
        inventory.total_bytes += bytes;
    }

    inventory.categories = by_slug.into_values().collect();
    Ok(inventory)
}

fn digest_date(path: &Path) -> Option<NaiveDate> {
    let stem = path.file_stem()?.to_str()?;
    NaiveDate::parse_from_str(stem, "%Y-%m-%d").ok()
}
