//! HTML archive of generated digests.
//!
//! Every digest is written once to `{base}/{category-slug}/{YYYY-MM-DD}.html`
//! by [`ArchiveWriter`] and later evicted by [`retention::RetentionManager`]
//! once older than the configured window. The base directory is injected, never
//! global state.

pub mod inventory;
pub mod minify;
pub mod render;
pub mod retention;

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;

use crate::digest::DigestData;

/// Failures that abort archiving for one category (or one sweep).
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("failed to create archive directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to create archive file {path}: {source}")]
    CreateFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write archive file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to minify archive HTML: {0}")]
    Minify(String),
    #[error("failed to list archive base {path}: {source}")]
    ListBase {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Where a digest was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedDigest {
    pub path: PathBuf,
    /// Category bucket directory name; empty for a category without a usable title.
    pub slug: String,
    pub file_name: String,
    pub bytes: usize,
}

impl ArchivedDigest {
    /// Path relative to the archive base, with `/` separators, for URLs.
    pub fn relative_path(&self) -> String {
        if self.slug.is_empty() {
            self.file_name.clone()
        } else {
            format!("{}/{}", self.slug, self.file_name)
        }
    }
}

/// Turn a category title into a directory name.
///
/// Lower-cases ASCII, keeps `[a-z0-9]`, collapses every run of anything else
/// into one `-`, and never starts or ends with `-`. May return an empty string.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_hyphen = false;

    for c in input.chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// Writes rendered digests under a fixed base directory.
#[derive(Debug, Clone)]
pub struct ArchiveWriter {
    base_dir: PathBuf,
    minify: bool,
}

impl ArchiveWriter {
    pub fn new(base_dir: impl Into<PathBuf>, minify: bool) -> Self {
        Self {
            base_dir: base_dir.into(),
            minify,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// `{base}/{slug}/{YYYY-MM-DD}.html`
    pub fn archive_path(&self, category_title: &str, date: NaiveDate) -> PathBuf {
        let slug = slugify(category_title);
        let file_name = archive_file_name(date);
        if slug.is_empty() {
            self.base_dir.join(file_name)
        } else {
            self.base_dir.join(slug).join(file_name)
        }
    }

    /// Create (or truncate) the archive file for a category and day, creating
    /// parent directories as needed. The caller owns the returned handle.
    pub fn create_archive_file(
        &self,
        category_title: &str,
        date: NaiveDate,
    ) -> Result<(PathBuf, File), ArchiveError> {
        let path = self.archive_path(category_title, date);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ArchiveError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let file = File::create(&path).map_err(|source| ArchiveError::CreateFile {
            path: path.clone(),
            source,
        })?;
        Ok((path, file))
    }

    /// Render, optionally minify, and persist a digest.
    ///
    /// Minification runs before the file is created, so a minify failure leaves
    /// nothing on disk. A failed write removes the partial file.
    pub fn write_digest(&self, data: &DigestData) -> Result<ArchivedDigest, ArchiveError> {
        let html = render::render_digest(data);
        let bytes = if self.minify {
            minify::minify_html(html.as_bytes())?
        } else {
            html.into_bytes()
        };

        let date = data.generated_at.date_naive();
        let (path, mut file) = self.create_archive_file(&data.category.title, date)?;

        if let Err(source) = file.write_all(&bytes).and_then(|_| file.flush()) {
            drop(file);
            if let Err(e) = std::fs::remove_file(&path) {
                tracing::warn!(path = %path.display(), error = %e, "failed to remove partial archive file");
            }
            return Err(ArchiveError::Write { path, source });
        }

        tracing::info!(
            category = %data.category.title,
            path = %path.display(),
            bytes = bytes.len(),
            minified = self.minify,
            "archive written"
        );

        Ok(ArchivedDigest {
            slug: slugify(&data.category.title),
            file_name: archive_file_name(date),
            bytes: bytes.len(),
            path,
        })
    }
}

fn archive_file_name(date: NaiveDate) -> String {
    format!("{}.html", date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_examples() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("  leading and trailing spaces  "), "leading-and-trailing-spaces");
        assert_eq!(
            slugify("special!@#$%^&*()_+-=[]{}|;':,./<>?`~characters"),
            "special-characters"
        );
        assert_eq!(slugify("MixedCase Test"), "mixedcase-test");
        assert_eq!(slugify("Tech & Science 2024"), "tech-science-2024");
    }

    #[test]
    fn slugify_can_be_empty() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
        assert_eq!(slugify("!@#$%^&*()"), "");
    }

    #[test]
    fn slugify_drops_non_ascii_letters() {
        assert_eq!(slugify("Café Noir"), "caf-noir");
    }

    #[test]
    fn archive_path_layout() {
        let writer = ArchiveWriter::new("/srv/archive", true);
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(
            writer.archive_path("Tech News", date),
            PathBuf::from("/srv/archive/tech-news/2024-03-09.html")
        );
        assert_eq!(
            writer.archive_path("???", date),
            PathBuf::from("/srv/archive/2024-03-09.html")
        );
    }

    #[test]
    fn create_archive_file_makes_directories() {
        let tmp = tempfile::TempDir::new().unwrap();
        let writer = ArchiveWriter::new(tmp.path().join("nested").join("base"), false);
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();

        let (path, mut file) = writer.create_archive_file("My Feeds", date).unwrap();
        file.write_all(b"<p>hi</p>").unwrap();
        drop(file);

        assert_eq!(path, tmp.path().join("nested/base/my-feeds/2024-01-02.html"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<p>hi</p>");

        // idempotent: a second call reuses the directory and truncates the file
        let (_, file) = writer.create_archive_file("My Feeds", date).unwrap();
        drop(file);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn create_archive_file_reports_directory_failure() {
        let tmp = tempfile::TempDir::new().unwrap();
        // a regular file where the base directory should be
        let blocker = tmp.path().join("base");
        std::fs::write(&blocker, b"not a dir").unwrap();
        let writer = ArchiveWriter::new(&blocker, false);
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();

        let err = writer.create_archive_file("News", date).unwrap_err();
        assert!(matches!(err, ArchiveError::CreateDir { .. }));
    }

    #[test]
    fn relative_path_joins_slug_and_file() {
        let archived = ArchivedDigest {
            path: PathBuf::from("/a/news/2024-01-01.html"),
            slug: "news".into(),
            file_name: "2024-01-01.html".into(),
            bytes: 1,
        };
        assert_eq!(archived.relative_path(), "news/2024-01-01.html");
    }
}
