//! Digest notifications.
//!
//! A [`Notification`] is built from the render model and the archive location
//! once a digest has been written. Delivery goes through the [`Notifier`] trait;
//! [`LogNotifier`] emits it as a structured log event.

use anyhow::Result;
use async_trait::async_trait;

use crate::archive::ArchivedDigest;
use crate::digest::DigestData;

const SUBJECT_PREFIX: &str = "[miniflux digest]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    /// Public link to the archived page, or the local path when no public URL is configured.
    pub url: String,
    pub body: String,
}

impl Notification {
    pub fn new(data: &DigestData, archived: &ArchivedDigest, public_url: &str) -> Self {
        let subject = format!("{SUBJECT_PREFIX} {}", data.category.title);

        let public_url = public_url.trim_end_matches('/');
        let url = if public_url.is_empty() {
            archived.path.display().to_string()
        } else {
            format!("{public_url}/{}", archived.relative_path())
        };

        let mut body = String::new();
        if !data.summary.is_empty() {
            body.push_str(&data.summary);
            body.push_str("\n\n");
        }
        for group in &data.groups {
            body.push_str(&format!("- {} ({})\n", group.title, group.entries.len()));
        }
        body.push_str(&format!("\nRead the full digest: {url}\n"));

        Self { subject, url, body }
    }
}

/// Delivers a notification for a written digest.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<()>;
}

/// Writes notifications to the log instead of sending them anywhere.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: &Notification) -> Result<()> {
        tracing::info!(
            subject = %notification.subject,
            url = %notification.url,
            "digest ready"
        );
        tracing::debug!(body = %notification.body, "notification body");
        Ok(())
    }
}
