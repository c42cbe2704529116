//! Per-category digest pipeline and the batch that fans it out.
//!
//! [`Pipeline::process_category`] fetches, groups, archives and notifies for one
//! category. [`Pipeline::run_batch`] runs it for every category through a bounded
//! worker pool; each category is independent and a failure in one never touches
//! the others.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use rand::Rng;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::archive::{ArchiveWriter, ArchivedDigest};
use crate::config::DigestConfig;
use crate::digest::{DigestAssembler, GroupingStrategy};
use crate::feed::types::Category;
use crate::feed::{self, FeedSource};
use crate::llm::{self, ContentGenerator};
use crate::notify::{LogNotifier, Notification, Notifier};

/// Knobs that shape one batch, split out of [`DigestConfig`].
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub strategy: GroupingStrategy,
    pub mark_as_read: bool,
    pub public_url: String,
    pub workers: usize,
    pub jitter: Duration,
}

impl PipelineSettings {
    pub fn from_config(config: &DigestConfig) -> Self {
        Self {
            strategy: config.digest.group_by,
            mark_as_read: config.digest.mark_as_read,
            public_url: config.digest.public_url.clone(),
            workers: config.digest.workers.max(1),
            jitter: Duration::from_secs(config.digest.jitter_secs),
        }
    }
}

/// What happened to one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryOutcome {
    /// No unread entries, nothing written.
    Skipped,
    Archived(ArchivedDigest),
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Shared services for digest runs. Cheap to clone.
#[derive(Clone)]
pub struct Pipeline {
    source: Arc<dyn FeedSource>,
    assembler: DigestAssembler,
    writer: ArchiveWriter,
    notifier: Arc<dyn Notifier>,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn FeedSource>,
        assembler: DigestAssembler,
        writer: ArchiveWriter,
        notifier: Arc<dyn Notifier>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            source,
            assembler,
            writer,
            notifier,
            settings,
        }
    }

    /// Wire up the Miniflux source, the Gemini generator, the archive writer and
    /// the log notifier from config.
    pub fn from_config(config: &DigestConfig) -> Result<Self> {
        config.require_miniflux()?;

        let source: Arc<dyn FeedSource> = Arc::from(feed::create_source(&config.miniflux)?);
        let generator: Arc<dyn ContentGenerator> = Arc::from(llm::create_generator(&config.ai)?);
        let assembler = DigestAssembler::new(generator, config.ai_timeout());
        let writer = ArchiveWriter::new(config.resolved_archive_dir(), config.digest.compress);

        Ok(Self::new(
            source,
            assembler,
            writer,
            Arc::new(LogNotifier),
            PipelineSettings::from_config(config),
        ))
    }

    pub fn source(&self) -> &dyn FeedSource {
        self.source.as_ref()
    }

    pub fn assembler(&self) -> &DigestAssembler {
        &self.assembler
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Fetch, group, archive and notify for one category.
    ///
    /// A category without unread entries is skipped before anything is written.
    /// Notification and mark-as-read failures are logged but do not undo the
    /// archive, which is already on disk by then.
    pub async fn process_category(&self, category: Category) -> Result<CategoryOutcome> {
        let data = feed::fetch_category_data(self.source.as_ref(), category)
            .await
            .context("failed to fetch category data")?;

        if data.entries.is_empty() {
            tracing::debug!(category = %data.category.title, "no unread entries, skipping");
            return Ok(CategoryOutcome::Skipped);
        }

        let category_id = data.category.id;
        let digest = self
            .assembler
            .build_digest_data(data.category, data.entries, data.icons, self.settings.strategy)
            .await;

        // rendering, minification and file I/O are blocking
        let writer = self.writer.clone();
        let (digest, archived) = tokio::task::spawn_blocking(move || {
            let archived = writer.write_digest(&digest);
            (digest, archived)
        })
        .await
        .context("archive task panicked")?;
        let archived = archived.context("failed to write archive")?;

        let notification = Notification::new(&digest, &archived, &self.settings.public_url);
        if let Err(e) = self.notifier.notify(&notification).await {
            tracing::warn!(category = %digest.category.title, error = %e, "failed to send notification");
        }

        if self.settings.mark_as_read {
            if let Err(e) = self.source.mark_category_as_read(category_id).await {
                tracing::warn!(category = %digest.category.title, error = %e, "failed to mark category as read");
            }
        }

        Ok(CategoryOutcome::Archived(archived))
    }

    /// Process every category concurrently, at most `workers` at a time.
    ///
    /// Each category first waits `start_delay` plus a random share of the
    /// configured jitter so runs do not hit the feed reader all at once. Only
    /// failing to list categories is an error; per-category failures are
    /// logged and counted in the report.
    pub async fn run_batch(&self, start_delay: Duration) -> Result<BatchReport> {
        let categories = self
            .source
            .categories()
            .await
            .context("failed to list categories")?;

        tracing::info!(
            categories = categories.len(),
            workers = self.settings.workers,
            strategy = %self.settings.strategy,
            "starting digest batch"
        );

        let permits = Arc::new(Semaphore::new(self.settings.workers));
        let mut tasks = JoinSet::new();

        for category in categories {
            let pipeline = self.clone();
            let permits = Arc::clone(&permits);
            let delay = start_delay + random_jitter(self.settings.jitter);

            tasks.spawn(async move {
                tokio::time::sleep(delay).await;
                let _permit = permits.acquire_owned().await?;
                let title = category.title.clone();
                let outcome = pipeline.process_category(category).await;
                if let Err(e) = &outcome {
                    tracing::error!(category = %title, error = %format!("{e:#}"), "category digest failed");
                }
                outcome
            });
        }

        let mut report = BatchReport::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(CategoryOutcome::Archived(_))) => report.processed += 1,
                Ok(Ok(CategoryOutcome::Skipped)) => report.skipped += 1,
                Ok(Err(_)) => report.failed += 1,
                Err(e) => {
                    tracing::error!(error = %e, "category task aborted");
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            processed = report.processed,
            skipped = report.skipped,
            failed = report.failed,
            "digest batch complete"
        );

        Ok(report)
    }
}

fn random_jitter(max: Duration) -> Duration {
    let max_ms = max.as_millis() as u64;
    if max_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::rng().random_range(0..max_ms))
}
