//! Long-running service: periodic digest batches, periodic archive sweeps and
//! the archive HTTP server, all stopped together on Ctrl-C.

use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::archive::retention::RetentionManager;
use crate::config::DigestConfig;
use crate::pipeline::Pipeline;
use crate::server;

const SECS_PER_HOUR: u64 = 60 * 60;
/// Longest period handed to a ticker; timer deadlines must stay representable.
const MAX_PERIOD: Duration = Duration::from_secs(100 * 365 * 24 * SECS_PER_HOUR);

/// Run until Ctrl-C or until the archive server fails.
pub async fn serve(config: DigestConfig) -> Result<()> {
    let pipeline = Pipeline::from_config(&config)?;
    let archive_dir = config.resolved_archive_dir();
    let retention = RetentionManager::new(&archive_dir, config.max_archive_age());

    let digest_every = hours(config.digest.interval_hours);
    let cleanup_every = hours(config.archive.cleanup_interval_hours);
    let start_delay = Duration::from_secs(config.digest.start_delay_secs);

    tracing::info!(
        archive = %archive_dir.display(),
        digest_every_hours = config.digest.interval_hours,
        cleanup_every_hours = config.archive.cleanup_interval_hours,
        run_on_startup = config.digest.run_on_startup,
        "scheduler starting"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let server_task = if config.server.enabled {
        let listen = config.server.listen.clone();
        Some(tokio::spawn(async move {
            server::serve(&listen, archive_dir, shutdown_signal(shutdown_rx)).await
        }))
    } else {
        tracing::info!("archive server disabled");
        None
    };
    let server_exit = async {
        match server_task {
            Some(handle) => handle
                .await
                .context("archive server task panicked")
                .and_then(|result| result),
            None => std::future::pending().await,
        }
    };

    let outcome = tokio::select! {
        _ = digest_loop(pipeline, digest_every, start_delay, config.digest.run_on_startup) => Ok(()),
        _ = cleanup_loop(retention, cleanup_every) => Ok(()),
        result = server_exit => result,
        signal = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
            signal.context("failed to listen for ctrl-c")
        }
    };

    let _ = shutdown_tx.send(true);
    outcome
}

fn hours(count: u64) -> Duration {
    Duration::from_secs(count.saturating_mul(SECS_PER_HOUR)).min(MAX_PERIOD)
}

fn shutdown_signal(mut rx: watch::Receiver<bool>) -> impl Future<Output = ()> + Send + 'static {
    async move {
        let _ = rx.wait_for(|stop| *stop).await;
    }
}

async fn digest_loop(pipeline: Pipeline, every: Duration, start_delay: Duration, run_on_startup: bool) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // the first tick fires immediately
    if !run_on_startup {
        ticker.tick().await;
    }

    loop {
        ticker.tick().await;
        match pipeline.run_batch(start_delay).await {
            Ok(report) => {
                tracing::debug!(?report, "scheduled digest batch finished");
            }
            Err(e) => {
                tracing::error!(error = %format!("{e:#}"), "scheduled digest batch failed");
            }
        }
    }
}

async fn cleanup_loop(retention: RetentionManager, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let manager = retention.clone();
        match tokio::task::spawn_blocking(move || manager.sweep(false)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "archive sweep failed"),
            Err(e) => tracing::error!(error = %e, "archive sweep task panicked"),
        }
    }
}
