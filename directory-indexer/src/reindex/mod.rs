//! Background reindex worker.
//!
//! Ingestion never rebuilds the mirror inline. It asks the worker for a sweep
//! through a [`ReindexHandle`]; requests made while a sweep is already queued
//! collapse into that one. Each sweep is retried with exponential backoff.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::Retry;
use tracing::{debug, error, info, warn};

use crate::loader::{IndexMirrorBuilder, ReindexReport};

/// Default number of retries after a failed sweep.
pub const DEFAULT_REINDEX_MAX_RETRIES: usize = 3;

/// Configuration for the reindex worker.
#[derive(Debug, Clone)]
pub struct ReindexConfig {
    /// Retries after the first failed attempt of a sweep.
    pub max_retries: usize,
    /// Backoff unit; the n-th retry waits about `2^n` units.
    pub retry_base: Duration,
    /// Upper bound for a single backoff delay.
    pub retry_max_delay: Duration,
    /// Run a sweep on this period in addition to explicit requests.
    pub interval: Option<Duration>,
}

impl Default for ReindexConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_REINDEX_MAX_RETRIES,
            retry_base: Duration::from_millis(500),
            retry_max_delay: Duration::from_secs(30),
            interval: None,
        }
    }
}

/// Running totals published by the worker after every sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReindexStats {
    pub completed: u64,
    pub failed: u64,
    pub last_report: Option<ReindexReport>,
}

/// Outcome of a reindex request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReindexRequest {
    /// A new sweep was queued.
    Queued,
    /// A sweep was already queued and will cover this request.
    Coalesced,
    /// The worker has stopped.
    Closed,
}

/// Cheap, cloneable handle used to ask the worker for a sweep.
#[derive(Clone)]
pub struct ReindexHandle {
    requests: mpsc::Sender<()>,
    stats: watch::Receiver<ReindexStats>,
}

impl ReindexHandle {
    /// Ask for a sweep. Never blocks.
    pub fn request(&self) -> ReindexRequest {
        match self.requests.try_send(()) {
            Ok(()) => {
                debug!("Reindex queued");
                ReindexRequest::Queued
            }
            Err(mpsc::error::TrySendError::Full(())) => {
                debug!("Reindex already pending");
                ReindexRequest::Coalesced
            }
            Err(mpsc::error::TrySendError::Closed(())) => {
                warn!("Reindex worker is not running");
                ReindexRequest::Closed
            }
        }
    }

    pub fn stats(&self) -> ReindexStats {
        self.stats.borrow().clone()
    }

    /// Wait until at least `sweeps` sweeps have finished, successfully or not.
    pub async fn wait_for_sweeps(&self, sweeps: u64) -> ReindexStats {
        let mut stats = self.stats.clone();
        let result = match stats
            .wait_for(|s| s.completed + s.failed >= sweeps)
            .await
        {
            Ok(current) => current.clone(),
            Err(_) => self.stats(),
        };
        result
    }
}

/// Background task that runs reindex sweeps.
pub struct ReindexWorker {
    builder: Arc<IndexMirrorBuilder>,
    config: ReindexConfig,
    requests: mpsc::Receiver<()>,
    stats: watch::Sender<ReindexStats>,
}

impl ReindexWorker {
    /// Spawn the worker on the current runtime.
    ///
    /// The worker stops once every handle has been dropped.
    pub fn spawn(
        builder: Arc<IndexMirrorBuilder>,
        config: ReindexConfig,
    ) -> (ReindexHandle, JoinHandle<()>) {
        // One slot: a queued request already covers any that arrive before it runs.
        let (tx, rx) = mpsc::channel(1);
        let (stats_tx, stats_rx) = watch::channel(ReindexStats::default());

        let worker = Self {
            builder,
            config,
            requests: rx,
            stats: stats_tx,
        };
        let task = tokio::spawn(worker.run());

        (
            ReindexHandle {
                requests: tx,
                stats: stats_rx,
            },
            task,
        )
    }

    async fn run(mut self) {
        info!(
            interval_secs = self.config.interval.map(|d| d.as_secs()),
            max_retries = self.config.max_retries,
            "Reindex worker started"
        );

        let mut ticker = self.config.interval.map(|period| {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker
        });

        loop {
            let triggered = match ticker.as_mut() {
                Some(ticker) => tokio::select! {
                    request = self.requests.recv() => request.is_some(),
                    _ = ticker.tick() => true,
                },
                None => self.requests.recv().await.is_some(),
            };
            if !triggered {
                break;
            }
            self.sweep().await;
        }

        info!("Reindex worker stopped");
    }

    async fn sweep(&self) {
        // Delays of 2, 4, 8, ... times the base.
        let strategy = ExponentialBackoff::from_millis(2)
            .factor(self.config.retry_base.as_millis().max(1) as u64)
            .max_delay(self.config.retry_max_delay)
            .map(jitter)
            .take(self.config.max_retries);

        let builder = &self.builder;
        let result = Retry::spawn(strategy, move || async move {
            builder.rebuild().await.inspect_err(|e| {
                warn!(error = %e, "Reindex attempt failed");
            })
        })
        .await;

        self.stats.send_modify(|stats| match result {
            Ok(report) => {
                stats.completed += 1;
                stats.last_report = Some(report);
            }
            Err(e) => {
                error!(error = %e, "Reindex failed after retries");
                stats.failed += 1;
            }
        });
    }
}
