//! Background Expiry Sweeper
//!
//! This module implements a background task that periodically removes
//! expired entries. This is called "active expiry" as opposed to "lazy
//! expiry" (which happens on access inside [`ExpirationEngine::get`]).
//!
//! ## Why Do We Need This?
//!
//! Lazy expiry is cheap but only fires for keys that are read again.
//! A key that expires and is never touched would sit in storage forever.
//!
//! ## Design
//!
//! The sweeper runs as a Tokio task and:
//! 1. Runs a sweep straight away
//! 2. Sleeps for `interval` (default: 60s) after a successful sweep,
//!    or `retry_backoff` (default: 5s) after a failed one
//! 3. Repeats until told to stop
//!
//! The sweeper never calls into request handlers and they never call into
//! it; the two only meet at the store. A failed sweep is logged and retried,
//! it never ends the loop.

use crate::expiry::ExpirationEngine;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, warn, Span};

/// Configuration for the expiry sweeper.
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    /// Interval between successful sweeps (default: 60s)
    pub interval: Duration,

    /// Wait before retrying after a failed sweep (default: 5s)
    pub retry_backoff: Duration,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            retry_backoff: Duration::from_secs(5),
        }
    }
}

/// Running totals kept by the sweeper task.
#[derive(Debug, Default)]
pub struct SweeperStats {
    runs: AtomicU64,
    failures: AtomicU64,
    removed: AtomicU64,
}

/// A copy of [`SweeperStats`] at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SweeperSnapshot {
    /// Sweeps attempted, failed ones included
    pub runs: u64,
    /// Sweeps that returned an error
    pub failures: u64,
    /// Entries removed across all sweeps
    pub removed: u64,
}

impl SweeperStats {
    pub fn snapshot(&self) -> SweeperSnapshot {
        SweeperSnapshot {
            runs: self.runs.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            removed: self.removed.load(Ordering::Relaxed),
        }
    }
}

/// A handle to the running expiry sweeper.
///
/// When this handle is dropped, the sweeper task will be stopped.
#[derive(Debug)]
pub struct ExpirySweeper {
    /// Sender to signal shutdown
    shutdown_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
    stats: Arc<SweeperStats>,
    span: Span,
}

impl ExpirySweeper {
    /// Starts the expiry sweeper as a background task.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use ttlkv::expiry::{ExpirationEngine, ExpirySweeper, SweeperConfig};
    /// use ttlkv::storage::StorageEngine;
    /// use std::sync::Arc;
    ///
    /// let engine = Arc::new(ExpirationEngine::new(Arc::new(StorageEngine::new())));
    /// let sweeper = ExpirySweeper::start(engine, SweeperConfig::default());
    ///
    /// // Sweeper runs in the background...
    ///
    /// sweeper.shutdown().await;
    /// ```
    pub fn start(engine: Arc<ExpirationEngine>, config: SweeperConfig) -> Self {
        Self::start_with_span(engine, config, info_span!("sweeper"))
    }

    /// Like [`ExpirySweeper::start`], with diagnostics parented to `span`.
    pub fn start_with_span(
        engine: Arc<ExpirationEngine>,
        config: SweeperConfig,
        span: Span,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let stats = Arc::new(SweeperStats::default());

        info!(
            parent: &span,
            interval_secs = config.interval.as_secs_f64(),
            retry_backoff_secs = config.retry_backoff.as_secs_f64(),
            "Background expiry sweeper started"
        );

        let task = tokio::spawn(sweeper_loop(
            engine,
            config,
            Arc::clone(&stats),
            span.clone(),
            shutdown_rx,
        ));

        Self {
            shutdown_tx,
            task: Some(task),
            stats,
            span,
        }
    }

    /// Shared counters, readable while the sweeper runs.
    pub fn stats(&self) -> Arc<SweeperStats> {
        Arc::clone(&self.stats)
    }

    /// Signals the sweeper to stop.
    ///
    /// A sweep already in progress finishes; no new one starts.
    /// This is called automatically when the handle is dropped.
    pub fn stop(&self) {
        if !self.shutdown_tx.send_replace(true) {
            debug!(parent: &self.span, "Background expiry sweeper signalled to stop");
        }
    }

    /// Signals the sweeper to stop and waits for the task to exit.
    pub async fn shutdown(mut self) {
        self.stop();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(parent: &self.span, error = %e, "Expiry sweeper task ended abnormally");
            }
        }
        info!(parent: &self.span, "Background expiry sweeper stopped");
    }
}

impl Drop for ExpirySweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The main sweeper loop.
async fn sweeper_loop(
    engine: Arc<ExpirationEngine>,
    config: SweeperConfig,
    stats: Arc<SweeperStats>,
    span: Span,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        if *shutdown_rx.borrow() {
            debug!(parent: &span, "Expiry sweeper received shutdown signal");
            return;
        }

        stats.runs.fetch_add(1, Ordering::Relaxed);

        // Shard locks block, so the sweep runs off the async workers
        let sweeping = Arc::clone(&engine);
        let result = match tokio::task::spawn_blocking(move || sweeping.sweep()).await {
            Ok(result) => result.map_err(|e| e.to_string()),
            Err(e) => Err(format!("sweep task failed: {}", e)),
        };

        let wait = match result {
            Ok(removed) => {
                stats.removed.fetch_add(removed, Ordering::Relaxed);
                if removed > 0 {
                    info!(parent: &span, removed, "Deleted expired keys");
                } else {
                    debug!(parent: &span, "No expired keys to delete");
                }
                config.interval
            }
            Err(e) => {
                stats.failures.fetch_add(1, Ordering::Relaxed);
                error!(
                    parent: &span,
                    error = %e,
                    retry_in_ms = config.retry_backoff.as_millis() as u64,
                    "Expiry sweep failed"
                );
                config.retry_backoff
            }
        };

        // Wait for the next run or the shutdown signal
        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!(parent: &span, "Expiry sweeper received shutdown signal");
                    return;
                }
            }
        }
    }
}

/// Starts the expiry sweeper with default configuration.
pub fn start_expiry_sweeper(engine: Arc<ExpirationEngine>) -> ExpirySweeper {
    ExpirySweeper::start(engine, SweeperConfig::default())
}
