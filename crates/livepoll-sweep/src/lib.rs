//! Fixed-interval sweep scheduler for Livepoll.
//!
//! The server runs two background sweeps over the room store: a fast
//! expiry sweep that announces polls whose voting window has closed, and
//! a slow reaper that evicts rooms long after they ended. Both are driven
//! by a [`SweepScheduler`].
//!
//! # Disabled mode
//!
//! When `interval` is zero, [`SweepScheduler::wait_for_sweep`] pends
//! forever. A sweep task built on a disabled scheduler simply never runs.
//!
//! # Integration
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         _ = shutdown.changed() => break,
//!         info = scheduler.wait_for_sweep() => {
//!             let evicted = engine.lock().await.reap(Utc::now());
//!             scheduler.record_sweep_end();
//!         }
//!     }
//! }
//! ```

use std::time::{Duration, Instant};

use rand::Rng;
use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for a sweep scheduler.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Time between sweeps. Zero disables the scheduler.
    pub interval: Duration,
    /// Random delay (0–max) added to the *first* sweep so sweeps started
    /// together don't all fire on the same instant.
    pub initial_jitter: Duration,
    /// Warn when a sweep's work takes longer than this fraction of the
    /// interval (0.0–1.0).
    pub budget_warn_fraction: f64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval: Duration::ZERO,
            initial_jitter: Duration::from_millis(50),
            budget_warn_fraction: 0.5,
        }
    }
}

impl SweepConfig {
    /// Shortest non-zero interval accepted.
    pub const MIN_INTERVAL: Duration = Duration::from_millis(10);

    /// A config sweeping every `interval` with default settings.
    pub fn every(interval: Duration) -> Self {
        Self {
            interval,
            ..Default::default()
        }
    }

    /// Clamps out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`SweepScheduler::new`]:
    /// - a non-zero `interval` is raised to at least [`Self::MIN_INTERVAL`];
    /// - `initial_jitter` is capped at one interval;
    /// - `budget_warn_fraction` is clamped to `0.0..=1.0`.
    pub fn validated(mut self) -> Self {
        if !self.interval.is_zero() && self.interval < Self::MIN_INTERVAL {
            warn!(
                interval_ms = self.interval.as_millis() as u64,
                min_ms = Self::MIN_INTERVAL.as_millis() as u64,
                "sweep interval below minimum, clamping"
            );
            self.interval = Self::MIN_INTERVAL;
        }
        if self.initial_jitter > self.interval {
            self.initial_jitter = self.interval;
        }
        self.budget_warn_fraction = self.budget_warn_fraction.clamp(0.0, 1.0);
        self
    }

    /// Whether this config never fires.
    pub fn is_disabled(&self) -> bool {
        self.interval.is_zero()
    }
}

// ---------------------------------------------------------------------------
// Sweep info
// ---------------------------------------------------------------------------

/// Information about a sweep that just came due.
#[derive(Debug, Clone)]
pub struct SweepInfo {
    /// Monotonically increasing sweep number (starts at 1).
    pub sweep: u64,
    /// `true` if the scheduler woke up late by more than one interval.
    pub overrun: bool,
    /// Sweeps that were not run because the scheduler fell behind.
    /// Missed sweeps are never replayed; the next one covers them.
    pub sweeps_skipped: u64,
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Runtime metrics for a sweep scheduler.
#[derive(Debug, Clone, Default)]
pub struct SweepMetrics {
    pub total_sweeps: u64,
    pub total_overruns: u64,
    pub total_skipped: u64,
    /// Work time of the most recent sweep, as reported by
    /// [`SweepScheduler::record_sweep_end`].
    pub last_sweep_time: Duration,
    pub max_sweep_time: Duration,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Fixed-interval sweep scheduler. One per background task.
pub struct SweepScheduler {
    name: &'static str,
    config: SweepConfig,
    sweep_count: u64,
    /// When the next sweep should fire.
    next_sweep: Option<TokioInstant>,
    /// When the current sweep's work started; consumed by `record_sweep_end`.
    sweep_start: Option<Instant>,
    metrics: SweepMetrics,
}

impl SweepScheduler {
    /// Creates a scheduler. `name` only appears in log fields.
    pub fn new(name: &'static str, config: SweepConfig) -> Self {
        let config = config.validated();

        let next_sweep = (!config.is_disabled()).then(|| {
            let max_us = config.initial_jitter.as_micros() as u64;
            let jitter = if max_us == 0 {
                Duration::ZERO
            } else {
                Duration::from_micros(rand::rng().random_range(0..max_us))
            };
            TokioInstant::now() + config.interval + jitter
        });

        if config.is_disabled() {
            debug!(sweep = name, "sweep scheduler disabled (zero interval)");
        } else {
            debug!(
                sweep = name,
                interval_ms = config.interval.as_millis() as u64,
                "sweep scheduler created"
            );
        }

        Self {
            name,
            config,
            sweep_count: 0,
            next_sweep,
            sweep_start: None,
            metrics: SweepMetrics::default(),
        }
    }

    /// A scheduler sweeping every `interval` with default settings.
    pub fn every(name: &'static str, interval: Duration) -> Self {
        Self::new(name, SweepConfig::every(interval))
    }

    /// Waits until the next sweep is due.
    ///
    /// Pends forever when disabled; inside `tokio::select!` the other
    /// branches keep running.
    pub async fn wait_for_sweep(&mut self) -> SweepInfo {
        let Some(next) = self.next_sweep else {
            return std::future::pending::<SweepInfo>().await;
        };
        let interval = self.config.interval;

        time::sleep_until(next).await;

        let now = TokioInstant::now();
        self.sweep_count += 1;
        self.sweep_start = Some(Instant::now());

        let late_by = now.saturating_duration_since(next);
        let sweeps_skipped =
            (late_by.as_nanos() / interval.as_nanos().max(1)) as u64;
        let overrun = sweeps_skipped > 0;
        if overrun {
            warn!(
                sweep = self.name,
                count = self.sweep_count,
                skipped = sweeps_skipped,
                late_ms = late_by.as_millis() as u64,
                "sweep fell behind, skipping ahead"
            );
            self.metrics.total_overruns += 1;
        }

        // Always schedule from now, never from the missed deadline.
        self.next_sweep = Some(now + interval);
        self.metrics.total_sweeps += 1;
        self.metrics.total_skipped += sweeps_skipped;

        trace!(sweep = self.name, count = self.sweep_count, "sweep due");

        SweepInfo {
            sweep: self.sweep_count,
            overrun,
            sweeps_skipped,
        }
    }

    /// Records that the work for the current sweep has finished.
    ///
    /// Without this call, budget warnings and sweep-time metrics are not
    /// updated.
    pub fn record_sweep_end(&mut self) {
        let Some(start) = self.sweep_start.take() else {
            return;
        };
        let elapsed = start.elapsed();

        let budget = self
            .config
            .interval
            .mul_f64(self.config.budget_warn_fraction);
        if elapsed > budget {
            warn!(
                sweep = self.name,
                count = self.sweep_count,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                budget_ms = budget.as_secs_f64() * 1000.0,
                "sweep exceeded its time budget"
            );
        }

        self.metrics.last_sweep_time = elapsed;
        if elapsed > self.metrics.max_sweep_time {
            self.metrics.max_sweep_time = elapsed;
        }
    }

    /// Whether this scheduler never fires (zero interval).
    pub fn is_disabled(&self) -> bool {
        self.config.is_disabled()
    }

    pub fn sweep_count(&self) -> u64 {
        self.sweep_count
    }

    pub fn metrics(&self) -> &SweepMetrics {
        &self.metrics
    }

    pub fn interval(&self) -> Duration {
        self.config.interval
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}
