// Performance metrics module
//
// Provides lightweight metrics tracking for the submission workflow

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Workflow metrics
///
/// Uses atomic operations for thread-safe metric tracking without locks.
/// The preview counters double as a leak check: on shutdown, created minus
/// released must be at most one.
#[derive(Debug)]
pub struct Metrics {
    /// Submissions that put a request on the wire
    pub submissions_started: AtomicU64,

    /// Requests the server answered with well-formed JSON
    pub submissions_succeeded: AtomicU64,

    /// Requests that ended in a transport failure
    pub submissions_failed: AtomicU64,

    /// `submit()` calls rejected by the guard (no image, or already in flight)
    pub submissions_ignored: AtomicU64,

    /// Preview handles allocated
    pub previews_created: AtomicU64,

    /// Preview handles released
    pub previews_released: AtomicU64,

    /// Total time spent waiting for the inference service in milliseconds
    pub total_inference_time_ms: AtomicU64,

    /// Application start time
    start_time: Instant,
}

impl Metrics {
    /// Create a new Metrics instance
    pub fn new() -> Self {
        Self {
            submissions_started: AtomicU64::new(0),
            submissions_succeeded: AtomicU64::new(0),
            submissions_failed: AtomicU64::new(0),
            submissions_ignored: AtomicU64::new(0),
            previews_created: AtomicU64::new(0),
            previews_released: AtomicU64::new(0),
            total_inference_time_ms: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_submission_started(&self) {
        self.submissions_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_submission_succeeded(&self) {
        self.submissions_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_submission_failed(&self) {
        self.submissions_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_submission_ignored(&self) {
        self.submissions_ignored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_preview_created(&self) {
        self.previews_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_preview_released(&self) {
        self.previews_released.fetch_add(1, Ordering::Relaxed);
    }

    /// Record how long one inference request took
    pub fn record_inference_time(&self, duration: Duration) {
        self.total_inference_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    /// Get total uptime
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Preview handles allocated but not yet released
    pub fn live_previews(&self) -> u64 {
        self.previews_created
            .load(Ordering::Relaxed)
            .saturating_sub(self.previews_released.load(Ordering::Relaxed))
    }

    /// Get average inference time per completed request in milliseconds
    pub fn avg_inference_time_ms(&self) -> f64 {
        let total = self.total_inference_time_ms.load(Ordering::Relaxed);
        let count = self.submissions_succeeded.load(Ordering::Relaxed)
            + self.submissions_failed.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        let uptime = self.uptime();
        tracing::info!("=== Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", uptime.as_secs_f64());
        tracing::info!(
            "Submissions: {} started, {} succeeded, {} failed, {} ignored",
            self.submissions_started.load(Ordering::Relaxed),
            self.submissions_succeeded.load(Ordering::Relaxed),
            self.submissions_failed.load(Ordering::Relaxed),
            self.submissions_ignored.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Total inference time: {:.2}s (avg: {:.2}ms per request)",
            self.total_inference_time_ms.load(Ordering::Relaxed) as f64 / 1000.0,
            self.avg_inference_time_ms()
        );
        tracing::info!(
            "Previews: {} created, {} released, {} live",
            self.previews_created.load(Ordering::Relaxed),
            self.previews_released.load(Ordering::Relaxed),
            self.live_previews()
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
