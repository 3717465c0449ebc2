use tracing::{info, warn};

/// Periodic progress logging for loops over many events, so a long
/// rate-limited import stays observable without one log line per item.
pub struct ProgressTracker {
    total: usize,
    written: usize,
    skipped: usize,
    failed: usize,
    start_time: std::time::Instant,
    progress_interval: usize,
    last_progress_log: usize,
}

impl ProgressTracker {
    /// `progress_interval` is how many items pass between progress lines.
    pub fn new(total: usize, progress_interval: usize) -> Self {
        Self {
            total,
            written: 0,
            skipped: 0,
            failed: 0,
            start_time: std::time::Instant::now(),
            progress_interval: progress_interval.max(1),
            last_progress_log: 0,
        }
    }

    pub fn record_written(&mut self) {
        self.written += 1;
    }

    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    pub fn record_failed(&mut self) {
        self.failed += 1;
    }

    /// Call after each item with the 1-based index of the item just
    /// processed.
    pub fn log_progress(&mut self, current: usize) {
        if current - self.last_progress_log >= self.progress_interval || current == self.total {
            let elapsed = self.start_time.elapsed().as_secs_f64();
            // Sub-second bursts are noise; the summary covers them.
            if elapsed < 0.5 && current < self.total {
                return;
            }
            info!(
                "Progress: {}/{} | Written: {} | Skipped: {} | Failed: {}",
                current, self.total, self.written, self.skipped, self.failed
            );
            self.last_progress_log = current;
        }
    }

    pub fn log_summary(&self, operation_name: &str) {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if self.failed > 0 {
            warn!(
                "{} completed: {} total in {:.1}s | Written: {} | Skipped: {} | Failed: {}",
                operation_name, self.total, elapsed, self.written, self.skipped, self.failed
            );
        } else {
            info!(
                "{} completed: {} total in {:.1}s | Written: {} | Skipped: {}",
                operation_name, self.total, elapsed, self.written, self.skipped
            );
        }
    }
}
