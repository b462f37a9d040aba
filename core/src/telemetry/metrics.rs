use std::sync::Mutex;

/// Health of the most recent exchange with the feed, shown as a status pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedStatus {
    #[default]
    Unknown,
    Ok,
    Error,
}

/// Counts of poll cycles by outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CycleCounts {
    pub completed: usize,
    pub failed: usize,
    pub skipped: usize,
}

pub struct CycleMetrics {
    inner: Mutex<Metrics>,
}

#[derive(Default)]
struct Metrics {
    counts: CycleCounts,
    status: FeedStatus,
}

impl CycleMetrics {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Metrics::default()),
        }
    }

    pub fn record_completed(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.counts.completed += 1;
        }
    }

    pub fn record_failed(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.counts.failed += 1;
            metrics.status = FeedStatus::Error;
        }
    }

    pub fn record_skipped(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.counts.skipped += 1;
        }
    }

    /// A fetch succeeded (`true`) or failed (`false`) without ending the cycle.
    pub fn record_exchange(&self, ok: bool) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.status = if ok { FeedStatus::Ok } else { FeedStatus::Error };
        }
    }

    pub fn status(&self) -> FeedStatus {
        self.inner
            .lock()
            .map(|metrics| metrics.status)
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> CycleCounts {
        self.inner
            .lock()
            .map(|metrics| metrics.counts)
            .unwrap_or_default()
    }
}

impl Default for CycleMetrics {
    fn default() -> Self {
        Self::new()
    }
}
