use std::sync::Mutex;

use serde::Serialize;

/// Observation counters of a stacker's most recent pass.
pub struct StackMetrics {
    inner: Mutex<MetricsSnapshot>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub processed: usize,
    pub skipped_no_overlap: usize,
    pub skipped_partial_overlap: usize,
}

impl MetricsSnapshot {
    pub fn skipped(&self) -> usize {
        self.skipped_no_overlap + self.skipped_partial_overlap
    }
}

impl StackMetrics {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    pub fn reset(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            *metrics = MetricsSnapshot::default();
        }
    }

    pub fn record_processed(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.processed += 1;
        }
    }

    pub fn record_no_overlap(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.skipped_no_overlap += 1;
        }
    }

    pub fn record_partial_overlap(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.skipped_partial_overlap += 1;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        if let Ok(metrics) = self.inner.lock() {
            *metrics
        } else {
            MetricsSnapshot::default()
        }
    }
}

impl Default for StackMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StackMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StackMetrics").field(&self.snapshot()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let metrics = StackMetrics::new();
        metrics.record_processed();
        metrics.record_processed();
        metrics.record_no_overlap();
        metrics.record_partial_overlap();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.processed, 2);
        assert_eq!(snapshot.skipped(), 2);
        assert_eq!(
            serde_json::to_value(snapshot).unwrap()["skipped_no_overlap"],
            1
        );

        metrics.reset();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }
}
