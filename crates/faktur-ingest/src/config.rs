//! Ingestion worker configuration.

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

/// Default number of attachments processed concurrently.
pub const DEFAULT_MAX_CONCURRENT_JOBS: usize = 4;

/// Default bound on concurrent OCR engine calls.
pub const DEFAULT_MAX_CONCURRENT_OCR: usize = 2;

/// Default capacity of the inbound work queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Configuration for the ingestion pipeline and worker pool.
///
/// The queue capacity bounds outstanding work: when the queue is full,
/// submission waits instead of buffering attachments without limit. The
/// OCR bound is separate from the job bound and sized to the engine's
/// concurrency limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct IngestConfig {
    /// Maximum attachments processed concurrently.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "ingest-max-concurrent-jobs",
            env = "INGEST_MAX_CONCURRENT_JOBS",
            default_value = "4"
        )
    )]
    pub max_concurrent_jobs: usize,

    /// Maximum concurrent OCR engine calls, sized to the engine's limits.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "ingest-max-concurrent-ocr",
            env = "INGEST_MAX_CONCURRENT_OCR",
            default_value = "2"
        )
    )]
    pub max_concurrent_ocr: usize,

    /// Capacity of the inbound work queue (backpressure bound).
    #[cfg_attr(
        feature = "config",
        arg(
            long = "ingest-queue-capacity",
            env = "INGEST_QUEUE_CAPACITY",
            default_value = "64"
        )
    )]
    pub queue_capacity: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: DEFAULT_MAX_CONCURRENT_JOBS,
            max_concurrent_ocr: DEFAULT_MAX_CONCURRENT_OCR,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl IngestConfig {
    /// Sets the concurrent job bound.
    pub fn with_max_concurrent_jobs(mut self, jobs: usize) -> Self {
        self.max_concurrent_jobs = jobs.max(1);
        self
    }

    /// Sets the concurrent OCR bound.
    pub fn with_max_concurrent_ocr(mut self, calls: usize) -> Self {
        self.max_concurrent_ocr = calls.max(1);
        self
    }

    /// Sets the queue capacity.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = IngestConfig::default();
        assert_eq!(config.max_concurrent_jobs, DEFAULT_MAX_CONCURRENT_JOBS);
        assert_eq!(config.max_concurrent_ocr, DEFAULT_MAX_CONCURRENT_OCR);
        assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
    }

    #[test]
    fn test_bounds_never_zero() {
        let config = IngestConfig::default()
            .with_max_concurrent_jobs(0)
            .with_max_concurrent_ocr(0)
            .with_queue_capacity(0);
        assert_eq!(config.max_concurrent_jobs, 1);
        assert_eq!(config.max_concurrent_ocr, 1);
        assert_eq!(config.queue_capacity, 1);
    }
}
