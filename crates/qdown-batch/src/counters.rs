//! Run accounting shared between the orchestrator and the workers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::info;

/// Counters updated concurrently during one batch run.
///
/// `listed`, `filtered`, `total` and `local` are written by the producer
/// only; `succeeded` and `failed` are written by workers. Read them through
/// [`RunCounters::snapshot`] once the run's wait group has released.
#[derive(Debug, Default)]
pub struct RunCounters {
    listed: AtomicU64,
    filtered: AtomicU64,
    total: AtomicU64,
    local: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
}

impl RunCounters {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts a well-formed listing line.
    pub fn record_listed(&self) {
        self.listed.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts an entry excluded by the suffix filter.
    pub fn record_filtered(&self) {
        self.filtered.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts an entry considered for download.
    pub fn record_considered(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts an entry skipped because a matching local copy exists.
    pub fn record_local(&self) {
        self.local.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts a successful download.
    pub fn record_success(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts a failed download.
    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of finished downloads so far.
    #[must_use]
    pub fn finished(&self) -> u64 {
        self.succeeded.load(Ordering::Relaxed) + self.failed.load(Ordering::Relaxed)
    }

    /// Reads all counters into a summary.
    #[must_use]
    pub fn snapshot(&self, elapsed: Duration) -> RunSummary {
        RunSummary {
            listed: self.listed.load(Ordering::Acquire),
            filtered: self.filtered.load(Ordering::Acquire),
            total: self.total.load(Ordering::Acquire),
            local: self.local.load(Ordering::Acquire),
            succeeded: self.succeeded.load(Ordering::Acquire),
            failed: self.failed.load(Ordering::Acquire),
            elapsed,
        }
    }
}

/// Final counts of a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Well-formed listing lines.
    pub listed: u64,
    /// Entries excluded by the suffix filter.
    pub filtered: u64,
    /// Entries considered for download (`listed - filtered`).
    pub total: u64,
    /// Entries already present locally with the right size.
    pub local: u64,
    /// Downloads that succeeded.
    pub succeeded: u64,
    /// Downloads that failed.
    pub failed: u64,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

impl RunSummary {
    /// Returns the number of downloads attempted.
    #[must_use]
    pub const fn attempted(&self) -> u64 {
        self.succeeded + self.failed
    }

    /// Returns true if every considered entry is accounted for.
    #[must_use]
    pub const fn is_balanced(&self) -> bool {
        self.total == self.local + self.succeeded + self.failed
            && self.listed == self.total + self.filtered
    }

    /// Returns true if no download failed.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Logs the result block.
    pub fn log(&self) {
        info!("-------Download Result-------");
        info!("Total:\t{}", self.total);
        info!("Local:\t{}", self.local);
        info!("Success:\t{}", self.succeeded);
        info!("Failure:\t{}", self.failed);
        if self.filtered > 0 {
            info!("Filtered:\t{}", self.filtered);
        }
        info!("Duration:\t{:?}", self.elapsed);
        info!("-----------------------------");
    }
}
