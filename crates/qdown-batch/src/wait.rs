//! Completion barrier for submitted jobs.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Inner {
    pending: AtomicUsize,
    notify: Notify,
}

/// Counts outstanding jobs and lets one task wait until all have finished.
///
/// Each job holds a [`WaitGuard`] obtained from [`WaitGroup::add`]; the job
/// counts as finished when its guard is dropped, whether it succeeded,
/// failed or unwound.
#[derive(Debug, Clone, Default)]
pub struct WaitGroup {
    inner: Arc<Inner>,
}

/// Marks one outstanding job. Dropping it signals completion.
#[derive(Debug)]
#[must_use = "the job is considered finished as soon as the guard is dropped"]
pub struct WaitGuard {
    inner: Arc<Inner>,
}

impl WaitGroup {
    /// Creates an empty wait group.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one outstanding job.
    pub fn add(&self) -> WaitGuard {
        self.inner.pending.fetch_add(1, Ordering::AcqRel);
        WaitGuard {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Returns the number of jobs that have not finished yet.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner.pending.load(Ordering::Acquire)
    }

    /// Waits until every registered job has finished.
    pub async fn wait(&self) {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            // Register before checking so a release in between is not missed.
            notified.as_mut().enable();
            if self.pending() == 0 {
                return;
            }
            notified.await;
        }
    }
}

impl Drop for WaitGuard {
    fn drop(&mut self) {
        if self.inner.pending.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.inner.notify.notify_waiters();
        }
    }
}
