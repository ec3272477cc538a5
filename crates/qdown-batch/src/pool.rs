//! Fixed-size worker pool draining a bounded job queue.

use futures::FutureExt;
use futures::future::BoxFuture;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{Instrument, debug, error};

/// Smallest accepted worker count.
pub const MIN_THREADS: usize = 1;

/// Largest accepted worker count.
pub const MAX_THREADS: usize = 100;

/// A queued unit of work.
type Job = BoxFuture<'static, ()>;

/// Errors raised by the worker pool.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// Requested worker count is outside `MIN_THREADS..=MAX_THREADS`.
    #[error("Thread count {0} is outside the allowed range {MIN_THREADS}..={MAX_THREADS}")]
    InvalidThreadCount(usize),

    /// The pool has been shut down and accepts no more jobs.
    #[error("Worker pool is closed")]
    Closed,
}

/// A fixed set of long-lived workers sharing one bounded FIFO queue.
///
/// The queue holds at most `size` pending jobs; [`WorkerPool::submit`]
/// suspends the caller while it is full. Every worker runs one job at a time,
/// so at most `size` jobs execute concurrently. The pool is meant to be built
/// once and reused across batch runs; its size never changes.
pub struct WorkerPool {
    sender: async_channel::Sender<Job>,
    workers: JoinSet<()>,
    size: usize,
}

impl WorkerPool {
    /// Spawns a pool of `size` workers on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidThreadCount`] if `size` is outside
    /// `MIN_THREADS..=MAX_THREADS`.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    pub fn new(size: usize) -> Result<Self, PoolError> {
        if !(MIN_THREADS..=MAX_THREADS).contains(&size) {
            return Err(PoolError::InvalidThreadCount(size));
        }

        let (sender, receiver) = async_channel::bounded::<Job>(size);
        let mut workers = JoinSet::new();
        for i in 0..size {
            let worker = run_worker(receiver.clone())
                .instrument(tracing::debug_span!("download-worker", worker = i));
            workers.spawn(worker);
        }
        debug!(workers = size, "worker pool started");

        Ok(Self {
            sender,
            workers,
            size,
        })
    }

    /// Clamps a requested worker count into `MIN_THREADS..=MAX_THREADS`.
    #[must_use]
    pub fn clamp_size(requested: usize) -> usize {
        requested.clamp(MIN_THREADS, MAX_THREADS)
    }

    /// Returns the number of workers.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Returns the number of jobs waiting in the queue.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.sender.len()
    }

    /// Enqueues a job, waiting while the queue is full.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Closed`] if the pool has been shut down.
    pub async fn submit<F>(&self, job: F) -> Result<(), PoolError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.sender
            .send(Box::pin(job))
            .await
            .map_err(|_| PoolError::Closed)
    }

    /// Closes the queue, lets workers finish what is queued, and joins them.
    pub async fn shutdown(mut self) {
        self.sender.close();
        while let Some(joined) = self.workers.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "worker task ended abnormally");
            }
        }
        debug!(workers = self.size, "worker pool stopped");
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("size", &self.size)
            .field("queued", &self.queued())
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}

async fn run_worker(receiver: async_channel::Receiver<Job>) {
    while let Ok(job) = receiver.recv().await {
        if AssertUnwindSafe(job).catch_unwind().await.is_err() {
            error!("download job panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[test]
    fn test_clamp_size() {
        assert_eq!(WorkerPool::clamp_size(0), 1);
        assert_eq!(WorkerPool::clamp_size(5), 5);
        assert_eq!(WorkerPool::clamp_size(1000), 100);
    }

    #[tokio::test]
    async fn test_rejects_out_of_range() {
        assert_eq!(
            WorkerPool::new(0).unwrap_err(),
            PoolError::InvalidThreadCount(0)
        );
        assert_eq!(
            WorkerPool::new(101).unwrap_err(),
            PoolError::InvalidThreadCount(101)
        );
        assert_eq!(WorkerPool::new(100).unwrap().size(), 100);
    }

    #[tokio::test]
    async fn test_runs_all_jobs() {
        let pool = WorkerPool::new(4).unwrap();
        let done = Arc::new(AtomicUsize::new(0));
        for _ in 0..50 {
            let done = Arc::clone(&done);
            pool.submit(async move {
                done.fetch_add(1, Ordering::SeqCst);
            })
            .await
            .unwrap();
        }
        pool.shutdown().await;
        assert_eq!(done.load(Ordering::SeqCst), 50);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_bounded_by_size() {
        for size in [1, 3, 8] {
            let pool = WorkerPool::new(size).unwrap();
            let active = Arc::new(AtomicUsize::new(0));
            let peak = Arc::new(AtomicUsize::new(0));

            for _ in 0..(size * 4) {
                let active = Arc::clone(&active);
                let peak = Arc::clone(&peak);
                pool.submit(async move {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                })
                .await
                .unwrap();
            }
            pool.shutdown().await;

            let peak = peak.load(Ordering::SeqCst);
            assert!((1..=size).contains(&peak), "peak {peak} for size {size}");
        }
    }

    #[tokio::test]
    async fn test_submit_blocks_when_queue_full() {
        let pool = WorkerPool::new(1).unwrap();
        let (release_tx, release_rx) = oneshot::channel::<()>();
        let (started_tx, started_rx) = oneshot::channel::<()>();

        // Occupies the only worker until released.
        pool.submit(async move {
            let _ = started_tx.send(());
            let _ = release_rx.await;
        })
        .await
        .unwrap();
        started_rx.await.unwrap();

        // Fills the queue (capacity 1).
        pool.submit(async {}).await.unwrap();
        assert_eq!(pool.queued(), 1);

        let blocked = tokio::time::timeout(Duration::from_millis(50), pool.submit(async {})).await;
        assert!(blocked.is_err(), "submit should wait while the queue is full");

        release_tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(1), pool.submit(async {}))
            .await
            .unwrap()
            .unwrap();
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_panicking_job_keeps_worker_alive() {
        let pool = WorkerPool::new(1).unwrap();
        pool.submit(async { panic!("boom") }).await.unwrap();

        let (tx, rx) = oneshot::channel();
        pool.submit(async move {
            let _ = tx.send(42);
        })
        .await
        .unwrap();
        assert_eq!(rx.await.unwrap(), 42);
        pool.shutdown().await;
    }
}
