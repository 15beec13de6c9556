//! Work queue and worker pool
//!
//! A shared FIFO of work items is drained by a fixed number of workers.
//! Each item is dequeued exactly once; finished records are appended to a
//! mutex-guarded collection. Failures are logged and dropped at this layer,
//! retries live entirely inside the fetch client.

use crate::config::PoolConfig;
use std::collections::VecDeque;
use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Thread-safe FIFO with an atomic dequeue
///
/// `pop` returns `None` once the queue is drained, which is the signal for a
/// worker to exit.
#[derive(Debug, Default)]
pub struct WorkQueue<T> {
    items: Mutex<VecDeque<T>>,
    dequeued: AtomicUsize,
}

impl<T> WorkQueue<T> {
    pub fn new(items: impl IntoIterator<Item = T>) -> Self {
        Self {
            items: Mutex::new(items.into_iter().collect()),
            dequeued: AtomicUsize::new(0),
        }
    }

    /// Removes and returns the front item, or `None` when empty
    pub fn pop(&self) -> Option<T> {
        let item = self
            .items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        if item.is_some() {
            self.dequeued.fetch_add(1, Ordering::SeqCst);
        }
        item
    }

    /// Number of items still waiting
    pub fn len(&self) -> usize {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of successful `pop` calls so far
    pub fn dequeued(&self) -> usize {
        self.dequeued.load(Ordering::SeqCst)
    }
}

/// Result of a pool run
#[derive(Debug)]
pub struct PoolReport<R> {
    /// Records in completion order
    pub records: Vec<R>,

    /// Items accepted into the queue (after the item cap)
    pub queued: usize,

    /// Items taken off the queue by a worker
    pub dequeued: usize,

    /// Items that produced a record
    pub succeeded: usize,

    /// Items that were dropped after a failure
    pub failed: usize,

    /// Whether the run stopped early because of cancellation or the deadline
    pub cancelled: bool,
}

/// Counters shared by the workers of one run
#[derive(Debug, Default)]
struct Progress {
    succeeded: AtomicUsize,
    failed: AtomicUsize,
    remaining: AtomicUsize,
}

impl Progress {
    /// Marks one item as finished and returns how many are left
    fn finish(&self, success: bool) -> usize {
        if success {
            self.succeeded.fetch_add(1, Ordering::SeqCst);
        } else {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
        self.remaining.fetch_sub(1, Ordering::SeqCst) - 1
    }
}

/// Fixed-size pool of crawl workers
///
/// # Example
///
/// ```no_run
/// use cinecrawl::crawler::WorkerPool;
///
/// # async fn example() {
/// let pool = WorkerPool::new(4, 250);
/// let urls = vec!["https://www.imdb.com/title/tt0111161/".to_string()];
/// let report = pool
///     .run(urls, |url| async move { Ok::<_, std::io::Error>(url.len()) })
///     .await;
/// println!("{} records", report.records.len());
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct WorkerPool {
    worker_count: usize,
    max_items: usize,
    deadline: Option<Duration>,
    cancel: CancellationToken,
}

impl WorkerPool {
    pub fn new(worker_count: usize, max_items: usize) -> Self {
        Self {
            worker_count: worker_count.max(1),
            max_items,
            deadline: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Creates a pool from the `[pool]` configuration section
    pub fn from_config(config: &PoolConfig) -> Self {
        let mut pool = Self::new(config.worker_count, config.max_items);
        pool.deadline = config.deadline_secs.map(Duration::from_secs);
        pool
    }

    /// Cancels the whole run after `deadline`
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Ties the pool to an external cancellation token (e.g. Ctrl-C)
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Drains `items` with the configured number of workers
    ///
    /// Only the first `max_items` items are queued. `process` is invoked
    /// once per dequeued item; an `Err` or a panic is logged and the item dropped.
    /// Blocks until every worker has exited; never fails.
    pub async fn run<T, R, E, F, Fut>(&self, items: Vec<T>, process: F) -> PoolReport<R>
    where
        T: Display + Send + Sync + 'static,
        R: Send + 'static,
        E: Display + Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
    {
        if items.len() > self.max_items {
            tracing::info!(
                "Worklist has {} items, keeping the first {}",
                items.len(),
                self.max_items
            );
        }

        let queue = Arc::new(WorkQueue::new(items.into_iter().take(self.max_items)));
        let queued = queue.len();
        let results: Arc<Mutex<Vec<R>>> = Arc::new(Mutex::new(Vec::with_capacity(queued)));
        let progress = Arc::new(Progress {
            remaining: AtomicUsize::new(queued),
            ..Progress::default()
        });
        let process = Arc::new(process);
        let cancel = self.cancel.child_token();
        let cancelled = Arc::new(AtomicBool::new(false));

        let deadline_guard = self.deadline.map(|deadline| {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(deadline).await;
                tracing::warn!("Pool deadline of {:?} reached, cancelling workers", deadline);
                cancel.cancel();
            })
        });

        let workers = self.worker_count.min(queued.max(1));
        tracing::info!("Starting {} workers for {} items", workers, queued);

        let mut set = JoinSet::new();
        for worker_id in 0..workers {
            let queue = Arc::clone(&queue);
            let results = Arc::clone(&results);
            let progress = Arc::clone(&progress);
            let process = Arc::clone(&process);
            let cancel = cancel.clone();
            let cancelled = Arc::clone(&cancelled);

            set.spawn(async move {
                loop {
                    if cancel.is_cancelled() {
                        cancelled.store(true, Ordering::SeqCst);
                        break;
                    }

                    let Some(item) = queue.pop() else {
                        break;
                    };
                    let label = item.to_string();

                    // Each item runs in its own task so a panic only costs that item
                    let mut task = tokio::spawn((*process)(item));
                    let joined = tokio::select! {
                        _ = cancel.cancelled() => {
                            task.abort();
                            tracing::warn!("Worker {} abandoned {} on cancellation", worker_id, label);
                            cancelled.store(true, Ordering::SeqCst);
                            progress.finish(false);
                            break;
                        }
                        joined = &mut task => joined,
                    };

                    let remaining = match joined {
                        Ok(Ok(record)) => {
                            results
                                .lock()
                                .unwrap_or_else(PoisonError::into_inner)
                                .push(record);
                            progress.finish(true)
                        }
                        Ok(Err(e)) => {
                            tracing::warn!("Dropping {}: {}", label, e);
                            progress.finish(false)
                        }
                        Err(e) => {
                            tracing::error!("Dropping {}: processing task failed: {}", label, e);
                            progress.finish(false)
                        }
                    };

                    tracing::debug!("Worker {} finished {}, {} remaining", worker_id, label, remaining);
                }
            });
        }

        while let Some(joined) = set.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Worker task failed: {}", e);
            }
        }

        if let Some(guard) = deadline_guard {
            guard.abort();
        }

        let records = std::mem::take(&mut *results.lock().unwrap_or_else(PoisonError::into_inner));
        let report = PoolReport {
            queued,
            dequeued: queue.dequeued(),
            succeeded: progress.succeeded.load(Ordering::SeqCst),
            failed: progress.failed.load(Ordering::SeqCst),
            cancelled: cancelled.load(Ordering::SeqCst),
            records,
        };

        tracing::info!(
            "Pool finished: {} succeeded, {} failed, {} never started",
            report.succeeded,
            report.failed,
            report.queued - report.dequeued
        );

        report
    }
}
