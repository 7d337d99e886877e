//! Bounded asynchronous propagation of cache and index writes.
//!
//! The repository treats the cache and the search index as best-effort
//! replicas: after the primary store commits, follow-up writes are handed to
//! a [`Propagator`] and the request returns without waiting for them. The
//! propagator bounds queue depth and concurrency, applies a per-task
//! deadline, and keeps failed tasks in a capped dead-letter buffer so
//! operators can see what diverged.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Notify, OwnedSemaphorePermit, Semaphore, mpsc};
use uuid::Uuid;

use storefront_core::Result;

type BoxFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;

struct Task {
    label: &'static str,
    future: BoxFuture,
}

/// Tuning knobs for the propagation pool.
#[derive(Debug, Clone)]
pub struct PropagatorConfig {
    /// Tasks waiting for a worker. Enqueues beyond this are dropped.
    pub queue_capacity: usize,
    /// Tasks running at once.
    pub max_concurrent: usize,
    /// Deadline for a single task.
    pub task_timeout: Duration,
    /// Failed tasks retained for inspection, oldest evicted first.
    pub dead_letter_capacity: usize,
}

impl Default for PropagatorConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
            max_concurrent: 8,
            task_timeout: Duration::from_secs(10),
            dead_letter_capacity: 128,
        }
    }
}

/// A propagation task that failed or timed out.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DeadLetter {
    pub task_id: Uuid,
    pub label: &'static str,
    pub error: String,
    pub failed_at: DateTime<Utc>,
}

/// Counters over the lifetime of the propagator.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct PropagatorStats {
    pub enqueued: u64,
    pub completed: u64,
    pub failed: u64,
    pub dropped: u64,
    pub pending: u64,
}

struct Inner {
    enqueued: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
    pending: AtomicU64,
    settled: Notify,
    dead_letters: Mutex<VecDeque<DeadLetter>>,
    dead_letter_capacity: usize,
    task_timeout: Duration,
}

impl Inner {
    fn record_failure(&self, label: &'static str, error: String) {
        tracing::error!(label, error = %error, "propagation task failed");
        self.failed.fetch_add(1, Ordering::SeqCst);

        if let Ok(mut letters) = self.dead_letters.lock() {
            if letters.len() >= self.dead_letter_capacity {
                letters.pop_front();
            }
            letters.push_back(DeadLetter {
                task_id: Uuid::now_v7(),
                label,
                error,
                failed_at: Utc::now(),
            });
        }
    }

    /// Marks one task settled and wakes quiescers when none remain.
    fn finish(&self) {
        if self.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.settled.notify_waiters();
        }
    }
}

/// Handle to the propagation pool. Cheap to clone.
#[derive(Clone)]
pub struct Propagator {
    tx: mpsc::Sender<Task>,
    inner: Arc<Inner>,
}

impl Propagator {
    /// Starts the dispatcher on the current runtime.
    pub fn spawn(config: PropagatorConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.queue_capacity);
        let inner = Arc::new(Inner {
            enqueued: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            pending: AtomicU64::new(0),
            settled: Notify::new(),
            dead_letters: Mutex::new(VecDeque::new()),
            dead_letter_capacity: config.dead_letter_capacity,
            task_timeout: config.task_timeout,
        });

        tokio::spawn(dispatch(inner.clone(), rx, config.max_concurrent));
        Self { tx, inner }
    }

    /// Submits a task. When the queue is full the task is counted as dropped
    /// and never runs; callers must not depend on its effects.
    pub fn enqueue<F>(&self, label: &'static str, future: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        self.inner.pending.fetch_add(1, Ordering::SeqCst);
        let task = Task {
            label,
            future: Box::pin(future),
        };

        match self.tx.try_send(task) {
            Ok(()) => {
                self.inner.enqueued.fetch_add(1, Ordering::SeqCst);
            }
            Err(TrySendError::Full(task) | TrySendError::Closed(task)) => {
                tracing::warn!(label = task.label, "propagation queue full, task dropped");
                self.inner.dropped.fetch_add(1, Ordering::SeqCst);
                self.inner.finish();
            }
        }
    }

    /// Waits until every accepted task has settled.
    pub async fn quiesce(&self) {
        loop {
            let settled = self.inner.settled.notified();
            if self.inner.pending.load(Ordering::SeqCst) == 0 {
                return;
            }
            settled.await;
        }
    }

    pub fn stats(&self) -> PropagatorStats {
        PropagatorStats {
            enqueued: self.inner.enqueued.load(Ordering::SeqCst),
            completed: self.inner.completed.load(Ordering::SeqCst),
            failed: self.inner.failed.load(Ordering::SeqCst),
            dropped: self.inner.dropped.load(Ordering::SeqCst),
            pending: self.inner.pending.load(Ordering::SeqCst),
        }
    }

    /// Snapshot of the dead-letter buffer, oldest first.
    pub fn dead_letters(&self) -> Vec<DeadLetter> {
        self.inner
            .dead_letters
            .lock()
            .map(|letters| letters.iter().cloned().collect())
            .unwrap_or_default()
    }
}

async fn dispatch(inner: Arc<Inner>, mut rx: mpsc::Receiver<Task>, max_concurrent: usize) {
    let semaphore = Arc::new(Semaphore::new(max_concurrent));
    while let Some(task) = rx.recv().await {
        let Ok(permit) = semaphore.clone().acquire_owned().await else {
            break;
        };
        tokio::spawn(run(inner.clone(), permit, task));
    }
}

async fn run(inner: Arc<Inner>, _permit: OwnedSemaphorePermit, task: Task) {
    match tokio::time::timeout(inner.task_timeout, task.future).await {
        Ok(Ok(())) => {
            inner.completed.fetch_add(1, Ordering::SeqCst);
        }
        Ok(Err(err)) => inner.record_failure(task.label, err.to_string()),
        Err(_) => inner.record_failure(
            task.label,
            format!("timed out after {:?}", inner.task_timeout),
        ),
    }
    inner.finish();
}
