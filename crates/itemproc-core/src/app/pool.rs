//! WorkerPool - 固定サイズのワーカープール
//!
//! # フロー
//! 1. `new()` で `workers` 本のワーカータスクを起動（以後使い回す）
//! 2. `submit()` はジョブをキューに積んで即座に `TaskHandle` を返す
//! 3. ワーカーはキューからジョブを取り出して実行し、結果を oneshot で返す
//! 4. `shutdown()` で受付停止 → 猶予時間内は drain → 超えたら cancel + abort
//!
//! どのジョブも必ず 1 回だけ終端する（成功 / panic / abort）。

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, PoolConfig};
use crate::domain::PoolError;

/// After the grace period, cooperative jobs get this long to observe the
/// cancellation signal before being aborted.
const CANCEL_SETTLE: Duration = Duration::from_millis(100);

type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Deferred result of one submitted job.
///
/// Resolves exactly once: `Ok(value)`, `Err(PoolError::Panicked)` or
/// `Err(PoolError::Aborted)` when the pool was force-terminated first.
/// Dropping the handle does not cancel the job.
#[derive(Debug)]
pub struct TaskHandle<T> {
    rx: oneshot::Receiver<Result<T, PoolError>>,
}

impl<T> Future for TaskHandle<T> {
    type Output = Result<T, PoolError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|received| match received {
            Ok(result) => result,
            // job dropped without reporting: aborted (or never run)
            Err(_) => Err(PoolError::Aborted),
        })
    }
}

/// Raised when the pool forces termination. Jobs may race long waits
/// against it.
#[derive(Debug, Clone)]
pub struct CancellationSignal {
    rx: watch::Receiver<bool>,
}

impl CancellationSignal {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Completes once cancellation is raised (or the pool is gone).
    /// Stays raised afterwards.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}

/// What `shutdown()` ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReport {
    /// Every queued and in-flight job finished within the grace period.
    Drained,

    /// Grace period elapsed; `stragglers` workers were still busy.
    Forced { stragglers: usize },

    /// An earlier call already shut the pool down.
    AlreadyShutDown,
}

/// Fixed-size pool of reusable worker tasks.
///
/// Owned explicitly (usually behind an `Arc`) and shared by every run.
/// Must be created inside a tokio runtime.
pub struct WorkerPool {
    /// `None` once shutdown has begun.
    sender: Mutex<Option<mpsc::UnboundedSender<Job>>>,
    workers: Mutex<Option<JoinSet<()>>>,
    cancel_tx: watch::Sender<bool>,
    size: usize,
    grace: Duration,
}

impl WorkerPool {
    pub fn new(config: &PoolConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let (sender, receiver) = mpsc::unbounded_channel::<Job>();
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let queue = Arc::new(tokio::sync::Mutex::new(receiver));

        let mut workers = JoinSet::new();
        for worker_id in 0..config.workers {
            let queue = Arc::clone(&queue);
            let cancel_rx = cancel_rx.clone();
            workers.spawn(worker_loop(worker_id, queue, cancel_rx));
        }
        debug!(workers = config.workers, "worker pool started");

        Ok(Self {
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(Some(workers)),
            cancel_tx,
            size: config.workers,
            grace: config.shutdown_grace(),
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.sender).is_none()
    }

    pub fn cancellation(&self) -> CancellationSignal {
        CancellationSignal {
            rx: self.cancel_tx.subscribe(),
        }
    }

    /// Queue `fut` for execution. Never waits for a free worker.
    pub fn submit<F, T>(&self, fut: F) -> Result<TaskHandle<T>, PoolError>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: Job = Box::pin(async move {
            let result = AssertUnwindSafe(fut)
                .catch_unwind()
                .await
                .map_err(|payload| PoolError::Panicked(panic_message(payload.as_ref())));
            // the caller may have dropped its handle
            let _ = tx.send(result);
        });

        let sender = lock(&self.sender);
        let Some(sender) = sender.as_ref() else {
            return Err(PoolError::Closed);
        };
        sender.send(job).map_err(|_| PoolError::Closed)?;
        Ok(TaskHandle { rx })
    }

    /// Stop accepting work, drain for up to the grace period, then cancel
    /// and abort whatever is left.
    ///
    /// Only the first call does anything. Never fails.
    pub async fn shutdown(&self) -> ShutdownReport {
        // dropping the only sender lets workers exit once the queue is empty
        let Some(sender) = lock(&self.sender).take() else {
            return ShutdownReport::AlreadyShutDown;
        };
        drop(sender);

        let Some(mut workers) = lock(&self.workers).take() else {
            return ShutdownReport::AlreadyShutDown;
        };

        info!(
            workers = workers.len(),
            grace_ms = self.grace.as_millis() as u64,
            "shutting down worker pool"
        );

        let drained = tokio::time::timeout(self.grace, drain(&mut workers))
            .await
            .is_ok();
        if drained {
            info!("worker pool drained");
            return ShutdownReport::Drained;
        }

        let stragglers = workers.len();
        warn!(stragglers, "grace period elapsed, forcing worker pool shutdown");
        self.cancel_tx.send_replace(true);
        let _ = tokio::time::timeout(CANCEL_SETTLE, drain(&mut workers)).await;
        workers.shutdown().await;

        ShutdownReport::Forced { stragglers }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // remaining workers are aborted when their JoinSet drops
        self.cancel_tx.send_replace(true);
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("size", &self.size)
            .field("grace", &self.grace)
            .field("closed", &self.is_closed())
            .finish()
    }
}

async fn worker_loop(
    worker_id: usize,
    queue: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<Job>>>,
    mut cancel_rx: watch::Receiver<bool>,
) {
    loop {
        if *cancel_rx.borrow_and_update() {
            break;
        }

        // the queue lock is only held while waiting for the next job,
        // never while running one
        let job = tokio::select! {
            changed = cancel_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                continue;
            }
            job = async { queue.lock().await.recv().await } => job,
        };

        let Some(job) = job else {
            // sender dropped and queue empty
            break;
        };
        job.await;
    }
    debug!(worker_id, "worker stopped");
}

async fn drain(workers: &mut JoinSet<()>) {
    while workers.join_next().await.is_some() {}
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    fn pool(workers: usize, grace: Duration) -> WorkerPool {
        let config = PoolConfig::default()
            .with_workers(workers)
            .with_shutdown_grace(grace);
        WorkerPool::new(&config).unwrap()
    }

    #[tokio::test]
    async fn submit_returns_value_through_handle() {
        let pool = pool(2, Duration::from_secs(1));
        let handle = pool.submit(async { 40 + 2 }).unwrap();
        assert_eq!(handle.await, Ok(42));
        assert_eq!(pool.shutdown().await, ShutdownReport::Drained);
    }

    #[test]
    fn zero_workers_is_rejected() {
        let config = PoolConfig::default().with_workers(0);
        assert!(matches!(
            WorkerPool::new(&config),
            Err(ConfigError::ZeroWorkers)
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrency_is_bounded_by_pool_size() {
        let pool = pool(3, Duration::from_secs(5));
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..12)
            .map(|_| {
                let running = Arc::clone(&running);
                let peak = Arc::clone(&peak);
                pool.submit(async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                })
                .unwrap()
            })
            .collect();

        for h in futures::future::join_all(handles).await {
            h.unwrap();
        }
        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert!(peak.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn panic_is_reported_and_worker_survives() {
        let pool = pool(1, Duration::from_secs(1));
        let bad = pool.submit(async { panic!("boom") }).unwrap();
        let good = pool.submit(async { "still alive" }).unwrap();

        let err: Result<(), PoolError> = bad.await;
        assert_eq!(err, Err(PoolError::Panicked("boom".to_string())));
        assert_eq!(good.await, Ok("still alive"));
    }

    #[tokio::test]
    async fn submit_after_shutdown_is_rejected() {
        let pool = pool(1, Duration::from_secs(1));
        assert_eq!(pool.shutdown().await, ShutdownReport::Drained);
        assert!(pool.is_closed());
        assert_eq!(pool.submit(async {}).unwrap_err(), PoolError::Closed);
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let pool = pool(1, Duration::from_secs(1));
        assert_eq!(pool.shutdown().await, ShutdownReport::Drained);
        assert_eq!(pool.shutdown().await, ShutdownReport::AlreadyShutDown);
    }

    #[tokio::test]
    async fn shutdown_drains_queued_work_within_grace() {
        let pool = pool(1, Duration::from_secs(5));
        let handles: Vec<_> = (0..3)
            .map(|i| {
                pool.submit(async move {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    i
                })
                .unwrap()
            })
            .collect();

        assert_eq!(pool.shutdown().await, ShutdownReport::Drained);
        let values: Vec<_> = futures::future::join_all(handles)
            .await
            .into_iter()
            .map(Result::unwrap)
            .collect();
        assert_eq!(values, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn shutdown_forces_stragglers_after_grace() {
        let pool = pool(1, Duration::from_millis(50));
        let stuck = pool
            .submit(async { tokio::time::sleep(Duration::from_secs(60)).await })
            .unwrap();
        let queued = pool.submit(async { 1 }).unwrap();

        let start = Instant::now();
        let report = pool.shutdown().await;
        assert_eq!(report, ShutdownReport::Forced { stragglers: 1 });
        assert!(start.elapsed() < Duration::from_secs(5));

        assert_eq!(stuck.await, Err(PoolError::Aborted));
        assert_eq!(queued.await, Err(PoolError::Aborted));
    }

    #[tokio::test]
    async fn cooperative_job_sees_cancellation_on_forced_shutdown() {
        let pool = pool(1, Duration::from_millis(20));
        let mut signal = pool.cancellation();
        assert!(!signal.is_cancelled());

        let handle = pool
            .submit(async move {
                tokio::select! {
                    _ = signal.cancelled() => "interrupted",
                    _ = tokio::time::sleep(Duration::from_secs(60)) => "slept",
                }
            })
            .unwrap();

        let report = pool.shutdown().await;
        assert!(matches!(report, ShutdownReport::Forced { .. }));
        assert_eq!(handle.await, Ok("interrupted"));
        assert!(pool.cancellation().is_cancelled());
    }

    #[tokio::test]
    async fn dropping_pool_aborts_pending_jobs() {
        let pool = pool(1, Duration::from_secs(1));
        let handle = pool
            .submit(async { tokio::time::sleep(Duration::from_secs(60)).await })
            .unwrap();
        drop(pool);
        assert_eq!(handle.await, Err(PoolError::Aborted));
    }

    #[test]
    fn panic_message_handles_both_string_kinds() {
        let a: Box<dyn Any + Send> = Box::new("static");
        let b: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let c: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(a.as_ref()), "static");
        assert_eq!(panic_message(b.as_ref()), "owned");
        assert_eq!(panic_message(c.as_ref()), "non-string panic payload");
    }
}
