//! BatchCoordinator - 全件処理の run を組み立てる
//!
//! # フロー
//! 1. `ItemStore::list_all_ids()` で id をスナップショット（run 開始時の 1 回だけ）
//! 2. id ごとに 1 タスクを WorkerPool に submit
//! 3. `join_all` で全タスクの終端を待つ（barrier）
//! 4. barrier の後で 1 回だけ集計（`domain::aggregate`）
//! 5. 結果は `RunHandle` 経由で 1 回だけ受け取れる
//!
//! 各タスクは自分の outcome を handle 経由で返すだけで、共有リストには書かない。

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info, info_span, warn};

use super::item_task::process_item;
use super::pool::WorkerPool;
use crate::domain::{
    ItemId, ProcessError, RunError, RunId, RunResult, TaskOutcome, TaskState, aggregate,
};
use crate::observability::RunCounts;
use crate::ports::ItemStore;

/// Orchestrates processing runs over every stored item.
///
/// Runs share the coordinator's pool; each run builds its result from
/// scratch.
pub struct BatchCoordinator {
    store: Arc<dyn ItemStore>,
    pool: Arc<WorkerPool>,
    task_delay: Duration,
    last_run: AtomicU64,
}

impl BatchCoordinator {
    pub fn new(store: Arc<dyn ItemStore>, pool: Arc<WorkerPool>, task_delay: Duration) -> Self {
        Self {
            store,
            pool,
            task_delay,
            last_run: AtomicU64::new(0),
        }
    }

    pub fn pool(&self) -> &Arc<WorkerPool> {
        &self.pool
    }

    /// Start a run and return immediately.
    ///
    /// The run proceeds in the background whether or not the handle is
    /// awaited. Must be called inside a tokio runtime.
    pub fn process_all(&self) -> RunHandle {
        let run_id = RunId::new(self.last_run.fetch_add(1, Ordering::Relaxed) + 1);
        let run = run_once(
            run_id,
            Arc::clone(&self.store),
            Arc::clone(&self.pool),
            self.task_delay,
        )
        .instrument(info_span!("run", %run_id));

        RunHandle {
            run_id,
            join: Some(tokio::spawn(run)),
        }
    }
}

impl std::fmt::Debug for BatchCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchCoordinator")
            .field("pool", &self.pool)
            .field("task_delay", &self.task_delay)
            .field("last_run", &self.last_run.load(Ordering::Relaxed))
            .finish()
    }
}

async fn run_once(
    run_id: RunId,
    store: Arc<dyn ItemStore>,
    pool: Arc<WorkerPool>,
    task_delay: Duration,
) -> Result<RunResult, RunError> {
    let started_at = Utc::now();
    let ids = store.list_all_ids().await.map_err(|e| {
        warn!(error = %e, "could not snapshot item ids");
        RunError::Snapshot(e)
    })?;
    info!(items = ids.len(), workers = pool.size(), "run started");

    let cancel = pool.cancellation();
    let dispatched: Vec<_> = ids
        .into_iter()
        .map(|id| {
            let task = process_item(Arc::clone(&store), id, task_delay, cancel.clone());
            let submitted = pool.submit(task);
            debug!(item_id = %id, state = ?TaskState::Dispatched, "task dispatched");
            (id, submitted)
        })
        .collect();

    // barrier: nothing below runs until every task is terminal
    let outcomes: Vec<TaskOutcome> = join_all(dispatched.into_iter().map(
        |(id, submitted)| async move {
            match submitted {
                Ok(handle) => handle
                    .await
                    .unwrap_or_else(|source| pool_failure(id, source)),
                Err(source) => pool_failure(id, source),
            }
        },
    ))
    .await;

    let counts = RunCounts::from_outcomes(&outcomes);
    match aggregate(run_id, started_at, outcomes) {
        Ok(result) => {
            info!(
                processed = counts.processed,
                skipped = counts.skipped,
                "run finished"
            );
            Ok(result)
        }
        Err(failure) => {
            warn!(
                processed = counts.processed,
                skipped = counts.skipped,
                failed = counts.failed,
                "run finished with failures"
            );
            Err(RunError::TasksFailed(Box::new(failure)))
        }
    }
}

fn pool_failure(id: ItemId, source: crate::domain::PoolError) -> TaskOutcome {
    warn!(item_id = %id, error = %source, "task did not complete");
    TaskOutcome::Failed(ProcessError::Pool { id, source })
}

/// Deferred result of one run.
///
/// Resolves once, after every task of the run is terminal. Awaiting a
/// handle that already produced its result yields
/// `RunError::AlreadyResolved`. Dropping it does not stop the run.
#[derive(Debug)]
pub struct RunHandle {
    run_id: RunId,
    join: Option<JoinHandle<Result<RunResult, RunError>>>,
}

impl RunHandle {
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn is_finished(&self) -> bool {
        self.join.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Wait at most `timeout`. On `RunError::TimedOut` the run keeps going
    /// and the handle can be awaited again.
    pub async fn wait_timeout(&mut self, timeout: Duration) -> Result<RunResult, RunError> {
        match tokio::time::timeout(timeout, &mut *self).await {
            Ok(result) => result,
            Err(_) => Err(RunError::TimedOut(timeout)),
        }
    }
}

impl Future for RunHandle {
    type Output = Result<RunResult, RunError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let Some(join) = self.join.as_mut() else {
            return Poll::Ready(Err(RunError::AlreadyResolved));
        };
        let joined = ready!(Pin::new(join).poll(cx));
        self.join = None;
        Poll::Ready(joined.unwrap_or_else(|e| {
            warn!(run_id = %self.run_id, error = %e, "run task did not complete");
            Err(RunError::Aborted)
        }))
    }
}
