//! Errors - エラー型と分類
//!
//! - `StoreError`: ストア（外部）からのエラー
//! - `PoolError`: ワーカープール側のエラー（closed / panic / abort）
//! - `ProcessError`: 1 件分のタスク失敗（必ず ItemId を持つ）
//! - `RunError`: 1 回の run 全体の失敗

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ItemId;
use super::run::RunFailure;

/// Error reported by an [`ItemStore`](crate::ports::ItemStore) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("write rejected for {id}: {reason}")]
    Rejected { id: ItemId, reason: String },

    #[error("{0}")]
    Other(String),
}

/// Error reported through a [`TaskHandle`](crate::app::TaskHandle).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("worker pool is shut down")]
    Closed,

    #[error("task panicked: {0}")]
    Panicked(String),

    #[error("task was aborted by pool shutdown")]
    Aborted,
}

/// Operational classification of a task failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Interrupted,
    Store,
    Pool,
}

/// Failure of the task that processed one item.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessError {
    #[error("processing of {id} was interrupted")]
    Interrupted { id: ItemId },

    #[error("store failure while processing {id}: {source}")]
    Store {
        id: ItemId,
        #[source]
        source: StoreError,
    },

    #[error("worker pool failure while processing {id}: {source}")]
    Pool {
        id: ItemId,
        #[source]
        source: PoolError,
    },
}

impl ProcessError {
    pub fn item_id(&self) -> ItemId {
        match self {
            ProcessError::Interrupted { id }
            | ProcessError::Store { id, .. }
            | ProcessError::Pool { id, .. } => *id,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ProcessError::Interrupted { .. } => ErrorKind::Interrupted,
            ProcessError::Store { .. } => ErrorKind::Store,
            ProcessError::Pool { .. } => ErrorKind::Pool,
        }
    }
}

/// Failure of a whole run, as seen by the caller of `process_all()`.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("could not snapshot item ids: {0}")]
    Snapshot(#[source] StoreError),

    /// At least one task failed. Never returned for skipped (missing) items.
    #[error(transparent)]
    TasksFailed(Box<RunFailure>),

    #[error("run was aborted before all tasks finished")]
    Aborted,

    #[error("gave up waiting for the run after {0:?}")]
    TimedOut(Duration),

    #[error("run result was already taken from this handle")]
    AlreadyResolved,
}

impl RunError {
    /// Per-task failures of the run; empty for run-level errors.
    pub fn failures(&self) -> &[ProcessError] {
        match self {
            RunError::TasksFailed(failure) => failure.failures(),
            _ => &[],
        }
    }
}
