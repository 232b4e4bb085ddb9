//! ItemTask - 1 件分の処理（fetch → PROCESSED → persist）
//!
//! 失敗は panic や print で済ませず、必ず `TaskOutcome::Failed` として返す。

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::pool::CancellationSignal;
use crate::domain::{ItemId, ProcessError, TaskOutcome, TaskState};
use crate::ports::ItemStore;

/// Process one item and report its terminal outcome.
///
/// - missing item: `Skipped`
/// - cancellation raised before or during `delay`: `Failed(Interrupted)`
/// - `get` / `put` error: `Failed(Store)`
///
/// No lock is held across any await here; the store owns its own locking.
pub async fn process_item(
    store: Arc<dyn ItemStore>,
    id: ItemId,
    delay: Duration,
    mut cancel: CancellationSignal,
) -> TaskOutcome {
    debug!(item_id = %id, state = ?TaskState::Running, "processing item");

    if cancel.is_cancelled() {
        return interrupted(id);
    }
    if !delay.is_zero() {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return interrupted(id),
            _ = tokio::time::sleep(delay) => {}
        }
    }

    let mut item = match store.get(id).await {
        Ok(Some(item)) => item,
        Ok(None) => {
            debug!(item_id = %id, state = ?TaskState::Skipped, "item not found, skipping");
            return TaskOutcome::Skipped(id);
        }
        Err(source) => return store_failure(id, source),
    };

    item.mark_processed();

    match store.put(item).await {
        Ok(stored) => {
            debug!(item_id = %id, state = ?TaskState::Succeeded, "item processed");
            TaskOutcome::Processed(stored)
        }
        Err(source) => store_failure(id, source),
    }
}

fn interrupted(id: ItemId) -> TaskOutcome {
    warn!(item_id = %id, state = ?TaskState::Failed, "item processing interrupted");
    TaskOutcome::Failed(ProcessError::Interrupted { id })
}

fn store_failure(id: ItemId, source: crate::domain::StoreError) -> TaskOutcome {
    warn!(item_id = %id, state = ?TaskState::Failed, error = %source, "store failure");
    TaskOutcome::Failed(ProcessError::Store { id, source })
}
