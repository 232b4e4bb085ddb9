//! Run model: aggregate of every task outcome of one `process_all()` call.
//!
//! `aggregate()` is the only place outcomes are merged. It runs once, on a
//! single task, after every outcome is terminal.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Item, ItemId, ProcessError, RunId, TaskOutcome};
use crate::observability::RunCounts;

/// Successful run: every dispatched task succeeded or was skipped.
///
/// Item order is unspecified.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunResult {
    pub run_id: RunId,
    pub items: Vec<Item>,
    pub skipped: Vec<ItemId>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunResult {
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn into_items(self) -> Vec<Item> {
        self.items
    }

    /// Number of processed items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn counts(&self) -> RunCounts {
        RunCounts {
            processed: self.items.len(),
            skipped: self.skipped.len(),
            failed: 0,
        }
    }
}

/// Failed run: one or more tasks failed.
///
/// Keeps what did succeed so the caller can inspect it, but it is never
/// handed out as a successful result.
#[derive(Debug, Clone, PartialEq)]
pub struct RunFailure {
    pub run_id: RunId,
    pub failures: Vec<ProcessError>,
    pub processed: Vec<Item>,
    pub skipped: Vec<ItemId>,
}

impl RunFailure {
    pub fn failures(&self) -> &[ProcessError] {
        &self.failures
    }

    pub fn failed_ids(&self) -> Vec<ItemId> {
        self.failures.iter().map(ProcessError::item_id).collect()
    }

    pub fn counts(&self) -> RunCounts {
        RunCounts {
            processed: self.processed.len(),
            skipped: self.skipped.len(),
            failed: self.failures.len(),
        }
    }
}

impl fmt::Display for RunFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.processed.len() + self.skipped.len() + self.failures.len();
        write!(
            f,
            "{}: {} of {} tasks failed",
            self.run_id,
            self.failures.len(),
            total
        )?;
        if let Some(first) = self.failures.first() {
            write!(f, " (first: {first})")?;
        }
        Ok(())
    }
}

impl std::error::Error for RunFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.failures
            .first()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Merge the outcomes of one run.
///
/// Any failure turns the whole run into `Err`; skips never do.
pub fn aggregate(
    run_id: RunId,
    started_at: DateTime<Utc>,
    outcomes: Vec<TaskOutcome>,
) -> Result<RunResult, RunFailure> {
    let mut items = Vec::with_capacity(outcomes.len());
    let mut skipped = Vec::new();
    let mut failures = Vec::new();

    for outcome in outcomes {
        match outcome {
            TaskOutcome::Processed(item) => items.push(item),
            TaskOutcome::Skipped(id) => skipped.push(id),
            TaskOutcome::Failed(err) => failures.push(err),
        }
    }

    if !failures.is_empty() {
        return Err(RunFailure {
            run_id,
            failures,
            processed: items,
            skipped,
        });
    }

    Ok(RunResult {
        run_id,
        items,
        skipped,
        started_at,
        finished_at: Utc::now(),
    })
}
